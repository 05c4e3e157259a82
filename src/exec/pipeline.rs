use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::{Config, TerminalFailure};
use crate::error::PipelineError;
use crate::exec::runner::{ProcessRunner, SystemRunner};
use crate::parse::{CommandSpec, ExpressionParser, parse_command};

/// Shared byte buffer behind a [`StdinSink`].
type SharedBuffer = Arc<Mutex<Vec<u8>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Writable handle for input that will be fed to the first stage.
///
/// Obtained from [`Pipeline::provide_stdin`]. Clones write to the same buffer.
#[derive(Debug, Clone, Default)]
pub struct StdinSink {
    buf: SharedBuffer,
}

impl StdinSink {
    /// Bytes written so far and not yet consumed by a run.
    pub fn buffered(&self) -> Vec<u8> {
        lock(&self.buf).clone()
    }
}

impl Write for StdinSink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        lock(&self.buf).extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Everything the guard protects.
#[derive(Debug, Default)]
struct State {
    stages: Vec<CommandSpec>,
    stdin: Option<SharedBuffer>,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    started: bool,
}

/// A chain of external commands, each reading the previous one's output.
///
/// Stages run one after another: each intermediate stage runs to completion
/// and its whole stdout is buffered before the next one starts. Only the
/// last stage's stdout and stderr are kept.
///
/// A pipeline executes at most once. Every method takes `&self`, so an
/// `Arc<Pipeline>` can be run from several threads; the first caller does
/// the work and the others return immediately.
pub struct Pipeline {
    runner: Arc<dyn ProcessRunner>,
    terminal_failure: TerminalFailure,
    state: Mutex<State>,
}

impl Pipeline {
    /// Create a pipeline from stages, run with [`SystemRunner`].
    pub fn new(stages: impl IntoIterator<Item = CommandSpec>) -> Self {
        Self {
            runner: Arc::new(SystemRunner),
            terminal_failure: TerminalFailure::default(),
            state: Mutex::new(State {
                stages: stages.into_iter().collect(),
                ..State::default()
            }),
        }
    }

    /// Parse `a | b | c` with the default parser and build a pipeline from it.
    pub fn from_expression(expression: &str) -> Self {
        Self::new(parse_command(expression))
    }

    /// Parse an expression and apply `[settings]` from the configuration.
    pub fn from_config(expression: &str, config: &Config) -> Self {
        Self::new(ExpressionParser::from_config(config).parse(expression))
            .with_terminal_failure(config.settings.terminal_failure)
    }

    /// Use a different process runner.
    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Choose what a failing last stage does to the run result.
    pub fn with_terminal_failure(mut self, policy: TerminalFailure) -> Self {
        self.terminal_failure = policy;
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        lock(&self.state)
    }

    /// Add stages to the end.
    pub fn append(&self, stages: impl IntoIterator<Item = CommandSpec>) -> Result<(), PipelineError> {
        let mut state = self.state();
        if state.started {
            return Err(PipelineError::AlreadyStarted);
        }
        state.stages.extend(stages);
        Ok(())
    }

    /// Add stages to the front, keeping their relative order.
    pub fn prepend(&self, stages: impl IntoIterator<Item = CommandSpec>) -> Result<(), PipelineError> {
        let mut state = self.state();
        if state.started {
            return Err(PipelineError::AlreadyStarted);
        }
        state.stages.splice(0..0, stages);
        Ok(())
    }

    /// Get a sink whose contents become the first stage's input.
    ///
    /// Calling this again replaces the previous buffer; only the sink from
    /// the last call is fed to the pipeline.
    pub fn provide_stdin(&self) -> Result<StdinSink, PipelineError> {
        let mut state = self.state();
        if state.started {
            return Err(PipelineError::AlreadyStarted);
        }
        let sink = StdinSink::default();
        state.stdin = Some(Arc::clone(&sink.buf));
        Ok(sink)
    }

    /// Run every stage, chaining stdout to the next stage's stdin.
    ///
    /// Returns `Ok(())` without doing anything when the pipeline is empty or
    /// has already run. The first failing intermediate stage aborts the run.
    /// A failing last stage is returned or ignored according to the
    /// [`TerminalFailure`] policy.
    pub fn run(&self) -> Result<(), PipelineError> {
        let mut guard = self.state();
        let state = &mut *guard;
        if state.started || state.stages.is_empty() {
            return Ok(());
        }
        state.started = true;

        // Drain the provided input so it is gone after the run, however it ends.
        let mut input = state.stdin.as_ref().map(|buf| std::mem::take(&mut *lock(buf)));

        let Some((last, rest)) = state.stages.split_last() else {
            return Ok(());
        };
        for (i, spec) in rest.iter().enumerate() {
            log::debug!("stage {i}: {spec}");
            let out = self
                .runner
                .capture(spec, input.as_deref())
                .map_err(|source| PipelineError::Execution { stage: i, source })?;
            input = Some(out);
        }

        let stage = rest.len();
        log::debug!("stage {stage}: {last}");
        let result = self
            .runner
            .run_attached(last, input.as_deref(), &mut state.stdout, &mut state.stderr);
        match (result, self.terminal_failure) {
            (Ok(()), _) => Ok(()),
            (Err(source), TerminalFailure::Propagate) => {
                Err(PipelineError::Execution { stage, source })
            }
            (Err(e), TerminalFailure::Ignore) => {
                log::warn!("ignoring failure of last stage `{last}`: {e}");
                Ok(())
            }
        }
    }

    /// Run (if not already run) and return the last stage's stdout.
    pub fn output(&self) -> Result<Vec<u8>, PipelineError> {
        self.run()?;
        Ok(self.state().stdout.clone())
    }

    /// Run (if not already run) and return the last stage's stderr.
    pub fn stderr(&self) -> Result<Vec<u8>, PipelineError> {
        self.run()?;
        Ok(self.state().stderr.clone())
    }

    /// Run (if not already run) and return stdout followed by stderr.
    pub fn combined_output(&self) -> Result<Vec<u8>, PipelineError> {
        self.run()?;
        let state = self.state();
        let mut combined = Vec::with_capacity(state.stdout.len() + state.stderr.len());
        combined.write_all(&state.stdout).map_err(PipelineError::StreamAssembly)?;
        combined.write_all(&state.stderr).map_err(PipelineError::StreamAssembly)?;
        Ok(combined)
    }

    /// Whether the pipeline has executed (or is executing).
    pub fn is_started(&self) -> bool {
        self.state().started
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.state().stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().stages.is_empty()
    }

    /// A copy of the current stage list.
    pub fn stages(&self) -> Vec<CommandSpec> {
        self.state().stages.clone()
    }

    /// Render the stages as a shell-style `a | b | c` line.
    pub fn describe(&self) -> String {
        self.state()
            .stages
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("Pipeline")
            .field("stages", &state.stages)
            .field("started", &state.started)
            .field("terminal_failure", &self.terminal_failure)
            .finish_non_exhaustive()
    }
}
