//! Error types for stage execution, pipeline runs, and configuration loading.

use std::io;
use std::path::PathBuf;

/// Failure of a single stage, as reported by a [`ProcessRunner`](crate::exec::ProcessRunner).
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// The stage tokenized to nothing, so there is no executable to start.
    #[error("stage has no executable")]
    EmptyProgram,

    /// The executable could not be started (not found, not executable, ...).
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Feeding input to the process or collecting its output failed.
    #[error("i/o error while running `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The process ran but exited unsuccessfully.
    ///
    /// `code` is `None` when the process was terminated by a signal.
    #[error("`{program}` exited with {}{}", exit_label(.code), stderr_suffix(.stderr))]
    Exit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match *code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// Errors returned by [`Pipeline`](crate::exec::Pipeline) operations.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The pipeline has already executed; it can no longer be modified or fed input.
    #[error("pipeline has already been executed")]
    AlreadyStarted,

    /// A stage failed; later stages were not run.
    #[error("stage {stage} failed: {source}")]
    Execution {
        /// Zero-based index of the failing stage.
        stage: usize,
        #[source]
        source: StageError,
    },

    /// Appending stderr after stdout for combined output failed.
    #[error("failed to assemble combined output: {0}")]
    StreamAssembly(#[source] io::Error),
}

impl PipelineError {
    /// The failing stage, if this is an execution failure.
    pub fn stage(&self) -> Option<usize> {
        match self {
            PipelineError::Execution { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Errors loading an explicitly requested configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
