//! The process collaborator: how a single stage actually gets run.

use std::io::{self, Write};
use std::process::{Command, Output, Stdio};
use std::thread;

use crate::error::StageError;
use crate::parse::CommandSpec;

/// Runs one stage to completion.
///
/// `stdin` is `None` when the stage has nothing to read; implementations
/// should then give the process an empty input.
pub trait ProcessRunner: Send + Sync {
    /// Run an intermediate stage and return everything it wrote to stdout.
    ///
    /// An unsuccessful exit is an error.
    fn capture(&self, spec: &CommandSpec, stdin: Option<&[u8]>) -> Result<Vec<u8>, StageError>;

    /// Run the terminal stage, writing its stdout and stderr to the given sinks.
    ///
    /// Sinks receive whatever the process produced even when it then fails.
    fn run_attached(
        &self,
        spec: &CommandSpec,
        stdin: Option<&[u8]>,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> Result<(), StageError>;
}

/// Runs stages as real child processes via `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    /// Spawn the stage, feed its input, and wait for it to exit.
    fn execute(&self, spec: &CommandSpec, stdin: Option<&[u8]>) -> Result<Output, StageError> {
        if spec.is_empty() {
            return Err(StageError::EmptyProgram);
        }
        let io_err = |source: io::Error| StageError::Io {
            program: spec.program.clone(),
            source,
        };

        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| StageError::Spawn {
                program: spec.program.clone(),
                source,
            })?;
        log::trace!("spawned `{spec}` as pid {}", child.id());

        // Write input from another thread so a child that fills its stdout
        // pipe before draining stdin cannot deadlock us.
        let output = match (stdin, child.stdin.take()) {
            (Some(input), Some(mut pipe)) => thread::scope(|s| {
                let writer = s.spawn(move || match pipe.write_all(input) {
                    // The child may exit without reading all of its input.
                    Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                    other => other,
                });
                let output = child.wait_with_output();
                let written = writer
                    .join()
                    .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")));
                written.and(output)
            }),
            _ => child.wait_with_output(),
        }
        .map_err(io_err)?;

        Ok(output)
    }
}

fn exit_error(spec: &CommandSpec, output: &Output) -> StageError {
    StageError::Exit {
        program: spec.program.clone(),
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}

impl ProcessRunner for SystemRunner {
    fn capture(&self, spec: &CommandSpec, stdin: Option<&[u8]>) -> Result<Vec<u8>, StageError> {
        let output = self.execute(spec, stdin)?;
        if !output.status.success() {
            return Err(exit_error(spec, &output));
        }
        Ok(output.stdout)
    }

    fn run_attached(
        &self,
        spec: &CommandSpec,
        stdin: Option<&[u8]>,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> Result<(), StageError> {
        let output = self.execute(spec, stdin)?;
        let io_err = |source: io::Error| StageError::Io {
            program: spec.program.clone(),
            source,
        };
        stdout.write_all(&output.stdout).map_err(io_err)?;
        stderr.write_all(&output.stderr).map_err(io_err)?;
        if !output.status.success() {
            return Err(exit_error(spec, &output));
        }
        Ok(())
    }
}
