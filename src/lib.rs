//! pipechain: shell-style command pipelines without a shell.
//!
//! An expression such as `grep -n "fn main" src/main.rs | cut -d: -f1` is
//! split into stages, each stage is tokenized with double-quote awareness,
//! and the resulting commands are run one after another with each stage's
//! stdout fed to the next stage's stdin. No shell is involved: there is no
//! globbing, variable expansion, or redirection.
//!
//! # Architecture
//!
//! - **[`parse`]**: Tokenizer, quote stripping, and the expression parser.
//! - **[`exec`]**: The [`Pipeline`](exec::Pipeline) runtime and the process runner seam.
//! - **[`config`]**: Configuration loading: embedded defaults + user overlay merge.
//! - **[`logging`]**: Logger setup and per-run records.
//! - **[`error`]**: Error types.

/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Error types for stages, pipelines, and configuration.
pub mod error;
/// Pipeline runtime and process execution.
pub mod exec;
/// Logger initialization and run records.
pub mod logging;
/// Expression parsing: tokenizer, quote stripping, stage splitting.
pub mod parse;

pub use error::PipelineError;
pub use exec::Pipeline;
pub use parse::{CommandSpec, parse_command};

/// Build a pipeline from an expression with the default configuration and
/// return the last stage's stdout.
///
/// This is the main entry point for tests and simple usage.
/// For custom settings or a mock runner, build the [`Pipeline`] directly.
pub fn output(expression: &str) -> Result<Vec<u8>, PipelineError> {
    let config = config::Config::default_config();
    Pipeline::from_config(expression, &config).output()
}
