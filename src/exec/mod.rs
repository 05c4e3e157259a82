pub mod pipeline;
pub mod runner;

pub use pipeline::{Pipeline, StdinSink};
pub use runner::{ProcessRunner, SystemRunner};
