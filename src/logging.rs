use std::fs::OpenOptions;

use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, ConfigBuilder, SharedLogger, TermLogger, TerminalMode, WriteLogger};

use crate::config::{LoggingConfig, expand_path};
use crate::error::PipelineError;

/// Install the process-wide logger: stderr, plus a log file when configured.
///
/// `verbose` raises the level to at least debug. Best-effort: an unopenable
/// log file is reported on stderr and skipped, and a second call is a no-op.
pub fn init(config: &LoggingConfig, verbose: bool) {
    let mut level = config.level.to_filter();
    if verbose && level < LevelFilter::Debug {
        level = LevelFilter::Debug;
    }
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        log_config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    if !config.file.is_empty() {
        let path = expand_path(&config.file);
        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => loggers.push(WriteLogger::new(level, log_config, file)),
            Err(e) => eprintln!("pipechain: cannot open log file {}: {e}", path.display()),
        }
    }

    let _ = CombinedLogger::init(loggers);
}

/// Log one line describing a finished run.
pub fn log_run(expression: &str, outcome: &Result<(), PipelineError>) {
    // Compact single-line form (newlines replaced by "; ")
    let cmd: String = expression.chars().take(200).collect::<String>().replace('\n', "; ");
    match outcome {
        Ok(()) => log::info!("ok\t{cmd}"),
        Err(e) => log::warn!("failed\t{cmd}\t{}", e.to_string().replace('\n', "; ")),
    }
}
