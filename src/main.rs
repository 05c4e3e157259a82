//! pipechain: run a shell-style pipeline expression without a shell.
//!
//! Parses `stage | stage | ...`, runs the stages in order with each one's
//! stdout fed to the next, and writes the last stage's output to stdout.

use std::io::{self, Write};
use std::process::ExitCode;

use pipechain::config::{Config, expand_path};
use pipechain::exec::Pipeline;
use pipechain::logging;
use pipechain::parse::ExpressionParser;

const USAGE: &str = "\
usage: pipechain [OPTIONS] <EXPRESSION>...

Run `cmd args | cmd args | ...` without a shell and print the last stage's stdout.
Multiple EXPRESSION arguments are joined with spaces.

options:
  --combined         print stdout followed by stderr
  --stdin            feed this process's stdin to the first stage
  --json             print a JSON report instead of raw output
  --parse            print the parsed stages as JSON and exit
  --config <PATH>    merge PATH over the defaults instead of the user config
  --dump-config      print the effective configuration and exit
  -v, --verbose      log each stage to stderr
  -h, --help         show this help";

#[derive(Debug, Default)]
struct Options {
    combined: bool,
    stdin: bool,
    json: bool,
    parse_only: bool,
    dump_config: bool,
    verbose: bool,
    help: bool,
    config: Option<String>,
    expression: Vec<String>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Options, String> {
    let mut opts = Options::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--combined" => opts.combined = true,
            "--stdin" => opts.stdin = true,
            "--json" => opts.json = true,
            "--parse" => opts.parse_only = true,
            "--dump-config" => opts.dump_config = true,
            "-v" | "--verbose" => opts.verbose = true,
            "-h" | "--help" => opts.help = true,
            "--config" => {
                let path = args.next().ok_or("--config needs a path")?;
                opts.config = Some(path);
            }
            "--" => {
                opts.expression.extend(args.by_ref());
            }
            flag if flag.starts_with('-') && opts.expression.is_empty() => {
                return Err(format!("unknown option: {flag}"));
            }
            _ => opts.expression.push(arg),
        }
    }
    Ok(opts)
}

fn run(opts: Options) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = match &opts.config {
        Some(path) => Config::load_from(&expand_path(path))?,
        None => Config::load(),
    };
    logging::init(&config.logging, opts.verbose);

    if opts.dump_config {
        print!("{}", config.to_toml()?);
        return Ok(ExitCode::SUCCESS);
    }

    let expression = opts.expression.join(" ");
    if expression.trim().is_empty() {
        eprintln!("{USAGE}");
        return Ok(ExitCode::from(2));
    }

    if opts.parse_only {
        let stages = ExpressionParser::from_config(&config).parse(&expression);
        println!("{}", serde_json::to_string_pretty(&stages)?);
        return Ok(ExitCode::SUCCESS);
    }

    let pipeline = Pipeline::from_config(&expression, &config);
    if opts.stdin {
        let mut sink = pipeline.provide_stdin()?;
        io::copy(&mut io::stdin().lock(), &mut sink)?;
    }

    let outcome = pipeline.run();
    logging::log_run(&expression, &outcome);

    if opts.json {
        let stdout = pipeline.output().unwrap_or_default();
        let stderr = pipeline.stderr().unwrap_or_default();
        let report = serde_json::json!({
            "stages": pipeline.stages(),
            "stdout": String::from_utf8_lossy(&stdout),
            "stderr": String::from_utf8_lossy(&stderr),
            "error": outcome.as_ref().err().map(ToString::to_string),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(if outcome.is_ok() { ExitCode::SUCCESS } else { ExitCode::FAILURE });
    }

    if let Err(e) = outcome {
        eprintln!("pipechain: {e}");
        return Ok(ExitCode::FAILURE);
    }
    let bytes = if opts.combined {
        pipeline.combined_output()?
    } else {
        pipeline.output()?
    };
    let mut out = io::stdout().lock();
    out.write_all(&bytes)?;
    out.flush()?;
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let opts = match parse_args(std::env::args().skip(1)) {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("pipechain: {e}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };
    if opts.help {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    match run(opts) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("pipechain: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn flags_and_expression() {
        let opts = parse_args(args(&["--json", "-v", "echo hi | cat"])).unwrap();
        assert!(opts.json);
        assert!(opts.verbose);
        assert_eq!(opts.expression, vec!["echo hi | cat"]);
    }

    #[test]
    fn expression_words_are_collected() {
        let opts = parse_args(args(&["echo", "hi", "|", "tr", "-d", "h"])).unwrap();
        assert_eq!(opts.expression.join(" "), "echo hi | tr -d h");
    }

    #[test]
    fn config_needs_value() {
        assert!(parse_args(args(&["--config"])).is_err());
        let opts = parse_args(args(&["--config", "~/p.toml", "ls"])).unwrap();
        assert_eq!(opts.config.as_deref(), Some("~/p.toml"));
    }

    #[test]
    fn unknown_flag_rejected() {
        assert!(parse_args(args(&["--frobnicate", "ls"])).is_err());
    }

    #[test]
    fn double_dash_ends_options() {
        let opts = parse_args(args(&["--", "--json"])).unwrap();
        assert!(!opts.json);
        assert_eq!(opts.expression, vec!["--json"]);
    }
}
