use pipechain::config::{Config, TerminalFailure};
use pipechain::error::{PipelineError, StageError};
use pipechain::{CommandSpec, Pipeline, parse_command};

fn stages_for(expression: &str) -> Vec<(String, Vec<String>)> {
    parse_command(expression)
        .into_iter()
        .map(|s| (s.program, s.args))
        .collect()
}

macro_rules! parse_test {
    ($name:ident, $expr:expr, [$(($prog:expr, [$($arg:expr),*])),* $(,)?]) => {
        #[test]
        fn $name() {
            let expected: Vec<(String, Vec<String>)> = vec![
                $(($prog.to_string(), vec![$($arg.to_string()),*])),*
            ];
            assert_eq!(stages_for($expr), expected, "expression: {}", $expr);
        }
    };
}

// ── Parsing ──

parse_test!(parse_single, "ls -la /tmp", [("ls", ["-la", "/tmp"])]);
parse_test!(parse_no_args, "pwd", [("pwd", [])]);
parse_test!(
    parse_three_stages,
    "a | b | c",
    [("a", []), ("b", []), ("c", [])]
);
parse_test!(
    parse_args_stay_with_stage,
    "grep -n foo | sort -r | uniq -c",
    [("grep", ["-n", "foo"]), ("sort", ["-r"]), ("uniq", ["-c"])]
);
parse_test!(parse_double_quoted, r#"echo "a b c""#, [("echo", ["a b c"])]);
parse_test!(parse_single_quote_edges, "echo 'one'", [("echo", ["one"])]);
parse_test!(parse_backtick_edges, "echo `two`", [("echo", ["two"])]);
parse_test!(
    parse_interior_quotes_kept,
    r#"echo "it's fine""#,
    [("echo", ["it's fine"])]
);
parse_test!(
    parse_unterminated_quote,
    r#"echo "open ended"#,
    [("echo", ["open ended"])]
);
parse_test!(
    parse_extra_whitespace,
    "   cat    -n   |   wc   ",
    [("cat", ["-n"]), ("wc", [])]
);
parse_test!(
    parse_quoted_pipe,
    r#"echo "x | y" | cat"#,
    [("echo", ["x | y"]), ("cat", [])]
);
parse_test!(parse_empty_middle, "a || b", [("a", []), ("", []), ("b", [])]);
parse_test!(
    parse_script_argument,
    r#"echo "console.log('print \'TEST\'');" | node | python"#,
    [("echo", [r"console.log('print \'TEST\'');"]), ("node", []), ("python", [])]
);

// ── Runtime, real processes ──

#[cfg(unix)]
mod unix {
    use super::*;
    use std::io::Write;

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn three_stage_chain() {
        let p = Pipeline::new([
            CommandSpec::new("echo").arg("test"),
            CommandSpec::new("cat"),
            CommandSpec::new("tr").args(["a-z", "A-Z"]),
        ]);
        let out = text(p.output().unwrap());
        assert_eq!(out.trim_end_matches('\n'), "TEST");
    }

    #[test]
    fn chain_from_expression() {
        let out = text(pipechain::output("echo test | cat | tr a-z A-Z").unwrap());
        assert_eq!(out.trim_end_matches('\n'), "TEST");
    }

    #[test]
    fn quoted_argument_reaches_process() {
        let out = text(pipechain::output(r#"printf "%s|" "a b" c"#).unwrap());
        assert_eq!(out, "a b|c|");
    }

    #[test]
    fn appended_after_construction() {
        let p = Pipeline::new(Vec::new());
        p.append([CommandSpec::new("echo").arg("hi"), CommandSpec::new("cat")])
            .unwrap();
        p.prepend(Vec::new()).unwrap();
        assert_eq!(text(p.output().unwrap()), "hi\n");
    }

    #[test]
    fn provided_stdin_two_stages() {
        let p = Pipeline::from_expression("cat | cat");
        let mut sink = p.provide_stdin().unwrap();
        sink.write_all(b"hello").unwrap();
        assert_eq!(text(p.output().unwrap()), "hello");
        assert!(sink.buffered().is_empty());
    }

    #[test]
    fn no_stdin_means_empty_input() {
        assert_eq!(text(pipechain::output("cat | wc -c").unwrap()).trim(), "0");
    }

    #[test]
    fn missing_first_stage_fails() {
        let p = Pipeline::from_expression("pipechain-no-such-program-12345 | cat");
        match p.run() {
            Err(PipelineError::Execution {
                stage: 0,
                source: StageError::Spawn { program, .. },
            }) => assert_eq!(program, "pipechain-no-such-program-12345"),
            other => panic!("expected spawn failure, got {other:?}"),
        }
    }

    #[test]
    fn nonzero_intermediate_exit_fails() {
        let err = pipechain::output("false | cat").unwrap_err();
        assert_eq!(err.stage(), Some(0));
    }

    #[test]
    fn empty_stage_fails_at_run_time() {
        let err = pipechain::output("echo hi | | cat").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Execution {
                stage: 1,
                source: StageError::EmptyProgram
            }
        ));
    }

    #[test]
    fn terminal_failure_propagates() {
        let err = pipechain::output("echo hi | false").unwrap_err();
        assert_eq!(err.stage(), Some(1));
    }

    #[test]
    fn terminal_failure_ignored_by_config() {
        let mut config = Config::default_config();
        config.settings.terminal_failure = TerminalFailure::Ignore;
        let p = Pipeline::from_config("echo hi | sh -c \"cat; exit 4\"", &config);
        assert_eq!(text(p.output().unwrap()), "hi\n");
    }

    #[test]
    fn combined_output_order() {
        let p = Pipeline::from_expression(r#"sh -c "printf out; printf err >&2""#);
        assert_eq!(text(p.combined_output().unwrap()), "outerr");
        assert_eq!(text(p.output().unwrap()), "out");
        assert_eq!(text(p.stderr().unwrap()), "err");
    }

    #[test]
    fn intermediate_stderr_is_dropped() {
        let p = Pipeline::from_expression(r#"sh -c "echo noise >&2; echo data" | cat"#);
        assert_eq!(text(p.combined_output().unwrap()), "data\n");
    }

    #[test]
    fn second_run_is_noop() {
        let path = std::env::temp_dir().join(format!("pipechain-run-once-{}", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let script = format!("echo x >> {}", path.display());
        let p = Pipeline::new([CommandSpec::new("sh").args(["-c", script.as_str()])]);
        p.run().unwrap();
        p.run().unwrap();
        p.output().unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(written, "x\n");
    }

    #[test]
    fn empty_pipeline() {
        let p = Pipeline::new(Vec::new());
        p.run().unwrap();
        assert!(p.output().unwrap().is_empty());
        assert!(p.combined_output().unwrap().is_empty());
    }
}
