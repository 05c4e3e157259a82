//! Types produced by the expression parser and consumed by the pipeline runtime.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One stage of a pipeline: an executable name and its argument list.
///
/// A stage that tokenized to nothing has an empty `program`; that is not
/// rejected here but fails when the runtime tries to start it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Executable name or path.
    pub program: String,
    /// Arguments, in order, without the program name.
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Create a stage with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Build a stage from a token list: the first token is the program.
    ///
    /// An empty token list yields an empty program name.
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        let mut tokens = tokens.into_iter();
        let program = tokens.next().unwrap_or_default();
        Self {
            program,
            args: tokens.collect(),
        }
    }

    /// True if the stage has no executable name.
    pub fn is_empty(&self) -> bool {
        self.program.is_empty()
    }
}

/// Renders the stage as a POSIX-quoted command line.
impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let words = std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str));
        match shlex::try_join(words.clone()) {
            Ok(line) => f.write_str(&line),
            // Interior NUL: no quoting can express it, show the raw words.
            Err(_) => f.write_str(&words.collect::<Vec<_>>().join(" ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_tokens_splits_program() {
        let spec = CommandSpec::from_tokens(vec!["grep".into(), "-n".into(), "foo".into()]);
        assert_eq!(spec.program, "grep");
        assert_eq!(spec.args, vec!["-n", "foo"]);
    }

    #[test]
    fn from_tokens_empty() {
        let spec = CommandSpec::from_tokens(vec![]);
        assert!(spec.is_empty());
        assert!(spec.args.is_empty());
    }

    #[test]
    fn builder() {
        let spec = CommandSpec::new("tr").arg("a-z").args(["A-Z"]);
        assert_eq!(spec.args, vec!["a-z", "A-Z"]);
    }

    #[test]
    fn display_quotes_whitespace() {
        let spec = CommandSpec::new("echo").arg("hello world");
        let words = shlex::split(&spec.to_string()).unwrap();
        assert_eq!(words, vec!["echo", "hello world"]);
    }

    #[test]
    fn display_plain() {
        assert_eq!(CommandSpec::new("cat").arg("-n").to_string(), "cat -n");
    }

    #[test]
    fn serializes_program_and_args() {
        let spec = CommandSpec::new("wc").arg("-l");
        let json = serde_json::to_string(&spec).unwrap();
        assert_eq!(json, r#"{"program":"wc","args":["-l"]}"#);
    }
}
