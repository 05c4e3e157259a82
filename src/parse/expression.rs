use super::tokenize::tokenize;
use super::types::CommandSpec;
use crate::config::Config;

/// Split an expression at `|`, ignoring pipes inside double quotes.
///
/// Segments are trimmed but never dropped: `a || b` has an empty middle stage.
fn split_stages_quoted(expression: &str) -> Vec<&str> {
    let mut stages = Vec::new();
    let mut start = 0;
    let mut quoted = false;

    for (i, c) in expression.char_indices() {
        match c {
            '"' => quoted = !quoted,
            '|' if !quoted => {
                stages.push(expression[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    stages.push(expression[start..].trim());

    stages
}

/// Split an expression at every `|`, quoted or not.
fn split_stages_literal(expression: &str) -> Vec<&str> {
    expression.split('|').map(str::trim).collect()
}

/// Turns a `a | b "c d" | e` expression into an ordered list of stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpressionParser {
    /// Whether `|` inside a double-quoted span stays part of the argument.
    pub quote_aware_pipes: bool,
}

impl Default for ExpressionParser {
    fn default() -> Self {
        Self {
            quote_aware_pipes: true,
        }
    }
}

impl ExpressionParser {
    /// Build a parser from the `[settings]` section.
    pub fn from_config(config: &Config) -> Self {
        Self {
            quote_aware_pipes: config.settings.quote_aware_pipes,
        }
    }

    /// Split an expression into trimmed stage strings.
    pub fn split_stages<'a>(&self, expression: &'a str) -> Vec<&'a str> {
        if self.quote_aware_pipes {
            split_stages_quoted(expression)
        } else {
            split_stages_literal(expression)
        }
    }

    /// Parse an expression into stages, left to right.
    ///
    /// Executables are not resolved here; a stage with no words becomes a
    /// `CommandSpec` with an empty program and fails when run.
    pub fn parse(&self, expression: &str) -> Vec<CommandSpec> {
        self.split_stages(expression)
            .into_iter()
            .map(|stage| CommandSpec::from_tokens(tokenize(stage)))
            .collect()
    }
}

/// Parse an expression with the default (quote-aware) parser.
pub fn parse_command(expression: &str) -> Vec<CommandSpec> {
    ExpressionParser::default().parse(expression)
}
