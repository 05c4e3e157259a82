pub mod expression;
pub mod tokenize;
pub mod types;

pub use expression::{ExpressionParser, parse_command};
pub use tokenize::{split, tokenize, trim_quotes};
pub use types::CommandSpec;
