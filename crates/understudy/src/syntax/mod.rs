//! Compact double targets: `"[Name:]Original[method, static:method]"`.

pub mod token;
pub mod lexer;
pub mod parser;

pub use parser::DoubleTarget;

use crate::analysis::RawMethodSpec;
use crate::error::Result;

pub fn parse_target(src: &str) -> Result<DoubleTarget> {
    let tokens = lexer::Lexer::new(src).tokenize()?;
    parser::Parser::new(tokens).parse_target()
}

/// Parse `"name"` or `"static:name"`.
pub fn parse_method_spec(src: &str) -> Result<RawMethodSpec> {
    let tokens = lexer::Lexer::new(src).tokenize()?;
    parser::Parser::new(tokens).parse_method_spec()
}
