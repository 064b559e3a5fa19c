//! An ECMAScript parser producing an ESTree-shaped syntax tree.
//!
//! ```
//! use ecmaparse::{parse, Options};
//!
//! let program = parse("let answer = 6 * 7;", &Options::script()).unwrap();
//! assert_eq!(program.body.len(), 1);
//! ```
//!
//! Every node carries byte offsets, and line/column records when
//! [`Options::include_locations`] is set. Trees serialize with `serde` to the
//! ESTree JSON shape.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod options;
mod parser;

pub use ast::{Program, SourceType};
pub use error::{ErrorKind, ParseError};
pub use options::Options;

/// Parses `source` with the goal symbol and grammar selected by `options`.
pub fn parse(source: &str, options: &Options) -> Result<Program, ParseError> {
    parser::Parser::new(source, options)?.parse_program()
}

/// Parses `source` as a sloppy-mode script with default options.
pub fn parse_script(source: &str) -> Result<Program, ParseError> {
    parse(source, &Options::script())
}

/// Parses `source` as a module with default options.
pub fn parse_module(source: &str) -> Result<Program, ParseError> {
    parse(source, &Options::module())
}
