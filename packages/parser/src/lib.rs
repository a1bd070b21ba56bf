//! Annotation model and parser for generated report text.
//!
//! The parser is total: any input produces a [`Document`], with tokens it
//! cannot make sense of kept as plain text.

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::*;
pub use parser::{parse, parse_inline, Parser, DEFAULT_DRAFT_NOTICE};
