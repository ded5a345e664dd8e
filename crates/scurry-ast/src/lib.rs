//! Tokenizer, recursive-descent DDL parser, and canonical/pretty printers
//! for the CockroachDB DDL subset the rest of the workspace operates on.
//!
//! This crate deliberately does not implement a general SQL engine: it has
//! no `SELECT` query planner or executor. View and routine bodies are kept
//! as verbatim text rather than parsed into a tree, which is sufficient for
//! diffing (by comparing canonical body text) and for replaying a data dump.

pub mod ast;
mod error;
pub mod lexer;
pub mod parser;
pub mod printer;

pub use error::{AstError, Result};
pub use parser::{parse_statement, parse_statements, ParseError};
