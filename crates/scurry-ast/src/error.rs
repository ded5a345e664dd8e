//! Crate-level error type for `scurry-ast`.

use thiserror::Error;

use crate::parser::ParseError;

/// Errors surfaced at the `scurry-ast` crate boundary.
#[derive(Debug, Error)]
pub enum AstError {
    /// A DDL/DML statement failed to parse.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A source file contained no statements at all.
    #[error("empty source: {0}")]
    Empty(String),
}

/// Result type alias for `scurry-ast` operations.
pub type Result<T> = std::result::Result<T, AstError>;
