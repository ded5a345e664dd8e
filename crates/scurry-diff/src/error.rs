//! Crate-level error type for `scurry-diff`.

use thiserror::Error;

/// Errors surfaced while extracting dependencies or diffing schemas.
#[derive(Debug, Error)]
pub enum DiffError {
    /// The Provides/Requires Extractor was handed a statement kind it has no
    /// table entry for (§4.3: "Behavior on an unknown statement kind is
    /// fatal: the extractor must refuse to guess.").
    #[error("no Provides/Requires entry for statement kind `{0}`")]
    UnknownStatementKind(&'static str),
}

/// Result type alias for `scurry-diff` operations.
pub type Result<T> = std::result::Result<T, DiffError>;
