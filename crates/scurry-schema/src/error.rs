//! Crate-level error type for `scurry-schema`.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced while loading or building a [`crate::Schema`].
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A desired-schema file could not be read.
    #[error("{path}: {source}")]
    Io {
        /// File that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A desired-schema file failed to parse (§7, "Parse error").
    #[error("{path}: {source}")]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: scurry_ast::ParseError,
    },

    /// A statement was not one of the supported `CREATE` kinds.
    #[error("{path}: {message}")]
    Unsupported {
        /// File containing the offending statement.
        path: PathBuf,
        /// Description of the offending statement kind.
        message: String,
    },
}

/// Result type alias for `scurry-schema` operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
