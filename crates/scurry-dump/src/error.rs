//! Crate-level error type for `scurry-dump` (spec §7).

use thiserror::Error;

use crate::compat::CompatibilityIssue;

/// Errors surfaced while writing, parsing, or loading a dump.
#[derive(Debug, Error)]
pub enum DumpError {
    /// The dump text was malformed: a missing/mismatched header marker, a
    /// section out of order, or a statement that could not be split from
    /// its neighbors (§7, "Parse error"; §6, "Wire format of dumps").
    #[error("dump parse error at line {line}: {message}")]
    Parse {
        /// One-based line number where the problem was found.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// The dump's embedded schema DDL, or the live schema it is compared
    /// against, failed to parse.
    #[error("schema parse error: {0}")]
    SchemaParse(#[from] scurry_ast::ParseError),

    /// The desired-schema loader rejected a statement in the dump's schema
    /// section (not a `CREATE`).
    #[error("schema error: {0}")]
    Schema(#[from] scurry_schema::SchemaError),

    /// The sequencer found a cycle while ordering the `create_schema` DDL
    /// or the FK Order Resolver found one while ordering tables.
    #[error("sequencing error: {0}")]
    Sequencer(#[from] scurry_sequencer::SequencerError),

    /// One or more severity-`error` issues were found while checking the
    /// dump's schema against the live schema (§7, "Compatibility error").
    #[error("{} compatibility issue(s) block this load", .0.len())]
    Compatibility(Vec<CompatibilityIssue>),

    /// A table or sequence in the dump's row/sequence data has no matching
    /// declaration in the dump's own schema section.
    #[error("dump is internally inconsistent: {0}")]
    Inconsistent(String),

    /// A database call failed while applying `create_schema` DDL, querying
    /// the live schema, or replaying row data.
    #[error("database error: {0}")]
    Db(#[from] scurry_db::MigrateError),

    /// The dump could not be read from or written to its backing file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for `scurry-dump` operations.
pub type Result<T> = std::result::Result<T, DumpError>;
