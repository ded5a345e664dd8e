//! Crate-level error type for `scurry-db` (spec §7).

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced while introspecting, executing against, or tracking
/// migrations on the live database.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// Any error the driver returned, including connection failures and
    /// constraint violations surfaced while running a statement.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A desired-schema or dump file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The database refused to return catalog rows, or an expected catalog
    /// row was missing (§7, "Schema introspection error").
    #[error("schema introspection error: {0}")]
    Introspection(String),

    /// A catalog-supplied `CREATE` statement failed to parse.
    #[error("could not parse catalog definition for {object}: {source}")]
    CatalogParse {
        /// The object whose catalog text failed to parse.
        object: String,
        /// Underlying parse error.
        #[source]
        source: scurry_ast::ParseError,
    },

    /// A single DDL statement returned an error from the engine while
    /// applying a tracked migration (§7, "Migration failure"). The
    /// migration row has already transitioned to `failed` by the time this
    /// is returned.
    #[error("migration '{name}' failed at statement `{statement}`: {message}")]
    MigrationFailed {
        /// Name of the migration that failed.
        name: String,
        /// Canonical text of the statement that failed.
        statement: String,
        /// Driver-reported error message.
        message: String,
    },

    /// `complete`/`fail` saw zero rows affected: another process already
    /// recovered or completed this migration (§7, "Precondition
    /// violation").
    #[error("migration '{name}' is no longer in pending state")]
    NotInPendingState {
        /// Name of the migration.
        name: String,
    },

    /// `recover`/`reset_for_retry` saw a row not in `failed` status.
    #[error("migration '{name}' is not in failed state")]
    NotInFailedState {
        /// Name of the migration.
        name: String,
    },

    /// A migration declared dependencies that are not yet in a done state
    /// (§7, "Dependency unmet").
    #[error("migration '{name}' has unmet dependencies: {}", .unmet.join(", "))]
    DependencyUnmet {
        /// Name of the dependent migration.
        name: String,
        /// Names of the dependencies not yet `succeeded`/`recovered`.
        unmet: Vec<String>,
    },

    /// The statement-level timeout elapsed (§5, §9 "Cancellation and
    /// timeout"). Handled identically to any other statement failure.
    #[error("statement timed out after {0:?}")]
    Timeout(Duration),

    /// The caller-supplied cancellation context was canceled (§7,
    /// "Cancellation").
    #[error("operation cancelled")]
    Cancelled,

    /// `execute_remaining` was asked to resume after a statement that is
    /// not present in the migration's statement list.
    #[error("statement `{0}` not found in migration's statement list")]
    StatementNotFound(String),
}

/// Result type alias for `scurry-db` operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
