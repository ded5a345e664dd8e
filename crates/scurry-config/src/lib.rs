//! Runtime configuration shared by every `scurry` crate.
//!
//! `Config` is a plain, deserializable value: it carries no knowledge of how
//! it is populated. An embedding binary is free to build one from a CLI
//! parser, a TOML file, environment variables, or by hand — the same
//! separation the teacher keeps between `oxide-migrate` (library) and its
//! `main.rs` (binary, owns `clap`).

use std::time::Duration;

use serde::Deserialize;

/// Default bound on the number of DDL statements placed in a single
/// transaction-safe chunk during migration.
pub const DEFAULT_DDL_CHUNK_SIZE: usize = 50;

/// Default number of rows written per `INSERT` statement when dumping data.
pub const DEFAULT_DUMP_BATCH_SIZE: usize = 500;

/// Default per-statement timeout, in seconds, applied to the database
/// session unless overridden.
pub const DEFAULT_STATEMENT_TIMEOUT_SECS: u64 = 30;

/// Name of the schema scurry uses to store its own migration history and
/// checkpoint cache, unless overridden (tests commonly override this to
/// isolate runs from one another).
pub const DEFAULT_HISTORY_SCHEMA: &str = "_scurry_";

/// Runtime configuration for a scurry session.
///
/// Every field has a sensible default via [`Config::default`] except the
/// connection string, which the caller must supply.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database connection string (a `postgres://` URL, since CockroachDB
    /// speaks the PostgreSQL wire protocol).
    pub connection_string: String,

    /// Schema new objects are created in when a statement or desired-schema
    /// file does not qualify an object with its own schema name.
    pub default_schema: String,

    /// Per-statement timeout enforced on the database session.
    #[serde(with = "duration_secs")]
    pub statement_timeout: Duration,

    /// Upper bound on the number of DDL statements grouped into a single
    /// transaction-safe chunk.
    pub ddl_chunk_size: usize,

    /// When set, the dump writer and `scurry_ast::printer` emit
    /// multi-line, indented SQL rather than single-line canonical form.
    pub pretty_print: bool,

    /// Number of rows per `INSERT` statement when writing a data dump.
    pub dump_batch_size: usize,

    /// Name of the schema holding scurry's migration history table and
    /// checkpoint cache.
    pub history_schema: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connection_string: String::new(),
            default_schema: "public".to_string(),
            statement_timeout: Duration::from_secs(DEFAULT_STATEMENT_TIMEOUT_SECS),
            ddl_chunk_size: DEFAULT_DDL_CHUNK_SIZE,
            pretty_print: false,
            dump_batch_size: DEFAULT_DUMP_BATCH_SIZE,
            history_schema: DEFAULT_HISTORY_SCHEMA.to_string(),
        }
    }
}

impl Config {
    /// Builds a config pointed at `connection_string`, otherwise defaulted.
    #[must_use]
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            ..Self::default()
        }
    }

    /// Sets the default schema, returning `self` for chaining.
    #[must_use]
    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = schema.into();
        self
    }

    /// Sets the statement timeout, returning `self` for chaining.
    #[must_use]
    pub const fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = timeout;
        self
    }

    /// Sets the DDL chunk size bound, returning `self` for chaining.
    ///
    /// A chunk size of `0` is treated as unbounded by callers, but is
    /// rejected here since an empty chunk can never make progress.
    pub fn with_ddl_chunk_size(mut self, size: usize) -> Result<Self, ConfigError> {
        if size == 0 {
            return Err(ConfigError::InvalidChunkSize);
        }
        self.ddl_chunk_size = size;
        Ok(self)
    }

    /// Sets the history schema name, returning `self` for chaining.
    #[must_use]
    pub fn with_history_schema(mut self, schema: impl Into<String>) -> Self {
        self.history_schema = schema.into();
        self
    }

    /// Enables pretty-printing, returning `self` for chaining.
    #[must_use]
    pub const fn with_pretty_print(mut self, pretty: bool) -> Self {
        self.pretty_print = pretty;
        self
    }

    /// Validates invariants that cannot be expressed in the type alone.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connection_string.is_empty() {
            return Err(ConfigError::MissingConnectionString);
        }
        if self.ddl_chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize);
        }
        if self.dump_batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        Ok(())
    }
}

/// Errors raised while validating a [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No connection string was supplied.
    #[error("connection_string must not be empty")]
    MissingConnectionString,

    /// `ddl_chunk_size` was zero.
    #[error("ddl_chunk_size must be at least 1")]
    InvalidChunkSize,

    /// `dump_batch_size` was zero.
    #[error("dump_batch_size must be at least 1")]
    InvalidBatchSize,
}

/// `serde` helper for (de)serializing a [`Duration`] as a whole number of
/// seconds, since `Duration` has no `Deserialize` impl of its own.
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid_once_connection_string_is_set() {
        let config = Config::new("postgres://root@localhost:26257/defaultdb");
        assert!(config.validate().is_ok());
        assert_eq!(config.ddl_chunk_size, DEFAULT_DDL_CHUNK_SIZE);
        assert_eq!(config.history_schema, DEFAULT_HISTORY_SCHEMA);
    }

    #[test]
    fn missing_connection_string_fails_validation() {
        let config = Config::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingConnectionString)
        ));
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let err = Config::new("postgres://x").with_ddl_chunk_size(0).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidChunkSize));
    }

    #[test]
    fn deserializes_from_json_with_integer_timeout() {
        let json = r#"{
            "connection_string": "postgres://root@localhost:26257/defaultdb",
            "default_schema": "app",
            "statement_timeout": 60,
            "ddl_chunk_size": 25,
            "pretty_print": true,
            "dump_batch_size": 1000,
            "history_schema": "_scurry_"
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.default_schema, "app");
        assert_eq!(config.statement_timeout, Duration::from_secs(60));
        assert!(config.pretty_print);
    }
}
