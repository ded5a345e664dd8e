//! The `Client` abstraction (§6, §9): the single owner of a database
//! connection, built on `sqlx`'s Postgres driver since CockroachDB speaks
//! the PostgreSQL wire protocol — the same way the teacher built its
//! executor and history manager on `sqlx`'s SQLite driver.
//!
//! A `Client` is not safe for concurrent use from within the core (§5,
//! "Shared resources"); the underlying pool may be, but every method here
//! takes `&self` and talks to the database sequentially.

use std::time::Duration;

use async_trait::async_trait;
use scurry_config::Config;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use tracing::debug;

use crate::error::{MigrateError, Result};

/// Owns a connection pool to the target CockroachDB cluster and applies the
/// session-level settings (statement timeout) `Config` describes.
#[derive(Debug, Clone)]
pub struct Client {
    pool: PgPool,
    statement_timeout: Duration,
}

impl Client {
    /// Connects to `config.connection_string` and sets the per-session
    /// statement timeout (§5, "Cancellation and timeout").
    pub async fn connect(config: &Config) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&config.connection_string)
            .await?;
        let client = Self { pool, statement_timeout: config.statement_timeout };
        client.apply_statement_timeout().await?;
        Ok(client)
    }

    /// Wraps an already-connected pool, applying `statement_timeout` to new
    /// sessions. Used by tests and by the shadow-database collaborator,
    /// which hands back a pool it created itself.
    #[must_use]
    pub fn from_pool(pool: PgPool, statement_timeout: Duration) -> Self {
        Self { pool, statement_timeout }
    }

    async fn apply_statement_timeout(&self) -> Result<()> {
        let ms = self.statement_timeout.as_millis();
        self.execute(&format!("SET statement_timeout = {ms}")).await?;
        Ok(())
    }

    /// The underlying pool, for crates that need driver-level access
    /// (introspection, history, executor).
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Executes one statement, returning the number of rows affected.
    /// `sql` is assumed to be a single statement — callers that need to run
    /// several as one round trip use [`Client::execute_joined`].
    pub async fn execute(&self, sql: &str) -> Result<u64> {
        debug!(sql, "executing statement");
        let result = sqlx::query(sql).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Executes `statements` joined by `; ` as one round trip inside a
    /// transaction, committing only if every statement succeeds (§4.10,
    /// "Each transactional chunk is executed as one joined statement string
    /// inside a retrying transaction").
    pub async fn execute_joined_in_transaction(&self, statements: &[String]) -> Result<()> {
        if statements.is_empty() {
            return Ok(());
        }
        let joined = statements.join("; ");
        debug!(sql = %joined, "executing transactional chunk");
        let mut tx = self.pool.begin().await?;
        sqlx::query(&joined).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Executes `statements` one at a time, outside of any transaction
    /// (§4.10: "non-transactional chunks are executed directly"). Needed for
    /// a rewrite-requiring `ALTER COLUMN TYPE` (§4.4.1), which CockroachDB
    /// refuses to run inside a transaction.
    pub async fn execute_sequential(&self, statements: &[String]) -> Result<()> {
        for stmt in statements {
            self.execute(stmt).await?;
        }
        Ok(())
    }

    /// Fetches the first column of the first row of `sql` as a string, or
    /// `None` if the query returned no rows. Used by introspection to pull
    /// `SHOW CREATE ...` output.
    pub async fn fetch_one_string(&self, sql: &str, column: &str) -> Result<Option<String>> {
        let row = sqlx::query(sql).fetch_optional(&self.pool).await?;
        Ok(row.map(|r| r.get::<String, _>(column)))
    }

    /// Fetches one column of every row of `sql` as strings.
    pub async fn fetch_column(&self, sql: &str, column: &str) -> Result<Vec<String>> {
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(|r| r.get::<String, _>(column)).collect())
    }

    /// Fetches every row of `sql` with every column decoded as its textual
    /// form, `None` marking a SQL `NULL`. Used by the dump generator, which
    /// casts every selected column to `::STRING` so heterogeneous column
    /// types decode uniformly without per-type driver mapping.
    pub async fn fetch_text_rows(&self, sql: &str) -> Result<Vec<Vec<Option<String>>>> {
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(|r| (0..r.len()).map(|i| r.get::<Option<String>, _>(i)).collect()).collect())
    }
}

/// The external facility that can spin up a private, schemaless database
/// instance for integration tests and for the pretty-print/compatibility-
/// check pipeline (§6, "Shadow database"; §9, "treat it as an injected
/// collaborator, not a singleton baked into the core").
///
/// `scurry-db` depends only on this trait; a concrete implementation (e.g.
/// spinning up a throwaway CockroachDB instance) is the embedding
/// application's concern, same as the TTY/CLI layer.
#[async_trait]
pub trait ShadowDatabase: Send + Sync {
    /// Creates a freshly provisioned, UUID-suffixed database and returns a
    /// [`Client`] owning it, having applied `initial_ddl` first.
    async fn get_shadow(&self, initial_ddl: &[String]) -> Result<Client>;

    /// Tears down the shadow database created by the most recent
    /// [`ShadowDatabase::get_shadow`] call.
    async fn stop_shadow(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_millis_conversion_has_no_surprises() {
        let timeout = Duration::from_secs(30);
        assert_eq!(timeout.as_millis(), 30_000);
    }
}
