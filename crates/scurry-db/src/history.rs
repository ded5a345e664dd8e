//! History Manager (§4.9): the migration lifecycle state machine backing
//! the `_scurry_.migrations` table, plus the nil-safe checkpoint cache
//! (§9, "Checkpoint cache").
//!
//! The table's own schema is managed the same way user schemas are: as a
//! `CREATE TABLE` parsed into a [`scurry_ast::ast::CreateTableStatement`],
//! diffed column-by-column against what's actually live, so that adding a
//! column to the embedded DDL below is enough to ship a self-upgrade.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use scurry_ast::ast::{AlterTableAction, AlterTableStatement, ColumnDef, Statement};
use scurry_ast::parser::parse_statement;
use scurry_ast::printer::canonical;
use sqlx::Row;
use tracing::{info, warn};

use crate::client::Client;
use crate::error::{MigrateError, Result};

/// The desired `_scurry_.migrations` table definition. Column additions
/// belong here; [`HistoryManager::self_upgrade`] diffs this against the
/// live table and emits the `ALTER TABLE ADD COLUMN` statements needed to
/// bring an older deployment's history table up to date.
const DESIRED_MIGRATIONS_TABLE: &str = "CREATE TABLE migrations ( \
    name STRING NOT NULL PRIMARY KEY, \
    checksum STRING NOT NULL, \
    depends_on STRING NOT NULL, \
    status STRING NOT NULL, \
    async BOOL NOT NULL DEFAULT false, \
    executed_by STRING NOT NULL DEFAULT '', \
    started_at TIMESTAMPTZ NOT NULL, \
    completed_at TIMESTAMPTZ, \
    applied_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
    failed_statement STRING, \
    error_message STRING \
)";

const DESIRED_CHECKPOINTS_TABLE: &str = "CREATE TABLE checkpoints ( \
    key STRING NOT NULL PRIMARY KEY, \
    value STRING NOT NULL, \
    updated_at TIMESTAMPTZ NOT NULL \
)";

/// Lifecycle status of one migration row (§3, "Applied Migration Record").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStatus {
    /// Currently being applied; a concurrent runner must not start it again.
    Running,
    /// Applied successfully.
    Succeeded,
    /// Applying it raised an error; blocks dependents until recovered.
    Failed,
    /// A failed migration a human has manually marked safe to treat as
    /// applied, without re-running it.
    Recovered,
}

impl MigrationStatus {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Recovered => "recovered",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "succeeded" => Some(Self::Succeeded),
            "failed" => Some(Self::Failed),
            "recovered" => Some(Self::Recovered),
            _ => None,
        }
    }

    /// Whether a dependent migration may treat `self` as satisfied.
    const fn satisfies_dependency(self) -> bool {
        matches!(self, Self::Succeeded | Self::Recovered)
    }
}

/// One row of `_scurry_.migrations`.
#[derive(Debug, Clone)]
pub struct AppliedMigration {
    /// Migration name (its canonical identity).
    pub name: String,
    /// Checksum of the migration's statement list at the time it ran.
    pub checksum: String,
    /// Names of migrations this one declared as prerequisites.
    pub depends_on: Vec<String>,
    /// Current lifecycle status.
    pub status: MigrationStatus,
    /// Whether this is a long-running migration whose `running` status does
    /// not block other operations (§3, §4.9, §9 "Async migrations").
    pub r#async: bool,
    /// Identity of whoever (or whatever automation) ran this migration.
    pub executed_by: String,
    /// When the migration started running.
    pub started_at: DateTime<Utc>,
    /// When it finished, if it has.
    pub completed_at: Option<DateTime<Utc>>,
    /// When this row was first written.
    pub applied_at: DateTime<Utc>,
    /// Canonical text of the statement that failed, set iff `status = failed`.
    pub failed_statement: Option<String>,
    /// The error message recorded for a failed migration, if any.
    pub error_message: Option<String>,
}

/// Owns the `_scurry_` history schema: the migrations ledger and the
/// checkpoint cache.
pub struct HistoryManager<'a> {
    client: &'a Client,
    schema: String,
}

impl<'a> HistoryManager<'a> {
    /// Binds a history manager to `schema` (the configured `_scurry_`
    /// schema name, which may be overridden).
    #[must_use]
    pub fn new(client: &'a Client, schema: impl Into<String>) -> Self {
        Self { client, schema: schema.into() }
    }

    /// Creates the history schema and tables if they don't exist, then
    /// self-upgrades the migrations table to the current column set.
    pub async fn init(&self) -> Result<()> {
        self.client.execute(&format!("CREATE SCHEMA IF NOT EXISTS {}", self.schema)).await?;
        self.client.execute(&self.qualified_create_table_sql("migrations", DESIRED_MIGRATIONS_TABLE)?).await?;
        self.client.execute(&self.qualified_create_table_sql("checkpoints", DESIRED_CHECKPOINTS_TABLE)?).await?;
        self.self_upgrade().await?;
        Ok(())
    }

    /// Renders `desired_ddl`'s parsed `CREATE TABLE` with its name
    /// schema-qualified to this history schema and an `IF NOT EXISTS`
    /// guard, reusing the printer rather than hand-assembling column SQL.
    fn qualified_create_table_sql(&self, table: &str, desired_ddl: &str) -> Result<String> {
        let mut stmt = parse_create_table(desired_ddl)?;
        stmt.name = scurry_ast::ast::QualifiedName { schema: Some(self.schema.clone()), name: table.to_string() };
        stmt.if_not_exists = true;
        Ok(canonical(&Statement::CreateTable(stmt)))
    }

    /// Diffs the live `migrations` table's columns against
    /// [`DESIRED_MIGRATIONS_TABLE`] and applies any missing ones, sorted by
    /// column name for determinism.
    async fn self_upgrade(&self) -> Result<()> {
        let show = format!("SHOW CREATE TABLE {}.migrations", self.schema);
        let live_ddl = self
            .client
            .fetch_one_string(&show, "create_statement")
            .await?
            .ok_or_else(|| MigrateError::Introspection("history table vanished mid-upgrade".into()))?;
        let live = parse_create_table(&live_ddl)?;
        let desired = parse_create_table(DESIRED_MIGRATIONS_TABLE)?;

        let live_names: HashSet<&str> = live.columns.iter().map(|c| c.name.as_str()).collect();
        let mut missing: Vec<&ColumnDef> =
            desired.columns.iter().filter(|c| !live_names.contains(c.name.as_str())).collect();
        missing.sort_by(|a, b| a.name.cmp(&b.name));

        for col in missing {
            let stmt = Statement::AlterTable(AlterTableStatement {
                table: scurry_ast::ast::QualifiedName { schema: Some(self.schema.clone()), name: "migrations".into() },
                actions: vec![AlterTableAction::AddColumn(col.clone())],
            });
            let sql = canonical(&stmt);
            warn!(column = %col.name, "self-upgrading history table with missing column");
            self.client.execute(&sql).await?;
        }
        Ok(())
    }

    /// Begins tracking `name` as running, after checking dependencies are
    /// met and no other runner already has it (or a differently-checksummed
    /// version of it) in flight.
    pub async fn start(
        &self,
        name: &str,
        checksum: &str,
        depends_on: &[String],
        async_migration: bool,
        executed_by: &str,
    ) -> Result<()> {
        self.check_dependencies_met(name, depends_on).await?;
        let existing = self.get(name).await?;
        if let Some(row) = &existing {
            if row.status == MigrationStatus::Succeeded || row.status == MigrationStatus::Recovered {
                info!(name, "migration already applied, skipping");
                return Ok(());
            }
            if row.status == MigrationStatus::Running {
                return Err(MigrateError::NotInPendingState { name: name.to_string() });
            }
        }
        let depends_on_joined = depends_on.join(",");
        let sql = format!(
            "UPSERT INTO {}.migrations \
             (name, checksum, depends_on, status, async, executed_by, started_at, completed_at, applied_at, failed_statement, error_message) \
             VALUES ($1, $2, $3, 'running', $4, $5, now(), NULL, now(), NULL, NULL)",
            self.schema
        );
        sqlx::query(&sql)
            .bind(name)
            .bind(checksum)
            .bind(depends_on_joined.as_str())
            .bind(async_migration)
            .bind(executed_by)
            .execute(self.client.pool())
            .await?;
        info!(name, async_migration, "migration started");
        Ok(())
    }

    /// Marks `name` as succeeded. Used by the tracked executor after every
    /// statement in the migration has applied.
    pub async fn complete(&self, name: &str) -> Result<()> {
        let sql = format!(
            "UPDATE {}.migrations SET status = 'succeeded', completed_at = now() \
             WHERE name = $1 AND status = 'running'",
            self.schema
        );
        let result = sqlx::query(&sql).bind(name).execute(self.client.pool()).await?;
        if result.rows_affected() == 0 {
            return Err(MigrateError::NotInPendingState { name: name.to_string() });
        }
        info!(name, "migration completed");
        Ok(())
    }

    /// Marks `name` as failed at `failed_statement` with `error_message`
    /// (§7, "Migration failure"). Left in `failed` state until a human
    /// calls [`HistoryManager::recover`] or [`HistoryManager::reset_for_retry`].
    /// Persisting `failed_statement` is what lets
    /// [`crate::executor::TrackedExecutor::execute_remaining`] find, by
    /// canonical-text equality, exactly where a resumed recovery should
    /// continue from.
    pub async fn fail(&self, name: &str, failed_statement: &str, error_message: &str) -> Result<()> {
        let sql = format!(
            "UPDATE {}.migrations SET status = 'failed', completed_at = now(), failed_statement = $2, error_message = $3 \
             WHERE name = $1 AND status = 'running'",
            self.schema
        );
        let result = sqlx::query(&sql)
            .bind(name)
            .bind(failed_statement)
            .bind(error_message)
            .execute(self.client.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(MigrateError::NotInPendingState { name: name.to_string() });
        }
        warn!(name, failed_statement, error_message, "migration failed");
        Ok(())
    }

    /// Manually marks a failed migration as recovered, satisfying
    /// dependents without re-running it.
    pub async fn recover(&self, name: &str) -> Result<()> {
        let sql = format!(
            "UPDATE {}.migrations SET status = 'recovered', completed_at = now() WHERE name = $1 AND status = 'failed'",
            self.schema
        );
        let result = sqlx::query(&sql).bind(name).execute(self.client.pool()).await?;
        if result.rows_affected() == 0 {
            return Err(MigrateError::NotInFailedState { name: name.to_string() });
        }
        info!(name, "migration manually recovered");
        Ok(())
    }

    /// Deletes a failed migration's row so it can be re-attempted from
    /// scratch via [`HistoryManager::start`].
    pub async fn reset_for_retry(&self, name: &str) -> Result<()> {
        let sql = format!("DELETE FROM {}.migrations WHERE name = $1 AND status = 'failed'", self.schema);
        let result = sqlx::query(&sql).bind(name).execute(self.client.pool()).await?;
        if result.rows_affected() == 0 {
            return Err(MigrateError::NotInFailedState { name: name.to_string() });
        }
        info!(name, "migration reset for retry");
        Ok(())
    }

    /// Records `name` as already succeeded in one shot, without passing
    /// through the `running` state. Used by the bulk DDL executor mode
    /// (§4.10), which applies a whole chunk without per-statement tracking.
    pub async fn record(
        &self,
        name: &str,
        checksum: &str,
        depends_on: &[String],
        async_migration: bool,
        executed_by: &str,
    ) -> Result<()> {
        let depends_on_joined = depends_on.join(",");
        let sql = format!(
            "UPSERT INTO {}.migrations \
             (name, checksum, depends_on, status, async, executed_by, started_at, completed_at, applied_at, failed_statement, error_message) \
             VALUES ($1, $2, $3, 'succeeded', $4, $5, now(), now(), now(), NULL, NULL)",
            self.schema
        );
        sqlx::query(&sql)
            .bind(name)
            .bind(checksum)
            .bind(depends_on_joined.as_str())
            .bind(async_migration)
            .bind(executed_by)
            .execute(self.client.pool())
            .await?;
        Ok(())
    }

    /// Returns the first (by name) row that blocks other migrations: one
    /// with status `failed`, or status `running` (the persisted "pending"
    /// state) with `async = false` (§4.9). A `running` row with
    /// `async = true` is a long-running background migration and does not
    /// block — this is the *only* policy difference async migrations get;
    /// they otherwise share the same lifecycle state machine as every other
    /// migration (§9, "Async migrations").
    pub async fn get_blocking_migration(&self) -> Result<Option<AppliedMigration>> {
        let sql = format!(
            "SELECT name, checksum, depends_on, status, async, executed_by, started_at, completed_at, applied_at, failed_statement, error_message \
             FROM {}.migrations \
             WHERE status = 'failed' OR (status = 'running' AND async = false) \
             ORDER BY name LIMIT 1",
            self.schema
        );
        let row = sqlx::query(&sql).fetch_optional(self.client.pool()).await?;
        Ok(row.map(row_to_applied_migration))
    }

    /// Returns an error listing every one of `name`'s unmet dependencies,
    /// if any.
    pub async fn check_dependencies_met(&self, name: &str, depends_on: &[String]) -> Result<()> {
        let mut unmet = Vec::new();
        for dep in depends_on {
            match self.get(dep).await? {
                Some(row) if row.status.satisfies_dependency() => {}
                _ => unmet.push(dep.clone()),
            }
        }
        if !unmet.is_empty() {
            return Err(MigrateError::DependencyUnmet { name: name.to_string(), unmet });
        }
        Ok(())
    }

    /// Whether any migration is currently a running, async (long-running
    /// background) migration (§4.9 `has_running_async`). Unlike
    /// [`HistoryManager::get_blocking_migration`], this is `true` precisely
    /// for the rows that the blocking check *excludes*.
    pub async fn has_running_async(&self) -> Result<bool> {
        let sql =
            format!("SELECT count(*) AS n FROM {}.migrations WHERE status = 'running' AND async = true", self.schema);
        let row = sqlx::query(&sql).fetch_one(self.client.pool()).await?;
        let n: i64 = row.get("n");
        Ok(n > 0)
    }

    /// Fetches one migration's record by name.
    pub async fn get(&self, name: &str) -> Result<Option<AppliedMigration>> {
        let sql = format!(
            "SELECT name, checksum, depends_on, status, async, executed_by, started_at, completed_at, applied_at, failed_statement, error_message \
             FROM {}.migrations WHERE name = $1",
            self.schema
        );
        let row = sqlx::query(&sql).bind(name).fetch_optional(self.client.pool()).await?;
        Ok(row.map(row_to_applied_migration))
    }

    /// Every migration record, ordered by start time.
    pub async fn get_applied(&self) -> Result<Vec<AppliedMigration>> {
        let sql = format!(
            "SELECT name, checksum, depends_on, status, async, executed_by, started_at, completed_at, applied_at, failed_statement, error_message \
             FROM {}.migrations ORDER BY started_at",
            self.schema
        );
        let rows = sqlx::query(&sql).fetch_all(self.client.pool()).await?;
        Ok(rows.into_iter().map(row_to_applied_migration).collect())
    }
}

fn row_to_applied_migration(row: sqlx::postgres::PgRow) -> AppliedMigration {
    let depends_on_raw: String = row.get("depends_on");
    let status_raw: String = row.get("status");
    AppliedMigration {
        name: row.get("name"),
        checksum: row.get("checksum"),
        depends_on: if depends_on_raw.is_empty() { vec![] } else { depends_on_raw.split(',').map(str::to_string).collect() },
        status: MigrationStatus::parse(&status_raw).unwrap_or(MigrationStatus::Failed),
        r#async: row.get("async"),
        executed_by: row.get("executed_by"),
        started_at: row.get("started_at"),
        completed_at: row.get("completed_at"),
        applied_at: row.get("applied_at"),
        failed_statement: row.get("failed_statement"),
        error_message: row.get("error_message"),
    }
}

fn parse_create_table(sql: &str) -> Result<scurry_ast::ast::CreateTableStatement> {
    match parse_statement(sql) {
        Ok(Statement::CreateTable(t)) => Ok(t),
        Ok(_) => Err(MigrateError::Introspection("expected a CREATE TABLE statement".into())),
        Err(source) => Err(MigrateError::CatalogParse { object: "_scurry_.migrations".into(), source }),
    }
}

/// Nil-safe UPSERT cache over `_scurry_.checkpoints` (§9, "Checkpoint
/// cache"): a `None` client makes every method a no-op, the same pattern
/// the teacher's optional feature flags use to stay out of the hot path
/// when a facility is disabled.
pub struct CheckpointCache<'a> {
    client: Option<&'a Client>,
    schema: String,
}

impl<'a> CheckpointCache<'a> {
    /// Builds a cache. Pass `None` to disable caching entirely.
    #[must_use]
    pub fn new(client: Option<&'a Client>, schema: impl Into<String>) -> Self {
        Self { client, schema: schema.into() }
    }

    /// Reads a cached value, or `None` if caching is disabled or the key
    /// isn't present.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let Some(client) = self.client else { return Ok(None) };
        let sql = format!("SELECT value FROM {}.checkpoints WHERE key = $1", self.schema);
        let row = sqlx::query(&sql).bind(key).fetch_optional(client.pool()).await?;
        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    /// Writes a cached value. A no-op if caching is disabled.
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        let Some(client) = self.client else { return Ok(()) };
        let sql = format!(
            "UPSERT INTO {}.checkpoints (key, value, updated_at) VALUES ($1, $2, now())",
            self.schema
        );
        sqlx::query(&sql).bind(key).bind(value).execute(client.pool()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for s in [MigrationStatus::Running, MigrationStatus::Succeeded, MigrationStatus::Failed, MigrationStatus::Recovered] {
            assert_eq!(MigrationStatus::parse(s.as_str()), Some(s));
        }
    }

    #[test]
    fn only_succeeded_and_recovered_satisfy_a_dependency() {
        assert!(MigrationStatus::Succeeded.satisfies_dependency());
        assert!(MigrationStatus::Recovered.satisfies_dependency());
        assert!(!MigrationStatus::Running.satisfies_dependency());
        assert!(!MigrationStatus::Failed.satisfies_dependency());
    }

    #[test]
    fn desired_migrations_table_parses() {
        parse_create_table(DESIRED_MIGRATIONS_TABLE).unwrap();
    }

    #[test]
    fn desired_migrations_table_carries_async_and_failure_columns() {
        let table = parse_create_table(DESIRED_MIGRATIONS_TABLE).unwrap();
        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        for expected in ["async", "executed_by", "applied_at", "failed_statement"] {
            assert!(names.contains(&expected), "missing column {expected}");
        }
    }

    #[test]
    fn desired_checkpoints_table_parses() {
        parse_create_table(DESIRED_CHECKPOINTS_TABLE).unwrap();
    }
}
