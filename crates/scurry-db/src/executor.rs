//! Executor (§4.10): applies a [`SequencedMigration`]'s rendered statement
//! stream to the live database, in one of two modes.
//!
//! `DdlExecutor` runs in "bulk" mode: every transaction-safe chunk is sent
//! as one joined statement, and the whole migration is recorded as applied
//! in a single history row once every chunk has committed. `TrackedExecutor`
//! runs in "tracked" mode: each statement is executed and recorded
//! individually, so a mid-migration failure can be resumed from the exact
//! statement that failed (§4.10, §7 "Migration failure").

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::client::Client;
use crate::error::{MigrateError, Result};
use crate::history::HistoryManager;

/// One group of rendered statements, as produced by [`chunk_for_execution`].
/// `-- WARNING:` comment lines are kept attached to the statement they
/// precede rather than sent to the database, matching the teacher's "skip
/// comment lines" rule in its own executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionGroup {
    /// Statements to run together, in order.
    pub statements: Vec<String>,
    /// Whether this group runs inside one joined transaction (`true`, the
    /// common case) or must be executed statement-by-statement outside any
    /// transaction (`false` — a rewrite-requiring `ALTER COLUMN TYPE`
    /// chunk, §4.4.1/§4.10).
    pub transactional: bool,
}

impl Default for ExecutionGroup {
    fn default() -> Self {
        Self { statements: Vec::new(), transactional: true }
    }
}

/// Splits a sequenced migration's rendered statement stream (the
/// `statements` field the Migration Sequencer produces) into execution
/// groups (§4.10): a `COMMIT` immediately followed by `BEGIN` closes the
/// current transactional chunk and opens the next one; a lone `COMMIT` (not
/// followed by `BEGIN`) closes the current chunk and switches into
/// non-transactional mode for everything up to the next `BEGIN`, which
/// switches back. `-- WARNING:` comment lines are dropped from the
/// statement list they annotate.
#[must_use]
pub fn chunk_for_execution(statements: &[String]) -> Vec<ExecutionGroup> {
    let mut groups = Vec::new();
    let mut current = ExecutionGroup::default();
    let mut i = 0;
    while i < statements.len() {
        let line = statements[i].trim();
        if line.starts_with("-- WARNING:") {
            i += 1;
            continue;
        }
        if line == "COMMIT" && statements.get(i + 1).is_some_and(|s| s.trim() == "BEGIN") {
            if !current.statements.is_empty() {
                groups.push(std::mem::replace(&mut current, ExecutionGroup::default()));
            }
            i += 2;
            continue;
        }
        if line == "COMMIT" {
            if !current.statements.is_empty() {
                groups.push(std::mem::take(&mut current));
            }
            current.transactional = false;
            i += 1;
            continue;
        }
        if line == "BEGIN" {
            if !current.statements.is_empty() {
                groups.push(std::mem::take(&mut current));
            }
            current.transactional = true;
            i += 1;
            continue;
        }
        current.statements.push(statements[i].clone());
        i += 1;
    }
    if !current.statements.is_empty() {
        groups.push(current);
    }
    groups
}

fn checksum(statements: &[String]) -> String {
    let mut hasher = Sha256::new();
    for s in statements {
        hasher.update(s.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

/// Applies a whole migration's statement stream transaction-group by
/// transaction-group, with no per-statement tracking, then records the
/// entire migration as succeeded in one history row (§4.10, "bulk mode" —
/// the common case for an automated `migrate` run with no need to resume
/// mid-migration).
pub struct DdlExecutor<'a> {
    client: &'a Client,
    history: HistoryManager<'a>,
    dry_run: bool,
}

impl<'a> DdlExecutor<'a> {
    /// Builds a bulk executor against `client`, tracking history in
    /// `history_schema`.
    #[must_use]
    pub fn new(client: &'a Client, history_schema: impl Into<String>) -> Self {
        Self { client, history: HistoryManager::new(client, history_schema), dry_run: false }
    }

    /// Enables dry-run mode: statements are logged but never executed or
    /// recorded.
    #[must_use]
    pub const fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Applies `name`'s rendered statement stream. `async_migration` and
    /// `executed_by` are recorded on the history row (§3, §4.9); a migration
    /// applied as async does not block other migrations while it is
    /// `running`.
    pub async fn apply(
        &self,
        name: &str,
        depends_on: &[String],
        async_migration: bool,
        executed_by: &str,
        statements: &[String],
    ) -> Result<()> {
        let groups = chunk_for_execution(statements);
        info!(name, groups = groups.len(), "applying migration in bulk mode");
        let sum = checksum(statements);

        if self.dry_run {
            for group in &groups {
                for stmt in &group.statements {
                    debug!(sql = %stmt, "dry run, not executing");
                }
            }
            return Ok(());
        }

        for (i, group) in groups.iter().enumerate() {
            debug!(
                name,
                chunk = i,
                statements = group.statements.len(),
                transactional = group.transactional,
                "executing chunk"
            );
            let result = if group.transactional {
                self.client.execute_joined_in_transaction(&group.statements).await
            } else {
                self.client.execute_sequential(&group.statements).await
            };
            result.map_err(|e| MigrateError::MigrationFailed {
                name: name.to_string(),
                statement: group.statements.first().cloned().unwrap_or_default(),
                message: e.to_string(),
            })?;
        }

        self.history.record(name, &sum, depends_on, async_migration, executed_by).await?;
        info!(name, "migration applied");
        Ok(())
    }
}

/// Applies a migration statement-by-statement, recording progress in
/// `_scurry_.migrations` after every statement so a crash mid-migration can
/// be resumed exactly where it left off via [`TrackedExecutor::execute_remaining`]
/// (§4.10, "tracked mode").
pub struct TrackedExecutor<'a> {
    client: &'a Client,
    history: HistoryManager<'a>,
}

impl<'a> TrackedExecutor<'a> {
    /// Builds a tracked executor against `client`, tracking history in
    /// `history_schema`.
    #[must_use]
    pub fn new(client: &'a Client, history_schema: impl Into<String>) -> Self {
        Self { client, history: HistoryManager::new(client, history_schema) }
    }

    /// Starts tracking `name`, then executes every statement in order,
    /// marking the migration failed (without rolling back statements
    /// already applied — CockroachDB DDL is non-transactional across
    /// statement boundaries in bulk mode, so the tracked mode's contract is
    /// "resume forward", not "roll back") the moment one errors.
    pub async fn apply_migration(
        &self,
        name: &str,
        depends_on: &[String],
        async_migration: bool,
        executed_by: &str,
        statements: &[String],
    ) -> Result<()> {
        let sum = checksum(statements);
        self.history.start(name, &sum, depends_on, async_migration, executed_by).await?;
        match self.execute_remaining(name, statements, None).await {
            Ok(()) => {
                self.history.complete(name).await?;
                info!(name, "tracked migration completed");
                Ok(())
            }
            Err(e) => {
                let failed_statement = match &e {
                    MigrateError::MigrationFailed { statement, .. } => statement.as_str(),
                    _ => "",
                };
                self.history.fail(name, failed_statement, &e.to_string()).await?;
                warn!(name, error = %e, "tracked migration failed");
                Err(e)
            }
        }
    }

    /// Executes `statements`, optionally resuming after `resume_after` (the
    /// canonical text of the last statement known to have succeeded). Does
    /// not touch history; callers that need the row updated call this from
    /// [`TrackedExecutor::apply_migration`] or after an external `recover`.
    pub async fn execute_remaining(&self, name: &str, statements: &[String], resume_after: Option<&str>) -> Result<()> {
        let start_idx = match resume_after {
            None => 0,
            Some(marker) => {
                let pos = statements.iter().position(|s| s == marker);
                match pos {
                    Some(p) => p + 1,
                    None => return Err(MigrateError::StatementNotFound(marker.to_string())),
                }
            }
        };

        for stmt in &statements[start_idx..] {
            let trimmed = stmt.trim();
            if trimmed.is_empty() || trimmed.starts_with("--") {
                continue;
            }
            debug!(name, sql = %stmt, "executing tracked statement");
            self.client.execute(stmt).await.map_err(|e| MigrateError::MigrationFailed {
                name: name.to_string(),
                statement: stmt.clone(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> String {
        text.to_string()
    }

    #[test]
    fn single_chunk_with_no_transaction_markers() {
        let statements = vec![s("CREATE TABLE a (id INT8)")];
        let groups = chunk_for_execution(&statements);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].statements, vec![s("CREATE TABLE a (id INT8)")]);
        assert!(groups[0].transactional);
    }

    #[test]
    fn commit_begin_pair_splits_into_two_groups() {
        let statements = vec![
            s("ALTER TABLE a ADD COLUMN tmp INT8"),
            s("COMMIT"),
            s("BEGIN"),
            s("ALTER TABLE a DROP COLUMN old"),
        ];
        let groups = chunk_for_execution(&statements);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].statements, vec![s("ALTER TABLE a ADD COLUMN tmp INT8")]);
        assert_eq!(groups[1].statements, vec![s("ALTER TABLE a DROP COLUMN old")]);
        assert!(groups[0].transactional);
        assert!(groups[1].transactional);
    }

    #[test]
    fn lone_commit_marks_next_chunk_non_transactional_until_begin() {
        // The rewrite-requiring ALTER COLUMN TYPE sequence (§4.4.1, §8 scenario 3).
        let statements = vec![
            s("COMMIT"),
            s("BEGIN"),
            s("DROP INDEX email_idx RESTRICT"),
            s("COMMIT"),
            s("BEGIN"),
            s("COMMIT"),
            s("ALTER TABLE users ALTER COLUMN email TYPE VARCHAR(255)"),
            s("BEGIN"),
            s("COMMIT"),
            s("BEGIN"),
            s("CREATE INDEX email_idx ON users (email)"),
        ];
        let groups = chunk_for_execution(&statements);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].statements, vec![s("DROP INDEX email_idx RESTRICT")]);
        assert!(groups[0].transactional);
        assert_eq!(groups[1].statements, vec![s("ALTER TABLE users ALTER COLUMN email TYPE VARCHAR(255)")]);
        assert!(!groups[1].transactional);
        assert_eq!(groups[2].statements, vec![s("CREATE INDEX email_idx ON users (email)")]);
        assert!(groups[2].transactional);
    }

    #[test]
    fn warning_comments_are_dropped_from_groups() {
        let statements = vec![s("-- WARNING: this drops data"), s("DROP TABLE a")];
        let groups = chunk_for_execution(&statements);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].statements, vec![s("DROP TABLE a")]);
    }

    #[test]
    fn three_chunks_from_two_commit_begin_pairs() {
        let statements = vec![
            s("CREATE TABLE a (id INT8)"),
            s("COMMIT"),
            s("BEGIN"),
            s("ALTER TABLE a ADD COLUMN b INT8"),
            s("COMMIT"),
            s("BEGIN"),
            s("CREATE INDEX ON a (b)"),
        ];
        let groups = chunk_for_execution(&statements);
        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn checksum_is_stable_for_identical_input() {
        let a = vec![s("CREATE TABLE a (id INT8)")];
        let b = vec![s("CREATE TABLE a (id INT8)")];
        assert_eq!(checksum(&a), checksum(&b));
    }

    #[test]
    fn checksum_differs_for_different_input() {
        let a = vec![s("CREATE TABLE a (id INT8)")];
        let b = vec![s("CREATE TABLE b (id INT8)")];
        assert_ne!(checksum(&a), checksum(&b));
    }
}
