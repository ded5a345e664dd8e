//! Client abstraction, database introspection, History Manager, and
//! Executor (§4.9, §4.10, §6) for talking to a live CockroachDB cluster.
//!
//! Built on `sqlx`'s Postgres driver, since CockroachDB speaks the
//! PostgreSQL wire protocol, the same way the teacher built its executor
//! and migration history on `sqlx`'s SQLite driver. This crate owns every
//! point the rest of the workspace actually touches the network; `scurry-ast`,
//! `scurry-schema`, `scurry-diff`, and `scurry-sequencer` never do.

mod client;
mod error;
pub mod executor;
pub mod history;
pub mod introspect;

pub use client::{Client, ShadowDatabase};
pub use error::{MigrateError, Result};
pub use executor::{chunk_for_execution, DdlExecutor, ExecutionGroup, TrackedExecutor};
pub use history::{AppliedMigration, CheckpointCache, HistoryManager, MigrationStatus};
pub use introspect::introspect_live_schema;
