//! The `DumpFile`/`TableDump`/`SequenceValue` data model (spec §3, "Dump
//! File").

use chrono::{DateTime, Utc};
use scurry_schema::CanonicalName;

/// The dump format version this crate writes and the minimum it accepts on
/// read. Bumped only if the wire format in [`crate::writer`] changes shape.
pub const DUMP_FORMAT_VERSION: u32 = 1;

/// One table's row data, rendered as replayable statements.
///
/// For a self-referential table, `statements` begins with `INSERT`s that set
/// the self-ref columns to `NULL` and ends with per-row `UPDATE`s that fill
/// them back in, keyed on the table's primary-key columns (§4.7).
#[derive(Debug, Clone, PartialEq)]
pub struct TableDump {
    /// The table's canonical name.
    pub name: CanonicalName,
    /// Number of rows this table contributed, independent of how many
    /// statements they were batched into.
    pub row_count: usize,
    /// The rendered `INSERT`/`UPDATE` statements, in application order.
    pub statements: Vec<String>,
}

/// A sequence's current value at dump time, replayed via `setval` on load.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceValue {
    /// The sequence's canonical name.
    pub name: CanonicalName,
    /// The value `setval` should restore.
    pub value: i64,
}

/// A complete data dump: the schema DDL needed to recreate the tables, plus
/// every table's row data and every sequence's current value.
///
/// Invariant: `tables` is in FK-safe order (the order [`TableDump`]s in
/// `table_data` are also written and replayed), matching the order the FK
/// Order Resolver produced.
#[derive(Debug, Clone, PartialEq)]
pub struct DumpFile {
    /// Wire format version.
    pub version: u32,
    /// When this dump was generated.
    pub created_at: DateTime<Utc>,
    /// Every dumped table's canonical name, in FK-safe order.
    pub tables: Vec<CanonicalName>,
    /// The `CREATE ...` DDL needed to recreate every dumped object, as a
    /// single semicolon-terminated text blob (§4.7).
    pub schema_sql: String,
    /// Row data, one entry per table, in the same order as `tables`.
    pub table_data: Vec<TableDump>,
    /// Every dumped sequence's value.
    pub sequences: Vec<SequenceValue>,
}

impl DumpFile {
    /// Total rows across every table, for summary reporting.
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.table_data.iter().map(|t| t.row_count).sum()
    }
}
