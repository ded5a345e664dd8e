//! Expression Dependency Walker, Provides/Requires Extractor, and the
//! per-object-kind Schema Differ (§4.2, §4.3, §4.4).
//!
//! The only entry point most callers need is [`diff`], which runs every
//! per-kind differ over a pair of [`Schema`]s and concatenates the results
//! in the fixed kind order schemas, types, sequences, views, routines,
//! triggers, tables — sequencing happens downstream, so the order here is
//! only for deterministic log/report output.

pub mod difference;
mod error;
mod provides_requires;
mod simple;
mod table;
mod walker;

pub use difference::{Difference, DifferenceKind};
pub use error::{DiffError, Result};
pub use provides_requires::{extract, ProvidesRequires};
pub use walker::{type_dependency, walk, walk_in_table};

use scurry_schema::Schema;

/// Diffs every object kind between `local` (the desired schema) and
/// `remote` (the live schema), returning every [`Difference`] needed to
/// bring `remote` to `local`.
#[must_use]
pub fn diff(local: &Schema, remote: &Schema, default_schema: &str) -> Vec<Difference> {
    let mut diffs = Vec::new();
    diffs.extend(simple::diff_schemas(local, remote));
    diffs.extend(simple::diff_types(local, remote, default_schema));
    diffs.extend(simple::diff_sequences(local, remote, default_schema));
    diffs.extend(simple::diff_views(local, remote, default_schema));
    diffs.extend(simple::diff_routines(local, remote, default_schema));
    diffs.extend(simple::diff_triggers(local, remote, default_schema));
    diffs.extend(table::diff_tables(local, remote, default_schema));
    diffs
}

#[cfg(test)]
mod tests {
    use super::*;
    use scurry_ast::parser::parse_statements;

    fn schema_from(sql: &str) -> Schema {
        Schema::from_statements(parse_statements(sql).unwrap(), "public").unwrap()
    }

    #[test]
    fn diff_concatenates_every_kind() {
        let local = schema_from(
            "CREATE SCHEMA billing; \
             CREATE TYPE status AS ENUM ('a', 'b'); \
             CREATE TABLE users (id INT8 PRIMARY KEY);",
        );
        let remote = Schema::default();
        let diffs = diff(&local, &remote, "public");
        assert_eq!(diffs.len(), 3);
    }
}
