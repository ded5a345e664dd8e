//! Compatibility Checker (§4.8.1): compares a dump's schema against the live
//! schema it is about to be loaded into, deciding whether the load can
//! proceed at all and what it should warn about.
//!
//! Grounded on `scurry-diff`'s simple-object comparators (walk one side,
//! look the name up on the other, classify by what's missing) but with its
//! own severity model — a data load, unlike a migration, can tolerate some
//! mismatches (an extra nullable column) and must hard-fail on others (a
//! missing target column).

use scurry_schema::Schema;

/// How serious a [`CompatibilityIssue`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The load cannot proceed; the orchestrator aborts before touching data.
    Error,
    /// The load can proceed, but the condition is worth surfacing.
    Warning,
}

/// One discrepancy found between the dump's schema and the live schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityIssue {
    /// The table the issue concerns, in `schema.table` form.
    pub table: String,
    /// The column the issue concerns, if any (a table-level issue has none).
    pub column: Option<String>,
    /// How serious this issue is.
    pub severity: Severity,
    /// Human-readable description.
    pub description: String,
}

impl CompatibilityIssue {
    fn error(table: &str, column: Option<&str>, description: impl Into<String>) -> Self {
        Self { table: table.to_string(), column: column.map(str::to_string), severity: Severity::Error, description: description.into() }
    }

    fn warning(table: &str, column: Option<&str>, description: impl Into<String>) -> Self {
        Self { table: table.to_string(), column: column.map(str::to_string), severity: Severity::Warning, description: description.into() }
    }
}

/// Compares `dump_schema` (parsed from a dump's `-- BEGIN SCHEMA` block)
/// against `live_schema` (introspected from the target database), producing
/// every issue described in §4.8.1:
///
/// - a dump table missing from the live schema: error
/// - a dump column missing from the live table: error
/// - a column present on both sides with a different canonical type: warning
/// - a live column absent from the dump: ignored if computed, error if
///   `NOT NULL` with no default, warning otherwise
#[must_use]
pub fn check(dump_schema: &Schema, live_schema: &Schema) -> Vec<CompatibilityIssue> {
    let mut issues = Vec::new();
    let live_tables = live_schema.tables_by_name();

    for dump_table in &dump_schema.tables {
        let key = dump_table.name.key();
        let Some(live_table) = live_tables.get(&dump_table.name) else {
            issues.push(CompatibilityIssue::error(&key, None, format!("table `{key}` does not exist in the live schema")));
            continue;
        };

        for dump_col in &dump_table.ast.columns {
            match live_table.columns.iter().find(|c| c.name == dump_col.name) {
                None => {
                    issues.push(CompatibilityIssue::error(
                        &key,
                        Some(&dump_col.name),
                        format!("column `{}` is in the dump but missing from the live table", dump_col.name),
                    ));
                }
                Some(live_col) => {
                    if live_col.data_type.to_sql() != dump_col.data_type.to_sql() {
                        issues.push(CompatibilityIssue::warning(
                            &key,
                            Some(&dump_col.name),
                            format!(
                                "column `{}` type differs: dump has `{}`, live has `{}`",
                                dump_col.name,
                                dump_col.data_type.to_sql(),
                                live_col.data_type.to_sql()
                            ),
                        ));
                    }
                }
            }
        }

        for live_col in &live_table.columns {
            if dump_table.ast.columns.iter().any(|c| c.name == live_col.name) {
                continue;
            }
            if live_col.computed.is_some() {
                continue;
            }
            if !live_col.nullable && live_col.default.is_none() {
                issues.push(CompatibilityIssue::error(
                    &key,
                    Some(&live_col.name),
                    format!("column `{}` is NOT NULL with no default and absent from the dump", live_col.name),
                ));
            } else {
                issues.push(CompatibilityIssue::warning(
                    &key,
                    Some(&live_col.name),
                    format!("column `{}` is absent from the dump and will keep its existing/default value", live_col.name),
                ));
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use scurry_ast::parser::parse_statements;

    fn schema_of(sql: &str) -> Schema {
        Schema::from_statements(parse_statements(sql).unwrap(), "public").unwrap()
    }

    #[test]
    fn missing_live_table_is_an_error() {
        let dump = schema_of("CREATE TABLE users (id INT8 PRIMARY KEY);");
        let live = schema_of("CREATE TABLE other (id INT8 PRIMARY KEY);");
        let issues = check(&dump, &live);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Error);
    }

    #[test]
    fn missing_dump_column_on_live_is_an_error() {
        let dump = schema_of("CREATE TABLE users (id INT8 PRIMARY KEY, name STRING);");
        let live = schema_of("CREATE TABLE users (id INT8 PRIMARY KEY);");
        let issues = check(&dump, &live);
        assert!(issues.iter().any(|i| i.severity == Severity::Error && i.column.as_deref() == Some("name")));
    }

    #[test]
    fn type_mismatch_is_a_warning() {
        let dump = schema_of("CREATE TABLE users (id INT8 PRIMARY KEY, age INT8);");
        let live = schema_of("CREATE TABLE users (id INT8 PRIMARY KEY, age STRING);");
        let issues = check(&dump, &live);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn live_only_not_null_column_without_default_is_an_error() {
        let dump = schema_of("CREATE TABLE users (id INT8 PRIMARY KEY);");
        let live = schema_of("CREATE TABLE users (id INT8 PRIMARY KEY, email STRING NOT NULL);");
        let issues = check(&dump, &live);
        assert!(issues.iter().any(|i| i.severity == Severity::Error && i.column.as_deref() == Some("email")));
    }

    #[test]
    fn live_only_nullable_column_is_a_warning() {
        let dump = schema_of("CREATE TABLE users (id INT8 PRIMARY KEY);");
        let live = schema_of("CREATE TABLE users (id INT8 PRIMARY KEY, nickname STRING);");
        let issues = check(&dump, &live);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn no_issues_for_identical_schemas() {
        let dump = schema_of("CREATE TABLE users (id INT8 PRIMARY KEY);");
        let live = schema_of("CREATE TABLE users (id INT8 PRIMARY KEY);");
        assert!(check(&dump, &live).is_empty());
    }
}
