//! Dump Writer (§4.7): renders a [`DumpFile`] to the line-oriented text
//! format, and batches row values into multi-valued `INSERT` statements.
//!
//! Grounded on `fmguerreiro-pgmold`'s `generate_dump` (plan statements,
//! render through the printer, join with blank lines), adapted from a
//! schema-DDL-only dump to one that also carries row data.

use scurry_ast::ast::{Expr, InsertStatement, Literal, QualifiedName, Statement, UpdateStatement};
use scurry_ast::printer::canonical;
use scurry_schema::CanonicalName;

use crate::model::DumpFile;

/// The exact first line every dump must start with (§6, "Wire format of
/// dumps").
pub const HEADER_MARKER: &str = "-- scurry:data-dump";

fn qualified(name: &CanonicalName) -> QualifiedName {
    QualifiedName::qualified(name.schema.clone(), name.name.clone())
}

/// Renders a single row's text values as an `INSERT` values-row expression
/// list, quoting each non-null value as a string literal (§4.7: "Values are
/// rendered by SQL-quoting the textual form returned by the database").
/// `null_columns` forces the listed column indices to the literal `NULL`
/// regardless of the supplied value, used for the self-referential
/// first-phase insert.
fn row_to_exprs(values: &[Option<String>], null_columns: &[usize]) -> Vec<Expr> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            if null_columns.contains(&i) {
                Expr::Literal(Literal::Null)
            } else {
                match v {
                    Some(text) => Expr::string(text.clone()),
                    None => Expr::Literal(Literal::Null),
                }
            }
        })
        .collect()
}

/// Batches `rows` into `INSERT` statements of at most `batch_size` rows
/// each, rendering through [`canonical`] so the dump and the differ/executor
/// share one rendering path. Columns at `null_columns` are forced to `NULL`
/// in every row (the self-referential table's first phase).
fn batch_inserts(
    table: &CanonicalName,
    columns: &[String],
    rows: &[Vec<Option<String>>],
    null_columns: &[usize],
    batch_size: usize,
) -> Vec<String> {
    rows.chunks(batch_size.max(1))
        .map(|chunk| {
            let insert = InsertStatement {
                table: qualified(table),
                columns: columns.to_vec(),
                rows: chunk.iter().map(|row| row_to_exprs(row, null_columns)).collect(),
            };
            canonical(&Statement::Insert(insert))
        })
        .collect()
}

/// Builds the one `UPDATE` statement that fills in a self-referential row's
/// deferred columns, keyed on the table's primary-key columns (§4.7).
fn self_ref_update(
    table: &CanonicalName,
    columns: &[String],
    row: &[Option<String>],
    self_ref_indices: &[usize],
    pk_indices: &[usize],
) -> Option<Statement> {
    let assignments: Vec<(String, Expr)> = self_ref_indices
        .iter()
        .filter_map(|&i| row[i].as_ref().map(|v| (columns[i].clone(), Expr::string(v.clone()))))
        .collect();
    if assignments.is_empty() {
        return None;
    }
    let mut where_clause: Option<Expr> = None;
    for &i in pk_indices {
        let eq = Expr::column(columns[i].clone())
            .binary(scurry_ast::ast::BinaryOp::Eq, row[i].as_ref().map_or_else(Expr::null, |v| Expr::string(v.clone())));
        where_clause = Some(match where_clause {
            Some(existing) => existing.binary(scurry_ast::ast::BinaryOp::And, eq),
            None => eq,
        });
    }
    Some(Statement::Update(UpdateStatement { table: qualified(table), assignments, where_clause }))
}

/// Builds the full statement list for one table's dump (§4.7's "two-phase
/// insert"): if `self_ref_indices` is non-empty, all rows are inserted first
/// with those columns forced to `NULL`, then one `UPDATE` per row that had a
/// non-null self-ref value, keyed on `pk_indices`. Otherwise a plain batched
/// `INSERT` list.
#[must_use]
pub fn table_statements(
    table: &CanonicalName,
    columns: &[String],
    rows: &[Vec<Option<String>>],
    self_ref_indices: &[usize],
    pk_indices: &[usize],
    batch_size: usize,
) -> Vec<String> {
    if self_ref_indices.is_empty() {
        return batch_inserts(table, columns, rows, &[], batch_size);
    }
    let mut statements = batch_inserts(table, columns, rows, self_ref_indices, batch_size);
    for row in rows {
        if let Some(update) = self_ref_update(table, columns, row, self_ref_indices, pk_indices) {
            statements.push(canonical(&update));
        }
    }
    statements
}

/// Renders `dump` to the text format described in §4.7.
#[must_use]
pub fn write(dump: &DumpFile) -> String {
    let mut out = String::new();
    out.push_str(HEADER_MARKER);
    out.push('\n');
    out.push_str(&format!("-- version: {}\n", dump.version));
    out.push_str(&format!("-- created_at: {}\n", dump.created_at.to_rfc3339()));
    let tables_csv = dump.tables.iter().map(CanonicalName::key).collect::<Vec<_>>().join(",");
    out.push_str(&format!("-- tables: {tables_csv}\n"));
    out.push('\n');
    out.push_str("-- BEGIN SCHEMA\n");
    if !dump.schema_sql.trim().is_empty() {
        out.push_str(dump.schema_sql.trim_end());
        out.push('\n');
    }
    out.push_str("-- END SCHEMA\n");

    for table in &dump.table_data {
        out.push('\n');
        out.push_str(&format!("-- Table: {} ({} rows)\n", table.name.key(), table.row_count));
        if !table.statements.is_empty() {
            out.push_str(&table.statements.join("\n\n"));
            out.push('\n');
        }
    }

    for seq in &dump.sequences {
        out.push('\n');
        out.push_str(&format!("-- Sequence: {}\n", seq.name.key()));
        out.push_str(&format!("SELECT setval('{}', {});\n", seq.name.key(), seq.value));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::model::{SequenceValue, TableDump};

    fn sample_dump() -> DumpFile {
        DumpFile {
            version: 1,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            tables: vec![CanonicalName::new("public", "users")],
            schema_sql: "CREATE TABLE public.users (id INT8 NOT NULL PRIMARY KEY);".to_string(),
            table_data: vec![TableDump {
                name: CanonicalName::new("public", "users"),
                row_count: 1,
                statements: vec!["INSERT INTO public.users (id) VALUES (1)".to_string()],
            }],
            sequences: vec![SequenceValue { name: CanonicalName::new("public", "users_id_seq"), value: 2 }],
        }
    }

    #[test]
    fn header_marker_is_first_line() {
        let text = write(&sample_dump());
        assert_eq!(text.lines().next(), Some(HEADER_MARKER));
    }

    #[test]
    fn includes_schema_block_and_table_section() {
        let text = write(&sample_dump());
        assert!(text.contains("-- BEGIN SCHEMA"));
        assert!(text.contains("-- END SCHEMA"));
        assert!(text.contains("-- Table: public.users (1 rows)"));
        assert!(text.contains("-- Sequence: public.users_id_seq"));
        assert!(text.contains("SELECT setval('public.users_id_seq', 2);"));
    }

    #[test]
    fn batched_inserts_respect_batch_size() {
        let table = CanonicalName::new("public", "users");
        let rows: Vec<Vec<Option<String>>> =
            (0..5).map(|i| vec![Some(i.to_string())]).collect();
        let statements = table_statements(&table, &["id".to_string()], &rows, &[], &[], 2);
        assert_eq!(statements.len(), 3);
    }

    #[test]
    fn self_referential_table_nulls_then_updates() {
        let table = CanonicalName::new("public", "categories");
        let columns = vec!["id".to_string(), "parent_id".to_string()];
        let rows: Vec<Vec<Option<String>>> =
            vec![vec![Some("1".to_string()), None], vec![Some("2".to_string()), Some("1".to_string())]];
        let statements = table_statements(&table, &columns, &rows, &[1], &[0], 500);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("NULL"));
        assert!(statements[1].starts_with("UPDATE"));
        assert!(statements[1].contains("parent_id = '1'"));
        assert!(statements[1].contains("id = '2'"));
    }
}
