//! Dump generation (§2, §3): builds a [`DumpFile`] from a live database —
//! the opposite direction from [`crate::orchestrator::load`].
//!
//! Grounded on `fmguerreiro-pgmold`'s `generate_dump` (plan statements
//! through the schema differ/sequencer, render through one printer) for the
//! `schema_sql` half, and on [`scurry_db::introspect_live_schema`] plus the
//! FK Order Resolver for discovering what to dump and in what order.

use chrono::Utc;
use scurry_ast::ast::{CreateTableStatement, TableConstraint};
use scurry_config::Config;
use scurry_db::Client;
use scurry_diff::diff;
use scurry_schema::{CanonicalName, Schema};
use scurry_sequencer::{resolve_fk_order, sequence};
use tracing::info;

use crate::error::Result;
use crate::model::{DumpFile, SequenceValue, TableDump};
use crate::writer::table_statements;

fn primary_key_columns(table: &CreateTableStatement) -> Vec<String> {
    for constraint in &table.constraints {
        if let TableConstraint::PrimaryKey { columns, .. } = constraint {
            return columns.clone();
        }
    }
    table.columns.iter().filter(|c| c.primary_key).map(|c| c.name.clone()).collect()
}

fn column_indices(columns: &[String], names: &[String]) -> Vec<usize> {
    names.iter().filter_map(|n| columns.iter().position(|c| c == n)).collect()
}

/// Renders the DDL needed to recreate every object in `schema` from
/// nothing, as one semicolon-terminated text blob (§4.7).
fn render_schema_sql(schema: &Schema, default_schema: &str, pretty: bool) -> Result<String> {
    let diffs = diff(schema, &Schema::default(), default_schema);
    let sequenced = sequence(&diffs, default_schema, pretty)?;
    if sequenced.statements.is_empty() {
        return Ok(String::new());
    }
    Ok(format!("{};", sequenced.statements.join(";\n")))
}

async fn dump_table(client: &Client, name: &CanonicalName, table: &CreateTableStatement, self_ref_columns: &[String], batch_size: usize) -> Result<TableDump> {
    let columns: Vec<String> = table.columns.iter().map(|c| c.name.clone()).collect();
    let pk_columns = primary_key_columns(table);
    let self_ref_indices = column_indices(&columns, self_ref_columns);
    let pk_indices = column_indices(&columns, &pk_columns);

    let select_list = columns.iter().map(|c| format!("{c}::STRING AS {c}")).collect::<Vec<_>>().join(", ");
    let sql = format!("SELECT {select_list} FROM {}.{}", name.schema, name.name);
    let rows = client.fetch_text_rows(&sql).await?;
    info!(table = %name.key(), rows = rows.len(), "dumped table");

    let statements = table_statements(name, &columns, &rows, &self_ref_indices, &pk_indices, batch_size);
    Ok(TableDump { name: name.clone(), row_count: rows.len(), statements })
}

async fn dump_sequence(client: &Client, name: &CanonicalName) -> Result<SequenceValue> {
    let sql = format!("SELECT last_value::STRING AS last_value FROM {}.{}", name.schema, name.name);
    let value = client
        .fetch_one_string(&sql, "last_value")
        .await?
        .and_then(|v| v.parse().ok())
        .unwrap_or(1);
    Ok(SequenceValue { name: name.clone(), value })
}

/// Builds a complete [`DumpFile`] of every user table and sequence visible
/// to `client`, in FK-safe order.
pub async fn generate(client: &Client, config: &Config) -> Result<DumpFile> {
    let schema = scurry_db::introspect_live_schema(client, &config.history_schema).await?;
    info!(tables = schema.tables.len(), "introspected live schema for dump");

    let schema_sql = render_schema_sql(&schema, &config.default_schema, config.pretty_print)?;

    let table_asts: Vec<(CanonicalName, CreateTableStatement)> =
        schema.tables.iter().map(|o| (o.name.clone(), o.ast.clone())).collect();
    let fk_order = resolve_fk_order(&table_asts, &config.default_schema)?;

    let mut table_data = Vec::with_capacity(fk_order.order.len());
    for name in &fk_order.order {
        let table = schema.table(name).expect("FK order only lists tables present in the schema");
        let self_ref = fk_order.self_ref_columns.get(name).cloned().unwrap_or_default();
        table_data.push(dump_table(client, name, table, &self_ref, config.dump_batch_size).await?);
    }

    let mut sequences = Vec::with_capacity(schema.sequences.len());
    for seq in &schema.sequences {
        sequences.push(dump_sequence(client, &seq.name).await?);
    }

    Ok(DumpFile {
        version: crate::model::DUMP_FORMAT_VERSION,
        created_at: Utc::now(),
        tables: fk_order.order,
        schema_sql,
        table_data,
        sequences,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scurry_ast::parser::parse_statements;
    use scurry_ast::ast::Statement;

    fn table_ast(sql: &str) -> CreateTableStatement {
        match parse_statements(sql).unwrap().into_iter().next().unwrap() {
            Statement::CreateTable(t) => t,
            _ => panic!("expected CREATE TABLE"),
        }
    }

    #[test]
    fn primary_key_from_table_constraint() {
        let table = table_ast("CREATE TABLE users (id INT8, name STRING, CONSTRAINT users_pkey PRIMARY KEY (id));");
        assert_eq!(primary_key_columns(&table), vec!["id".to_string()]);
    }

    #[test]
    fn primary_key_from_column_flag() {
        let table = table_ast("CREATE TABLE users (id INT8 PRIMARY KEY, name STRING);");
        assert_eq!(primary_key_columns(&table), vec!["id".to_string()]);
    }

    #[test]
    fn column_indices_maps_names_to_positions() {
        let columns = vec!["id".to_string(), "parent_id".to_string(), "name".to_string()];
        assert_eq!(column_indices(&columns, &["parent_id".to_string()]), vec![1]);
    }

    #[test]
    fn empty_schema_renders_no_ddl() {
        let schema = Schema::default();
        let sql = render_schema_sql(&schema, "public", false).unwrap();
        assert!(sql.is_empty());
    }
}
