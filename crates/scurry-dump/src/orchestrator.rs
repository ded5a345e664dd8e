//! Load Orchestrator (§4.8): replays a [`DumpFile`] into a live database.

use scurry_ast::ast::CreateTableStatement;
use scurry_ast::parser::parse_statements;
use scurry_config::Config;
use scurry_db::{chunk_for_execution, introspect_live_schema, Client};
use scurry_diff::diff;
use scurry_schema::{CanonicalName, Schema};
use scurry_sequencer::{resolve_fk_order, sequence};
use tracing::{info, warn};

use crate::compat::{self, CompatibilityIssue, Severity};
use crate::error::{DumpError, Result};
use crate::model::DumpFile;

/// Options controlling how a dump is replayed (§4.8).
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// If set, the dump's embedded schema is diffed against nothing and
    /// applied as DDL rather than compared against an existing live schema.
    pub create_schema: bool,
    /// If set, `TRUNCATE ... CASCADE` is run on every dumped table (in
    /// reverse FK order) before any row is inserted.
    pub truncate_first: bool,
    /// If set, every step up to and including the compatibility check runs,
    /// but no DDL, row, or sequence statement is actually executed.
    pub dry_run: bool,
}

impl LoadOptions {
    /// Enables `create_schema`.
    #[must_use]
    pub const fn create_schema(mut self, enabled: bool) -> Self {
        self.create_schema = enabled;
        self
    }

    /// Enables `truncate_first`.
    #[must_use]
    pub const fn truncate_first(mut self, enabled: bool) -> Self {
        self.truncate_first = enabled;
        self
    }

    /// Enables `dry_run`.
    #[must_use]
    pub const fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }
}

/// What a [`load`] call actually did (or, under `dry_run`, would have done).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Number of tables loaded.
    pub tables_loaded: usize,
    /// Total rows inserted across every table.
    pub rows_inserted: usize,
    /// Warning-severity compatibility issues found, if the schema was
    /// compared against a live one rather than freshly created.
    pub warnings: Vec<CompatibilityIssue>,
}

fn parse_dump_schema(schema_sql: &str, default_schema: &str) -> Result<Schema> {
    if schema_sql.trim().is_empty() {
        return Ok(Schema::default());
    }
    let statements = parse_statements(schema_sql)?;
    Ok(Schema::from_statements(statements, default_schema)?)
}

async fn apply_create_schema(client: &Client, dump_schema: &Schema, default_schema: &str) -> Result<()> {
    let diffs = diff(dump_schema, &Schema::default(), default_schema);
    let sequenced = sequence(&diffs, default_schema, false)?;
    for group in chunk_for_execution(&sequenced.statements) {
        client.execute_joined_in_transaction(&group.statements).await?;
    }
    Ok(())
}

fn not_null_self_ref_columns<'a>(table: &'a CreateTableStatement, self_ref_columns: &'a [String]) -> Vec<&'a str> {
    self_ref_columns
        .iter()
        .filter(|name| table.columns.iter().any(|c| &c.name == *name && !c.nullable))
        .map(String::as_str)
        .collect()
}

async fn load_table_rows(
    client: &Client,
    name: &CanonicalName,
    table: &CreateTableStatement,
    self_ref_columns: &[String],
    statements: &[String],
) -> Result<()> {
    let qualified = format!("{}.{}", name.schema, name.name);
    let toggled = not_null_self_ref_columns(table, self_ref_columns);

    for column in &toggled {
        client.execute(&format!("ALTER TABLE {qualified} ALTER COLUMN {column} DROP NOT NULL")).await?;
    }

    client.execute_joined_in_transaction(statements).await?;

    for column in &toggled {
        client.execute(&format!("ALTER TABLE {qualified} ALTER COLUMN {column} SET NOT NULL")).await?;
    }

    Ok(())
}

/// Replays `dump` into the database `client` is connected to, per `options`.
pub async fn load(client: &Client, config: &Config, dump: &DumpFile, options: &LoadOptions) -> Result<LoadSummary> {
    let dump_schema = parse_dump_schema(&dump.schema_sql, &config.default_schema)?;

    let mut warnings = Vec::new();
    if options.create_schema {
        info!("applying dump schema as fresh DDL");
        if !options.dry_run {
            apply_create_schema(client, &dump_schema, &config.default_schema).await?;
        }
    } else {
        let live_schema = introspect_live_schema(client, &config.history_schema).await?;
        let issues = compat::check(&dump_schema, &live_schema);
        let (errors, rest): (Vec<_>, Vec<_>) = issues.into_iter().partition(|i| i.severity == Severity::Error);
        if !errors.is_empty() {
            return Err(DumpError::Compatibility(errors));
        }
        for issue in &rest {
            warn!(table = %issue.table, column = ?issue.column, "{}", issue.description);
        }
        warnings = rest;
    }

    if options.dry_run {
        return Ok(LoadSummary { tables_loaded: dump.table_data.len(), rows_inserted: dump.total_rows(), warnings });
    }

    let table_asts: Vec<(CanonicalName, CreateTableStatement)> =
        dump_schema.tables.iter().map(|o| (o.name.clone(), o.ast.clone())).collect();
    let fk_order = resolve_fk_order(&table_asts, &config.default_schema)?;

    if options.truncate_first {
        for name in dump.tables.iter().rev() {
            client.execute(&format!("TRUNCATE TABLE {}.{} CASCADE", name.schema, name.name)).await?;
        }
    }

    let mut rows_inserted = 0;
    for table_dump in &dump.table_data {
        let table_ast = dump_schema
            .table(&table_dump.name)
            .ok_or_else(|| DumpError::Inconsistent(format!("table `{}` has row data but no schema declaration", table_dump.name.key())))?;
        let self_ref = fk_order.self_ref_columns.get(&table_dump.name).cloned().unwrap_or_default();
        load_table_rows(client, &table_dump.name, table_ast, &self_ref, &table_dump.statements).await?;
        rows_inserted += table_dump.row_count;
        info!(table = %table_dump.name.key(), rows = table_dump.row_count, "loaded table");
    }

    for seq in &dump.sequences {
        let sql = format!("SELECT setval('{}', {})", seq.name.key(), seq.value);
        client.execute(&sql).await?;
    }

    Ok(LoadSummary { tables_loaded: dump.table_data.len(), rows_inserted, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scurry_ast::ast::ColumnDef;
    use scurry_ast::ast::{CreateTableStatement, QualifiedName};

    fn table(name: &str, columns: Vec<ColumnDef>) -> CreateTableStatement {
        CreateTableStatement { name: QualifiedName::bare(name), if_not_exists: false, columns, constraints: vec![] }
    }

    #[test]
    fn not_null_self_ref_columns_filters_nullable() {
        let t = table(
            "categories",
            vec![
                ColumnDef::new("id", scurry_ast::ast::DataType::Bigint).primary_key(),
                ColumnDef::new("parent_id", scurry_ast::ast::DataType::Bigint).not_null(),
            ],
        );
        let cols = not_null_self_ref_columns(&t, &["parent_id".to_string()]);
        assert_eq!(cols, vec!["parent_id"]);
    }

    #[test]
    fn nullable_self_ref_column_is_not_toggled() {
        let t = table(
            "categories",
            vec![ColumnDef::new("id", scurry_ast::ast::DataType::Bigint).primary_key(), ColumnDef::new("parent_id", scurry_ast::ast::DataType::Bigint)],
        );
        let cols = not_null_self_ref_columns(&t, &["parent_id".to_string()]);
        assert!(cols.is_empty());
    }

    #[test]
    fn empty_schema_sql_parses_to_empty_schema() {
        let schema = parse_dump_schema("", "public").unwrap();
        assert!(schema.tables.is_empty());
    }
}
