//! The `Schema`/`ObjectSchema[T]` data model (spec §3).
//!
//! `ObjectSchema[T]` carries a canonical name plus the parsed AST for one
//! object. `Schema` is a container of ordered sequences of `ObjectSchema[T]`
//! per object kind; once built it is never mutated, matching "The container
//! is immutable once built."

use std::collections::HashMap;

use scurry_ast::ast::{
    CreateIndexStatement, CreateRoutineStatement, CreateSchemaStatement, CreateSequenceStatement,
    CreateTableStatement, CreateTriggerStatement, CreateTypeStatement, CreateViewStatement,
    Statement,
};

use crate::name::{qualify_object, qualify_routine, qualify_table, CanonicalName};

/// One named object together with the AST node that defines it.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSchema<T> {
    /// Canonical name, used as the comparison key everywhere else in the
    /// workspace.
    pub name: CanonicalName,
    /// The parsed `CREATE` statement for this object.
    pub ast: T,
}

impl<T> ObjectSchema<T> {
    fn new(name: CanonicalName, ast: T) -> Self {
        Self { name, ast }
    }
}

/// An immutable logical schema: every user-defined object of every kind,
/// each keyed by its canonical name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    /// `CREATE SCHEMA` statements.
    pub schemas: Vec<ObjectSchema<CreateSchemaStatement>>,
    /// `CREATE TYPE` statements.
    pub types: Vec<ObjectSchema<CreateTypeStatement>>,
    /// `CREATE SEQUENCE` statements.
    pub sequences: Vec<ObjectSchema<CreateSequenceStatement>>,
    /// `CREATE FUNCTION`/`PROCEDURE` statements, keyed by signature.
    pub routines: Vec<ObjectSchema<CreateRoutineStatement>>,
    /// `CREATE TABLE` statements.
    pub tables: Vec<ObjectSchema<CreateTableStatement>>,
    /// `CREATE VIEW` statements.
    pub views: Vec<ObjectSchema<CreateViewStatement>>,
    /// `CREATE TRIGGER` statements.
    pub triggers: Vec<ObjectSchema<CreateTriggerStatement>>,
    /// `CREATE INDEX` statements. Not one of §3's seven `ObjectSchema[T]`
    /// kinds — indexes are sub-components of a table, not a standalone
    /// comparison unit — but the differ's per-table index extraction
    /// (§4.4) needs a place to look them up by table, so standalone
    /// `CREATE INDEX` statements are kept here, keyed by
    /// `"{schema}.{table}.{index}"`.
    pub indexes: Vec<ObjectSchema<CreateIndexStatement>>,
}

impl Schema {
    /// Builds a `Schema` from a flat list of parsed statements (as loaded
    /// from one or more `.sql` files), resolving every object's canonical
    /// name against `default_schema`.
    ///
    /// Only `CREATE *` statements are accepted; anything else (`ALTER`,
    /// `DROP`, DML, transaction markers) is rejected — a desired-schema
    /// source describes the target state directly via `CREATE`s, per §6.
    pub fn from_statements(
        statements: Vec<Statement>,
        default_schema: &str,
    ) -> Result<Self, UnsupportedStatement> {
        let mut schema = Self::default();
        for stmt in statements {
            match stmt {
                Statement::CreateSchema(s) => {
                    let name = CanonicalName::new(default_schema, &s.name);
                    schema.schemas.push(ObjectSchema::new(name, s));
                }
                Statement::CreateType(s) => {
                    let name = qualify_object(&s.name, default_schema);
                    schema.types.push(ObjectSchema::new(name, s));
                }
                Statement::CreateSequence(s) => {
                    let name = qualify_object(&s.name, default_schema);
                    schema.sequences.push(ObjectSchema::new(name, s));
                }
                Statement::CreateRoutine(s) => {
                    let name = qualify_routine(&s, default_schema);
                    schema.routines.push(ObjectSchema::new(name, s));
                }
                Statement::CreateTable(s) => {
                    let name = qualify_table(&s.name, default_schema);
                    schema.tables.push(ObjectSchema::new(name, s));
                }
                Statement::CreateView(s) => {
                    let name = qualify_object(&s.name, default_schema);
                    schema.views.push(ObjectSchema::new(name, s));
                }
                Statement::CreateTrigger(s) => {
                    let on_table = qualify_table(&s.table, default_schema);
                    let name = CanonicalName::new(on_table.schema, &s.name);
                    schema.triggers.push(ObjectSchema::new(name, s));
                }
                Statement::CreateIndex(s) => {
                    let on_table = qualify_table(&s.table, default_schema);
                    let name = CanonicalName::new(on_table.schema, format!("{}.{}", on_table.name, s.name));
                    schema.indexes.push(ObjectSchema::new(name, s));
                }
                other => return Err(UnsupportedStatement(crate::canonical_kind(&other))),
            }
        }
        Ok(schema)
    }

    /// Looks up a table by its canonical name.
    #[must_use]
    pub fn table(&self, name: &CanonicalName) -> Option<&CreateTableStatement> {
        self.tables.iter().find(|o| &o.name == name).map(|o| &o.ast)
    }

    /// Every table, keyed by its canonical name, in declaration order.
    #[must_use]
    pub fn tables_by_name(&self) -> HashMap<CanonicalName, &CreateTableStatement> {
        self.tables.iter().map(|o| (o.name.clone(), &o.ast)).collect()
    }

    /// Every standalone `CREATE INDEX` defined on `table`, keyed by bare
    /// index name.
    #[must_use]
    pub fn indexes_for_table(&self, table: &CanonicalName) -> HashMap<String, &CreateIndexStatement> {
        self.indexes
            .iter()
            .filter(|o| o.name.schema == table.schema && o.name.name.starts_with(&format!("{}.", table.name)))
            .map(|o| (o.ast.name.clone(), &o.ast))
            .collect()
    }
}

/// A statement kind the desired-schema loader does not accept (§6: "any
/// non-DDL statement ... fails the load with a file-qualified error").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedStatement(pub &'static str);

impl std::fmt::Display for UnsupportedStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "statement kind `{}` is not a CREATE statement", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scurry_ast::parser::parse_statements;

    #[test]
    fn builds_schema_from_create_statements() {
        let stmts = parse_statements(
            "CREATE TABLE users (id INT8 PRIMARY KEY); CREATE TYPE status AS ENUM ('a', 'b');",
        )
        .unwrap();
        let schema = Schema::from_statements(stmts, "public").unwrap();
        assert_eq!(schema.tables.len(), 1);
        assert_eq!(schema.types.len(), 1);
        assert_eq!(schema.tables[0].name, CanonicalName::new("public", "users"));
    }

    #[test]
    fn rejects_non_create_statements() {
        let stmts = parse_statements("INSERT INTO users (id) VALUES (1)").unwrap();
        let err = Schema::from_statements(stmts, "public").unwrap_err();
        assert!(err.to_string().contains("Insert"));
    }

    #[test]
    fn trigger_is_keyed_in_its_tables_schema() {
        let stmts = parse_statements(
            "CREATE TABLE users (id INT8 PRIMARY KEY); \
             CREATE TRIGGER t BEFORE UPDATE ON users FOR EACH ROW EXECUTE FUNCTION f()",
        )
        .unwrap();
        let schema = Schema::from_statements(stmts, "public").unwrap();
        assert_eq!(schema.triggers[0].name, CanonicalName::new("public", "t"));
    }
}
