//! Provides/Requires Extractor (§4.3).
//!
//! For each statement kind, computes the set of dependency keys the
//! statement *provides* (what other statements can depend on) and the set
//! it *requires* (what must already exist). The sequencer (`scurry-sequencer`)
//! uses these to wire a dependency graph between migration nodes.
//!
//! The match below is written over every [`Statement`] variant with no
//! wildcard arm — the compiler refuses to build if a new variant is added
//! without updating this function, which is how the "fatal on unknown
//! statement kind, the extractor must refuse to guess" rule from §4.3 is
//! enforced in a closed, statically-typed AST.
//!
//! View and routine bodies are kept as verbatim text (no general SQL
//! engine, per the workspace's scope), so "body deps" for `CREATE VIEW`
//! reduce to the view's own schema requirement — there is no structured
//! tree to walk. Routine parameter/return types *are* structured AST data
//! and are walked for real dependencies.

use std::collections::HashSet;

use scurry_ast::ast::{AlterTableAction, AlterTypeAction, QualifiedName, Statement, TableConstraint};
use scurry_schema::{column_key, provider_keys, qualify, qualify_routine, qualify_table, schema_key, CanonicalName};

use crate::walker::{type_dependency, walk, walk_in_table};

/// The Provides and Requires key sets for one statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvidesRequires {
    /// Keys this statement makes available to others.
    pub provides: HashSet<String>,
    /// Keys this statement depends on already existing.
    pub requires: HashSet<String>,
}

/// Computes the Provides/Requires sets for `stmt`, resolving unqualified
/// names against `default_schema`.
#[must_use]
pub fn extract(stmt: &Statement, default_schema: &str) -> ProvidesRequires {
    match stmt {
        Statement::CreateSchema(s) => ProvidesRequires {
            provides: HashSet::from([schema_key(&s.name)]),
            requires: HashSet::new(),
        },

        Statement::CreateTable(s) => {
            let table = qualify_table(&s.name, default_schema);
            let mut provides: HashSet<String> =
                provider_keys(&table.schema, &table.name, default_schema).into_iter().collect();
            let mut requires = HashSet::from([schema_key(&table.schema)]);

            for col in &s.columns {
                provides.insert(column_key(&table, &col.name));
                if let Some(dep) = type_dependency(&col.data_type, default_schema) {
                    requires.insert(dep.key());
                }
                if let Some(default) = &col.default {
                    requires.extend(walk_in_table(default, &table.schema, &table.name, default_schema));
                }
                if let Some(computed) = &col.computed {
                    requires.extend(walk_in_table(&computed.expr, &table.schema, &table.name, default_schema));
                }
                if let Some(on_update) = &col.on_update {
                    requires.extend(walk_in_table(on_update, &table.schema, &table.name, default_schema));
                }
            }
            for constraint in &s.constraints {
                requires.extend(constraint_requires(constraint, &table, default_schema));
            }
            ProvidesRequires { provides, requires }
        }

        Statement::CreateType(s) => {
            let name = qualify(&s.name, default_schema);
            ProvidesRequires {
                provides: provider_keys(&name.schema, &name.name, default_schema).into_iter().collect(),
                requires: HashSet::from([schema_key(&name.schema)]),
            }
        }

        Statement::CreateSequence(s) => {
            let name = qualify(&s.name, default_schema);
            let mut requires = HashSet::from([schema_key(&name.schema)]);
            if let Some((owner_table, owner_col)) = &s.owned_by {
                let owner = qualify_table(owner_table, default_schema);
                requires.insert(owner.key());
                requires.insert(column_key(&owner, owner_col));
            }
            ProvidesRequires {
                provides: provider_keys(&name.schema, &name.name, default_schema).into_iter().collect(),
                requires,
            }
        }

        Statement::CreateView(s) => {
            let name = qualify(&s.name, default_schema);
            ProvidesRequires {
                provides: provider_keys(&name.schema, &name.name, default_schema).into_iter().collect(),
                requires: HashSet::from([schema_key(&name.schema)]),
            }
        }

        Statement::CreateRoutine(s) => {
            let name = qualify_routine(s, default_schema);
            let mut requires = HashSet::from([schema_key(&name.schema)]);
            for param in &s.params {
                if let Some(dep) = type_dependency(&param.data_type, default_schema) {
                    requires.insert(dep.key());
                }
            }
            if let Some(returns) = &s.returns {
                if let Some(dep) = type_dependency(returns, default_schema) {
                    requires.insert(dep.key());
                }
            }
            ProvidesRequires {
                provides: HashSet::from([name.key()]),
                requires,
            }
        }

        Statement::CreateTrigger(s) => {
            let table = qualify_table(&s.table, default_schema);
            let function = qualify(&s.function, default_schema);
            ProvidesRequires {
                provides: HashSet::from([CanonicalName::new(&table.schema, &s.name).key()]),
                requires: HashSet::from([schema_key(&table.schema), table.key(), function.key()]),
            }
        }

        Statement::CreateIndex(s) => {
            let table = qualify_table(&s.table, default_schema);
            let mut requires = HashSet::from([table.key()]);
            for col in &s.columns {
                requires.insert(column_key(&table, &col.name));
            }
            for col in &s.storing {
                requires.insert(column_key(&table, col));
            }
            if let Some(predicate) = &s.where_predicate {
                requires.extend(walk_in_table(predicate, &table.schema, &table.name, default_schema));
            }
            ProvidesRequires {
                provides: HashSet::from([CanonicalName::new(&table.schema, format!("{}.{}", table.name, s.name)).key()]),
                requires,
            }
        }

        Statement::AlterTable(s) => {
            let table = qualify_table(&s.table, default_schema);
            let mut provides = HashSet::new();
            let mut requires = HashSet::new();
            for action in &s.actions {
                alter_table_action(action, &table, default_schema, &mut provides, &mut requires);
            }
            ProvidesRequires { provides, requires }
        }

        Statement::AlterType(s) => {
            let name = qualify(&s.name, default_schema);
            match &s.action {
                AlterTypeAction::AddValue { value, .. } => ProvidesRequires {
                    provides: provider_keys(&name.schema, &format!("{}.{}", name.name, value), default_schema)
                        .into_iter()
                        .collect(),
                    requires: HashSet::from([name.key()]),
                },
                AlterTypeAction::DropValue { .. } => {
                    ProvidesRequires { provides: HashSet::new(), requires: HashSet::from([name.key()]) }
                }
            }
        }

        // §4.3: "DROP * | ∅ | ∅ (dependency reversal handled separately;
        // see §4.5)" — the differ populates `original_dependencies` on the
        // Difference itself, which the sequencer reads directly rather than
        // through this extractor.
        Statement::Drop(_) => ProvidesRequires::default(),

        // DML is replayed by the Dump/Load Engine outside of migration
        // sequencing; it carries no schema-level Provides/Requires.
        Statement::Insert(_) | Statement::Update(_) => ProvidesRequires::default(),

        // §4.3: "BEGIN/COMMIT | ∅ | ∅ (treated as transaction boundary markers)"
        Statement::Begin | Statement::Commit => ProvidesRequires::default(),
    }
}

fn constraint_requires(constraint: &TableConstraint, table: &CanonicalName, default_schema: &str) -> HashSet<String> {
    match constraint {
        TableConstraint::PrimaryKey { .. } | TableConstraint::Unique { .. } => HashSet::new(),
        TableConstraint::ForeignKey { columns, ref_table, ref_columns, .. } => {
            let target = qualify_table(ref_table, default_schema);
            let mut requires = HashSet::from([target.key()]);
            for col in ref_columns {
                requires.insert(column_key(&target, col));
            }
            for col in columns {
                requires.insert(column_key(table, col));
            }
            requires
        }
        TableConstraint::Check { expr, .. } => walk_in_table(expr, &table.schema, &table.name, default_schema),
    }
}

fn alter_table_action(
    action: &AlterTableAction,
    table: &CanonicalName,
    default_schema: &str,
    provides: &mut HashSet<String>,
    requires: &mut HashSet<String>,
) {
    match action {
        AlterTableAction::AddColumn(col) => {
            provides.insert(column_key(table, &col.name));
            if let Some(dep) = type_dependency(&col.data_type, default_schema) {
                requires.insert(dep.key());
            }
            if let Some(default) = &col.default {
                requires.extend(walk_in_table(default, &table.schema, &table.name, default_schema));
            }
            if let Some(computed) = &col.computed {
                requires.extend(walk_in_table(&computed.expr, &table.schema, &table.name, default_schema));
            }
        }
        AlterTableAction::AlterColumnType { name, data_type, using } => {
            provides.insert(column_key(table, name));
            if let Some(dep) = type_dependency(data_type, default_schema) {
                requires.insert(dep.key());
            }
            if let Some(using) = using {
                requires.extend(walk_in_table(using, &table.schema, &table.name, default_schema));
            }
        }
        AlterTableAction::AlterColumnSetDefault { name, default } => {
            provides.insert(column_key(table, name));
            requires.extend(walk_in_table(default, &table.schema, &table.name, default_schema));
        }
        AlterTableAction::AlterColumnSetNotNull { name }
        | AlterTableAction::AlterColumnDropNotNull { name }
        | AlterTableAction::AlterColumnDropDefault { name } => {
            provides.insert(column_key(table, name));
        }
        AlterTableAction::AddConstraint(constraint) => {
            requires.extend(constraint_requires(constraint, table, default_schema));
        }
        AlterTableAction::DropColumn { .. } | AlterTableAction::DropConstraint { .. } => {}
        AlterTableAction::RenameColumn { from, to } => {
            requires.insert(column_key(table, from));
            provides.insert(column_key(table, to));
        }
    }
}

/// Resolves a possibly schema-qualified name exactly like
/// [`scurry_schema::qualify`], re-exported locally for the constraint/FK
/// helpers above (`ref_table` is a bare [`QualifiedName`], not yet an
/// [`CanonicalName`]).
#[cfg(test)]
fn q(name: &str) -> QualifiedName {
    QualifiedName::bare(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scurry_ast::parser::parse_statement;

    #[test]
    fn create_table_provides_table_and_column_keys() {
        let stmt = parse_statement("CREATE TABLE users (id INT8 PRIMARY KEY, name STRING)").unwrap();
        let pr = extract(&stmt, "public");
        assert!(pr.provides.contains("public.users"));
        assert!(pr.provides.contains("users"));
        assert!(pr.provides.contains("public.users.id"));
        assert!(pr.provides.contains("public.users.name"));
        assert!(pr.requires.contains("schema:public"));
    }

    #[test]
    fn foreign_key_constraint_requires_target_table_and_columns() {
        let stmt = parse_statement(
            "CREATE TABLE orders (id INT8 PRIMARY KEY, user_id INT8, \
             CONSTRAINT fk_user FOREIGN KEY (user_id) REFERENCES users(id))",
        )
        .unwrap();
        let pr = extract(&stmt, "public");
        assert!(pr.requires.contains("public.users"));
        assert!(pr.requires.contains("public.users.id"));
        assert!(pr.requires.contains("public.orders.user_id"));
    }

    #[test]
    fn computed_column_requires_sibling_column() {
        use scurry_ast::ast::{ColumnDef, DataType};
        let stmt = Statement::CreateTable(scurry_ast::ast::CreateTableStatement {
            name: q("inventory"),
            if_not_exists: false,
            columns: vec![
                ColumnDef::new("committed", DataType::Integer),
                ColumnDef::new("available", DataType::Integer)
                    .computed(scurry_ast::ast::Expr::column("committed"), true),
            ],
            constraints: vec![],
        });
        let pr = extract(&stmt, "public");
        assert!(pr.requires.contains("public.inventory.committed"));
    }

    #[test]
    fn drop_and_transaction_markers_are_empty() {
        assert_eq!(extract(&Statement::Begin, "public"), ProvidesRequires::default());
        assert_eq!(extract(&Statement::Commit, "public"), ProvidesRequires::default());
    }

    #[test]
    fn alter_type_add_value_requires_the_type() {
        let stmt = parse_statement("ALTER TYPE status ADD VALUE 'archived'").unwrap();
        let pr = extract(&stmt, "public");
        assert!(pr.requires.contains("public.status"));
        assert!(pr.provides.contains("public.status.archived"));
    }
}
