//! The Schema Differ's handling of the six object kinds that are not
//! tables (§4.4, first paragraph): Schemas, Types, Sequences, Views,
//! Routines, Triggers. Tables get their own module (`table.rs`) because
//! their modified-path is a multi-step component-level diff rather than a
//! flat add/remove/replace.

use std::collections::{HashMap, HashSet};

use scurry_ast::ast::{
    AlterTypeAction, AlterTypeStatement, CreateRoutineStatement, CreateSchemaStatement, CreateTriggerStatement,
    DropStatement, ObjectKind, QualifiedName, Statement,
};
use scurry_schema::{qualify_routine, CanonicalName, ObjectSchema, Schema};

use crate::difference::{Difference, DifferenceKind};
use crate::provides_requires::extract;

fn drop_stmt(kind: ObjectKind, name: &CanonicalName, signature: Option<String>, on_table: Option<QualifiedName>) -> Statement {
    Statement::Drop(DropStatement {
        kind,
        name: QualifiedName::qualified(name.schema.clone(), name.name.clone()),
        signature,
        on_table,
        if_exists: true,
        cascade: false,
    })
}

fn original_dependencies(stmt: &Statement, default_schema: &str) -> HashSet<String> {
    extract(stmt, default_schema).requires
}

/// Diffs `CREATE SCHEMA`s. Schemas are never "modified" — a schema has no
/// content of its own beyond its name, which is the comparison key.
pub fn diff_schemas(local: &Schema, remote: &Schema) -> Vec<Difference> {
    let local_map: HashMap<&str, &ObjectSchema<CreateSchemaStatement>> =
        local.schemas.iter().map(|o| (o.name.name.as_str(), o)).collect();
    let remote_map: HashMap<&str, &ObjectSchema<CreateSchemaStatement>> =
        remote.schemas.iter().map(|o| (o.name.name.as_str(), o)).collect();

    let mut diffs = Vec::new();
    for (name, obj) in &local_map {
        if !remote_map.contains_key(name) {
            diffs.push(Difference::new(
                DifferenceKind::Added,
                format!("schema:{name}"),
                format!("create schema {name}"),
                vec![Statement::CreateSchema(obj.ast.clone())],
            ));
        }
    }
    for (name, obj) in &remote_map {
        if !local_map.contains_key(name) {
            let stmt = drop_stmt(ObjectKind::Schema, &obj.name, None, None);
            let deps = original_dependencies(&Statement::CreateSchema(obj.ast.clone()), &obj.name.schema);
            diffs.push(
                Difference::new(
                    DifferenceKind::Removed,
                    format!("schema:{name}"),
                    format!("drop schema {name}"),
                    vec![stmt],
                )
                .with_original_dependencies(deps),
            );
        }
    }
    diffs
}

/// Diffs `CREATE TYPE ... AS ENUM` definitions. A modified type compares
/// only its enum value set: per-value `ALTER TYPE ADD/DROP VALUE` is
/// emitted, never a drop+recreate, satisfying the enum-diff-minimality
/// property (§8).
pub fn diff_types(local: &Schema, remote: &Schema, default_schema: &str) -> Vec<Difference> {
    diff_by_key(
        &local.types,
        &remote.types,
        default_schema,
        |ast| Statement::CreateType(ast.clone()),
        ObjectKind::Type,
        |local_ast, remote_ast, name| {
            let local_values: HashSet<&String> = local_ast.values.iter().collect();
            let remote_values: HashSet<&String> = remote_ast.values.iter().collect();
            let mut diffs = Vec::new();
            for value in local_ast.values.iter().filter(|v| !remote_values.contains(v)) {
                diffs.push(Difference::new(
                    DifferenceKind::Modified,
                    format!("{}.{}", name.key(), value),
                    format!("add value {value} to {name}"),
                    vec![Statement::AlterType(AlterTypeStatement {
                        name: QualifiedName::qualified(name.schema.clone(), name.name.clone()),
                        action: AlterTypeAction::AddValue { value: value.clone(), if_not_exists: true },
                    })],
                ));
            }
            for value in remote_ast.values.iter().filter(|v| !local_values.contains(v)) {
                diffs.push(Difference::new(
                    DifferenceKind::Modified,
                    format!("{}.{}", name.key(), value),
                    format!("drop value {value} from {name}"),
                    vec![Statement::AlterType(AlterTypeStatement {
                        name: QualifiedName::qualified(name.schema.clone(), name.name.clone()),
                        action: AlterTypeAction::DropValue { value: value.clone() },
                    })],
                ));
            }
            diffs
        },
    )
}

/// Diffs `CREATE SEQUENCE`s: modified sequences are drop+recreate.
pub fn diff_sequences(local: &Schema, remote: &Schema, default_schema: &str) -> Vec<Difference> {
    diff_drop_create(
        &local.sequences,
        &remote.sequences,
        default_schema,
        |ast| Statement::CreateSequence(ast.clone()),
        ObjectKind::Sequence,
        |a, b| a.increment == b.increment && a.start == b.start && a.owned_by == b.owned_by,
    )
}

/// Diffs `CREATE VIEW`s: modified views are drop+recreate (the body is
/// verbatim text, so there is no finer-grained component diff available).
pub fn diff_views(local: &Schema, remote: &Schema, default_schema: &str) -> Vec<Difference> {
    diff_drop_create(
        &local.views,
        &remote.views,
        default_schema,
        |ast| Statement::CreateView(ast.clone()),
        ObjectKind::View,
        |a, b| a.materialized == b.materialized && a.columns == b.columns && a.query == b.query,
    )
}

/// Diffs `CREATE FUNCTION`/`PROCEDURE`s, keyed by full signature so
/// overloads are distinct objects. Modified routines are drop+recreate.
pub fn diff_routines(local: &Schema, remote: &Schema, default_schema: &str) -> Vec<Difference> {
    let local_map: HashMap<CanonicalName, &ObjectSchema<CreateRoutineStatement>> =
        local.routines.iter().map(|o| (qualify_routine(&o.ast, default_schema), o)).collect();
    let remote_map: HashMap<CanonicalName, &ObjectSchema<CreateRoutineStatement>> =
        remote.routines.iter().map(|o| (qualify_routine(&o.ast, default_schema), o)).collect();

    generic_diff(
        &local_map,
        &remote_map,
        default_schema,
        |ast| Statement::CreateRoutine(ast.clone()),
        |name, ast| drop_stmt(ObjectKind::Routine, name, Some(format!("({})", ast.params.iter().map(|p| p.data_type.to_sql()).collect::<Vec<_>>().join(", "))), None),
        |a, b| {
            a.params == b.params && a.returns == b.returns && a.language == b.language && a.volatility == b.volatility && a.body == b.body
        },
    )
}

/// Diffs `CREATE TRIGGER`s: modified triggers are drop+recreate.
pub fn diff_triggers(local: &Schema, remote: &Schema, default_schema: &str) -> Vec<Difference> {
    let local_map: HashMap<CanonicalName, &ObjectSchema<CreateTriggerStatement>> =
        local.triggers.iter().map(|o| (o.name.clone(), o)).collect();
    let remote_map: HashMap<CanonicalName, &ObjectSchema<CreateTriggerStatement>> =
        remote.triggers.iter().map(|o| (o.name.clone(), o)).collect();

    generic_diff(
        &local_map,
        &remote_map,
        default_schema,
        |ast| Statement::CreateTrigger(ast.clone()),
        |name, ast| drop_stmt(ObjectKind::Trigger, name, None, Some(ast.table.clone())),
        |a, b| {
            a.timing == b.timing && a.events == b.events && a.for_each == b.for_each && a.function == b.function
        },
    )
}

/// Shared shape for the drop+recreate-on-modify object kinds.
fn diff_drop_create<T>(
    local: &[ObjectSchema<T>],
    remote: &[ObjectSchema<T>],
    default_schema: &str,
    to_stmt: impl Fn(&T) -> Statement + Copy,
    kind: ObjectKind,
    equal: impl Fn(&T, &T) -> bool,
) -> Vec<Difference> {
    let local_map: HashMap<CanonicalName, &ObjectSchema<T>> = local.iter().map(|o| (o.name.clone(), o)).collect();
    let remote_map: HashMap<CanonicalName, &ObjectSchema<T>> = remote.iter().map(|o| (o.name.clone(), o)).collect();
    generic_diff(&local_map, &remote_map, default_schema, to_stmt, move |name, _| drop_stmt(kind, name, None, None), equal)
}

/// For a simple (non-table, non-enum) object kind: add/remove/drop+recreate
/// against two pre-built `{name -> ObjectSchema}` maps.
fn generic_diff<T>(
    local_map: &HashMap<CanonicalName, &ObjectSchema<T>>,
    remote_map: &HashMap<CanonicalName, &ObjectSchema<T>>,
    default_schema: &str,
    to_stmt: impl Fn(&T) -> Statement,
    to_drop: impl Fn(&CanonicalName, &T) -> Statement,
    equal: impl Fn(&T, &T) -> bool,
) -> Vec<Difference> {
    let mut diffs = Vec::new();
    for (name, obj) in local_map {
        match remote_map.get(name) {
            None => diffs.push(Difference::new(
                DifferenceKind::Added,
                name.key(),
                format!("create {name}"),
                vec![to_stmt(&obj.ast)],
            )),
            Some(remote_obj) => {
                if !equal(&obj.ast, &remote_obj.ast) {
                    diffs.push(
                        Difference::new(
                            DifferenceKind::Modified,
                            name.key(),
                            format!("recreate {name} (definition changed)"),
                            vec![to_drop(name, &remote_obj.ast), to_stmt(&obj.ast)],
                        )
                        .drop_create()
                        .dangerous(),
                    );
                }
            }
        }
    }
    for (name, obj) in remote_map {
        if !local_map.contains_key(name) {
            let deps = original_dependencies(&to_stmt(&obj.ast), default_schema);
            diffs.push(
                Difference::new(DifferenceKind::Removed, name.key(), format!("drop {name}"), vec![to_drop(name, &obj.ast)])
                    .with_original_dependencies(deps),
            );
        }
    }
    diffs
}

// `diff_by_key` wraps `generic_diff` for object kinds whose modified-path
// needs custom handling (only enums, via `diff_types` above) rather than a
// flat drop+recreate.
fn diff_by_key<T>(
    local: &[ObjectSchema<T>],
    remote: &[ObjectSchema<T>],
    default_schema: &str,
    to_stmt: impl Fn(&T) -> Statement,
    kind: ObjectKind,
    modified: impl Fn(&T, &T, &CanonicalName) -> Vec<Difference>,
) -> Vec<Difference> {
    let local_map: HashMap<CanonicalName, &ObjectSchema<T>> = local.iter().map(|o| (o.name.clone(), o)).collect();
    let remote_map: HashMap<CanonicalName, &ObjectSchema<T>> = remote.iter().map(|o| (o.name.clone(), o)).collect();

    let mut diffs = Vec::new();
    for (name, obj) in &local_map {
        match remote_map.get(name) {
            None => diffs.push(Difference::new(
                DifferenceKind::Added,
                name.key(),
                format!("create {name}"),
                vec![to_stmt(&obj.ast)],
            )),
            Some(remote_obj) => diffs.extend(modified(&obj.ast, &remote_obj.ast, name)),
        }
    }
    for (name, obj) in &remote_map {
        if !local_map.contains_key(name) {
            let deps = original_dependencies(&to_stmt(&obj.ast), default_schema);
            diffs.push(
                Difference::new(DifferenceKind::Removed, name.key(), format!("drop {name}"), vec![drop_stmt(kind, name, None, None)])
                    .with_original_dependencies(deps),
            );
        }
    }
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
    fn added_type_emits_create() {
        let local = schema_from("CREATE TYPE status AS ENUM ('a', 'b');");
        let remote = Schema::default();
        let diffs = diff_types(&local, &remote, "public");
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].kind, DifferenceKind::Added);
    }

    #[test]
    fn single_added_enum_value_emits_exactly_one_statement() {
        let local = schema_from("CREATE TYPE status AS ENUM ('a', 'b', 'c');");
        let remote = schema_from("CREATE TYPE status AS ENUM ('a', 'b');");
        let diffs = diff_types(&local, &remote, "public");
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].migration_statements.len(), 1);
        assert!(matches!(
            &diffs[0].migration_statements[0],
            Statement::AlterType(s) if matches!(&s.action, AlterTypeAction::AddValue { value, .. } if value == "c")
        ));
    }

    #[test]
    fn modified_view_is_drop_create_and_dangerous() {
        let local = schema_from("CREATE VIEW v AS SELECT 1;");
        let remote = schema_from("CREATE VIEW v AS SELECT 2;");
        let diffs = diff_views(&local, &remote, "public");
        assert_eq!(diffs.len(), 1);
        assert!(diffs[0].is_drop_create);
        assert!(diffs[0].dangerous);
        assert_eq!(diffs[0].migration_statements.len(), 2);
    }

    #[test]
    fn removed_schema_records_empty_original_dependencies() {
        let local = Schema::default();
        let remote = schema_from("CREATE SCHEMA billing;");
        let diffs = diff_schemas(&local, &remote);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].kind, DifferenceKind::Removed);
        assert_eq!(diffs[0].original_dependencies, Some(HashSet::new()));
    }
}
