//! The Schema Differ's table modified-path (§4.4 "Tables", §4.4.1, §4.4.2).
//!
//! Tables are the one object kind with a component-level diff: columns,
//! indexes, and constraints are extracted and compared independently
//! rather than the table being treated as a monolithic drop+recreate unit.

use std::collections::{HashMap, HashSet};

use scurry_ast::ast::{
    AlterTableAction, AlterTableStatement, ColumnDef, CreateIndexStatement, CreateTableStatement, DropStatement,
    Expr, IndexColumn, ObjectKind, OrderDirection, QualifiedName, Statement, TableConstraint,
};
use scurry_schema::{column_key, qualify_table, CanonicalName, ObjectSchema, Schema};

use crate::difference::{Difference, DifferenceKind};
use crate::provides_requires::extract;
use crate::walker::walk_in_table;

/// Diffs every table present in either schema.
pub fn diff_tables(local: &Schema, remote: &Schema, default_schema: &str) -> Vec<Difference> {
    let local_map: HashMap<CanonicalName, &ObjectSchema<CreateTableStatement>> =
        local.tables.iter().map(|o| (o.name.clone(), o)).collect();
    let remote_map: HashMap<CanonicalName, &ObjectSchema<CreateTableStatement>> =
        remote.tables.iter().map(|o| (o.name.clone(), o)).collect();

    let mut diffs = Vec::new();
    for (name, obj) in &local_map {
        match remote_map.get(name) {
            None => diffs.push(Difference::new(
                DifferenceKind::Added,
                name.key(),
                format!("create table {name}"),
                vec![Statement::CreateTable(obj.ast.clone())],
            )),
            Some(remote_obj) => {
                if obj.ast != remote_obj.ast {
                    diffs.extend(diff_modified_table(name, &obj.ast, &remote_obj.ast, local, remote, default_schema));
                }
            }
        }
    }
    for (name, obj) in &remote_map {
        if !local_map.contains_key(name) {
            let deps = extract(&Statement::CreateTable(obj.ast.clone()), default_schema).requires;
            diffs.push(
                Difference::new(
                    DifferenceKind::Removed,
                    name.key(),
                    format!("drop table {name}"),
                    vec![drop_table_stmt(name)],
                )
                .with_original_dependencies(deps),
            );
        }
    }
    diffs
}

fn drop_table_stmt(name: &CanonicalName) -> Statement {
    Statement::Drop(DropStatement {
        kind: ObjectKind::Table,
        name: QualifiedName::qualified(name.schema.clone(), name.name.clone()),
        signature: None,
        on_table: None,
        if_exists: true,
        cascade: false,
    })
}

fn drop_index_stmt(table: &CanonicalName, index_name: &str, cascade: bool) -> Statement {
    Statement::Drop(DropStatement {
        kind: ObjectKind::Index,
        name: QualifiedName::qualified(table.schema.clone(), index_name.to_string()),
        signature: None,
        on_table: Some(QualifiedName::qualified(table.schema.clone(), table.name.clone())),
        if_exists: true,
        cascade,
    })
}

fn columns_by_name(ast: &CreateTableStatement) -> HashMap<String, &ColumnDef> {
    ast.columns.iter().map(|c| (c.name.to_lowercase(), c)).collect()
}

fn pk_of(ast: &CreateTableStatement) -> Option<(&Option<String>, &Vec<String>)> {
    ast.constraints.iter().find_map(|c| match c {
        TableConstraint::PrimaryKey { name, columns } => Some((name, columns)),
        _ => None,
    })
}

fn unique_constraints(ast: &CreateTableStatement) -> Vec<&TableConstraint> {
    ast.constraints.iter().filter(|c| matches!(c, TableConstraint::Unique { .. })).collect()
}

fn fk_constraints(ast: &CreateTableStatement) -> Vec<&TableConstraint> {
    ast.constraints.iter().filter(|c| matches!(c, TableConstraint::ForeignKey { .. })).collect()
}

fn check_constraints(ast: &CreateTableStatement) -> Vec<&TableConstraint> {
    ast.constraints.iter().filter(|c| matches!(c, TableConstraint::Check { .. })).collect()
}

fn unique_index_name(table: &str, columns: &[String], explicit: Option<&str>) -> String {
    explicit.map_or_else(|| format!("{table}_{}_key", columns.join("_")), str::to_string)
}

fn unique_as_index(table: &CanonicalName, name: &str, columns: &[String]) -> CreateIndexStatement {
    CreateIndexStatement {
        name: name.to_string(),
        table: QualifiedName::qualified(table.schema.clone(), table.name.clone()),
        unique: true,
        if_not_exists: false,
        concurrently: false,
        columns: columns
            .iter()
            .map(|c| IndexColumn { name: c.clone(), direction: OrderDirection::Asc })
            .collect(),
        storing: vec![],
        where_predicate: None,
    }
}

fn index_references_column(idx: &CreateIndexStatement, table: &CanonicalName, col: &str, default_schema: &str) -> bool {
    idx.columns.iter().any(|c| c.name.eq_ignore_ascii_case(col))
        || idx.storing.iter().any(|c| c.eq_ignore_ascii_case(col))
        || idx
            .where_predicate
            .as_ref()
            .is_some_and(|p| walk_in_table(p, &table.schema, &table.name, default_schema).contains(&column_key(table, col)))
}

fn index_shape_eq(a: &CreateIndexStatement, b: &CreateIndexStatement) -> bool {
    a.unique == b.unique && a.columns == b.columns && a.storing == b.storing && a.where_predicate == b.where_predicate
}

/// A column whose type change requires an on-disk rewrite (§4.4.1).
fn rewrite_required_columns<'a>(
    local_cols: &HashMap<String, &'a ColumnDef>,
    remote_cols: &HashMap<String, &'a ColumnDef>,
) -> Vec<String> {
    let mut names: Vec<String> = local_cols
        .iter()
        .filter_map(|(name, local_col)| {
            let remote_col = remote_cols.get(name)?;
            if local_col.data_type == remote_col.data_type {
                return None;
            }
            let rewrite = local_col.data_type.family() != remote_col.data_type.family()
                || !remote_col.data_type.widens_to(&local_col.data_type);
            rewrite.then(|| name.clone())
        })
        .collect();
    names.sort();
    names
}

#[allow(clippy::too_many_lines)]
fn diff_modified_table(
    table: &CanonicalName,
    local_ast: &CreateTableStatement,
    remote_ast: &CreateTableStatement,
    local_schema: &Schema,
    remote_schema: &Schema,
    default_schema: &str,
) -> Vec<Difference> {
    let mut local_cols = columns_by_name(local_ast);
    let mut remote_cols = columns_by_name(remote_ast);
    let mut local_indexes = local_schema.indexes_for_table(table);
    let mut remote_indexes = remote_schema.indexes_for_table(table);
    let mut diffs = Vec::new();

    // Step 1 (§4.4.1): rewrite-requiring type changes, handled first so the
    // remaining steps never see the affected columns/indexes again.
    let rewritten = rewrite_required_columns(&local_cols, &remote_cols);
    if !rewritten.is_empty() {
        diffs.push(build_rewrite_difference(table, &rewritten, &local_cols, &remote_cols, &local_indexes, &remote_indexes, default_schema));
        for col in &rewritten {
            local_cols.remove(col);
            remote_cols.remove(col);
        }
        local_indexes.retain(|_, idx| !rewritten.iter().any(|c| index_references_column(idx, table, c, default_schema)));
        remote_indexes.retain(|_, idx| !rewritten.iter().any(|c| index_references_column(idx, table, c, default_schema)));
    }

    // Step 2: column diffs for the remainder.
    let mut dropped_columns: HashSet<String> = HashSet::new();
    let mut column_names: Vec<&String> = local_cols.keys().chain(remote_cols.keys()).collect();
    column_names.sort();
    column_names.dedup();
    for name in column_names {
        match (local_cols.get(name), remote_cols.get(name)) {
            (Some(local_col), None) => {
                let mut diff = Difference::new(
                    DifferenceKind::Added,
                    column_key(table, name),
                    format!("add column {name} to {table}"),
                    vec![Statement::AlterTable(AlterTableStatement {
                        table: QualifiedName::qualified(table.schema.clone(), table.name.clone()),
                        actions: vec![AlterTableAction::AddColumn((*local_col).clone())],
                    })],
                );
                if !local_col.nullable && local_col.default.is_none() {
                    diff = diff.warn(format!(
                        "column {name} on {table} is NOT NULL with no default; existing rows will fail unless the table is empty"
                    ));
                }
                diffs.push(diff);
            }
            (None, Some(_)) => {
                dropped_columns.insert(name.clone());
                diffs.push(Difference::new(
                    DifferenceKind::Removed,
                    column_key(table, name),
                    format!("drop column {name} from {table}"),
                    vec![Statement::AlterTable(AlterTableStatement {
                        table: QualifiedName::qualified(table.schema.clone(), table.name.clone()),
                        actions: vec![AlterTableAction::DropColumn { name: name.clone(), restrict: true }],
                    })],
                ));
            }
            (Some(local_col), Some(remote_col)) => {
                diffs.extend(diff_column(table, name, local_col, remote_col));
            }
            (None, None) => unreachable!("name drawn from the union of both column maps"),
        }
    }

    // §4.4.2: suppress DROP INDEX for indexes referencing a dropped column.
    remote_indexes.retain(|_, idx| !dropped_columns.iter().any(|c| index_references_column(idx, table, c, default_schema)));

    // Step 3: index diffs.
    let mut index_names: Vec<&String> = local_indexes.keys().chain(remote_indexes.keys()).collect();
    index_names.sort();
    index_names.dedup();
    for name in index_names {
        match (local_indexes.get(name), remote_indexes.get(name)) {
            (Some(local_idx), None) => diffs.push(Difference::new(
                DifferenceKind::Added,
                format!("{}.{name}", table.key()),
                format!("create index {name} on {table}"),
                vec![Statement::CreateIndex((*local_idx).clone())],
            )),
            (None, Some(_)) => diffs.push(
                Difference::new(
                    DifferenceKind::Removed,
                    format!("{}.{name}", table.key()),
                    format!("drop index {name} on {table}"),
                    vec![drop_index_stmt(table, name, false)],
                )
                .dangerous(),
            ),
            (Some(local_idx), Some(remote_idx)) => {
                if !index_shape_eq(local_idx, remote_idx) {
                    diffs.push(
                        Difference::new(
                            DifferenceKind::Modified,
                            format!("{}.{name}", table.key()),
                            format!("recreate index {name} on {table} (definition changed)"),
                            vec![
                                drop_index_stmt(table, name, false),
                                Statement::Commit,
                                Statement::Begin,
                                Statement::CreateIndex((*local_idx).clone()),
                            ],
                        )
                        .drop_create()
                        .dangerous(),
                    );
                }
            }
            (None, None) => unreachable!("name drawn from the union of both index maps"),
        }
    }

    // Step 4: constraint diffs (PK, non-PK unique-as-index, FK, CHECK).
    diffs.extend(diff_primary_key(table, local_ast, remote_ast));
    diffs.extend(diff_unique_constraints(table, local_ast, remote_ast));
    diffs.extend(diff_foreign_keys(table, local_ast, remote_ast, default_schema));
    diffs.extend(diff_check_constraints(table, local_ast, remote_ast));

    diffs
}

fn diff_column(table: &CanonicalName, name: &str, local: &ColumnDef, remote: &ColumnDef) -> Vec<Difference> {
    if local.computed.is_some() != remote.computed.is_some()
        || (local.computed.is_some() && local.computed != remote.computed)
    {
        // §4.4 step 2: "If computed-ness changes, emit a drop-and-re-add of
        // the whole column (marked dangerous)."
        return vec![Difference::new(
            DifferenceKind::Modified,
            column_key(table, name),
            format!("recompute column {name} on {table} (computed-ness changed)"),
            vec![Statement::AlterTable(AlterTableStatement {
                table: QualifiedName::qualified(table.schema.clone(), table.name.clone()),
                actions: vec![
                    AlterTableAction::DropColumn { name: name.to_string(), restrict: true },
                    AlterTableAction::AddColumn(local.clone()),
                ],
            })],
        )
        .drop_create()
        .dangerous()];
    }

    let mut actions = Vec::new();
    if local.data_type != remote.data_type {
        actions.push(AlterTableAction::AlterColumnType { name: name.to_string(), data_type: local.data_type.clone(), using: None });
    }
    if local.nullable != remote.nullable {
        actions.push(if local.nullable {
            AlterTableAction::AlterColumnDropNotNull { name: name.to_string() }
        } else {
            AlterTableAction::AlterColumnSetNotNull { name: name.to_string() }
        });
    }
    if local.default != remote.default {
        actions.push(match &local.default {
            Some(expr) => AlterTableAction::AlterColumnSetDefault { name: name.to_string(), default: expr.clone() },
            None => AlterTableAction::AlterColumnDropDefault { name: name.to_string() },
        });
    }

    if actions.is_empty() {
        return Vec::new();
    }
    vec![Difference::new(
        DifferenceKind::Modified,
        column_key(table, name),
        format!("alter column {name} on {table}"),
        vec![Statement::AlterTable(AlterTableStatement {
            table: QualifiedName::qualified(table.schema.clone(), table.name.clone()),
            actions,
        })],
    )]
}

fn diff_primary_key(table: &CanonicalName, local_ast: &CreateTableStatement, remote_ast: &CreateTableStatement) -> Vec<Difference> {
    let local_pk = pk_of(local_ast);
    let remote_pk = pk_of(remote_ast);
    let (Some((local_name, local_cols)), Some((remote_name, remote_cols))) = (local_pk, remote_pk) else {
        return Vec::new();
    };
    if local_cols == remote_cols {
        return Vec::new();
    }
    let pk_name = remote_name
        .clone()
        .or_else(|| local_name.clone())
        .unwrap_or_else(|| format!("{}_pkey", table.name));

    vec![Difference::new(
        DifferenceKind::Modified,
        format!("{}.{pk_name}", table.key()),
        format!("change primary key of {table}"),
        vec![
            Statement::Commit,
            Statement::Begin,
            Statement::AlterTable(AlterTableStatement {
                table: QualifiedName::qualified(table.schema.clone(), table.name.clone()),
                actions: vec![
                    AlterTableAction::DropConstraint { name: pk_name.clone() },
                    AlterTableAction::AddConstraint(TableConstraint::PrimaryKey {
                        name: Some(pk_name),
                        columns: local_cols.clone(),
                    }),
                ],
            }),
            Statement::Commit,
            Statement::Begin,
        ],
    )
    .dangerous()]
}

fn diff_unique_constraints(table: &CanonicalName, local_ast: &CreateTableStatement, remote_ast: &CreateTableStatement) -> Vec<Difference> {
    let keyed = |constraints: Vec<&TableConstraint>| -> HashMap<String, Vec<String>> {
        constraints
            .into_iter()
            .filter_map(|c| match c {
                TableConstraint::Unique { name, columns } => {
                    Some((unique_index_name(&table.name, columns, name.as_deref()), columns.clone()))
                }
                _ => None,
            })
            .collect()
    };
    let local = keyed(unique_constraints(local_ast));
    let remote = keyed(unique_constraints(remote_ast));

    let mut diffs = Vec::new();
    let mut names: Vec<&String> = local.keys().chain(remote.keys()).collect();
    names.sort();
    names.dedup();
    for name in names {
        match (local.get(name), remote.get(name)) {
            (Some(cols), None) => diffs.push(Difference::new(
                DifferenceKind::Added,
                format!("{}.{name}", table.key()),
                format!("add unique constraint {name} on {table}"),
                vec![Statement::CreateIndex(unique_as_index(table, name, cols))],
            )),
            (None, Some(_)) => diffs.push(
                Difference::new(
                    DifferenceKind::Removed,
                    format!("{}.{name}", table.key()),
                    format!("drop unique constraint {name} on {table}"),
                    vec![drop_index_stmt(table, name, true)],
                )
                .dangerous(),
            ),
            (Some(cols), Some(remote_cols)) => {
                if cols != remote_cols {
                    diffs.push(
                        Difference::new(
                            DifferenceKind::Modified,
                            format!("{}.{name}", table.key()),
                            format!("recreate unique constraint {name} on {table} (columns changed)"),
                            vec![
                                drop_index_stmt(table, name, true),
                                Statement::Commit,
                                Statement::Begin,
                                Statement::CreateIndex(unique_as_index(table, name, cols)),
                            ],
                        )
                        .drop_create()
                        .dangerous(),
                    );
                }
            }
            (None, None) => unreachable!("name drawn from the union of both constraint maps"),
        }
    }
    diffs
}

fn diff_foreign_keys(table: &CanonicalName, local_ast: &CreateTableStatement, remote_ast: &CreateTableStatement, default_schema: &str) -> Vec<Difference> {
    let keyed = |constraints: Vec<&TableConstraint>| -> HashMap<String, &TableConstraint> {
        constraints
            .into_iter()
            .map(|c| {
                let TableConstraint::ForeignKey { name, columns, .. } = c else { unreachable!() };
                (name.clone().unwrap_or_else(|| format!("{}_{}_fkey", table.name, columns.join("_"))), c)
            })
            .collect()
    };
    let local = keyed(fk_constraints(local_ast));
    let remote = keyed(fk_constraints(remote_ast));

    let mut diffs = Vec::new();
    let mut names: Vec<&String> = local.keys().chain(remote.keys()).collect();
    names.sort();
    names.dedup();
    for name in names {
        match (local.get(name), remote.get(name)) {
            (Some(c), None) => diffs.push(Difference::new(
                DifferenceKind::Added,
                format!("{}.{name}", table.key()),
                format!("add foreign key {name} on {table}"),
                vec![alter_add_constraint(table, (*c).clone())],
            )),
            (None, Some(c)) => diffs.push(
                Difference::new(
                    DifferenceKind::Removed,
                    format!("{}.{name}", table.key()),
                    format!("drop foreign key {name} on {table}"),
                    vec![alter_drop_constraint(table, name)],
                )
                .with_original_dependencies(fk_dependencies(c, default_schema)),
            ),
            (Some(local_c), Some(remote_c)) => {
                if local_c != remote_c {
                    diffs.push(Difference::new(
                        DifferenceKind::Modified,
                        format!("{}.{name}", table.key()),
                        format!("recreate foreign key {name} on {table} (definition changed)"),
                        vec![alter_drop_constraint(table, name), alter_add_constraint(table, (*local_c).clone())],
                    ));
                }
            }
            (None, None) => unreachable!("name drawn from the union of both constraint maps"),
        }
    }
    diffs
}

fn fk_dependencies(constraint: &TableConstraint, default_schema: &str) -> HashSet<String> {
    let TableConstraint::ForeignKey { ref_table, ref_columns, .. } = constraint else { return HashSet::new() };
    let target = qualify_table(ref_table, default_schema);
    let mut deps = HashSet::from([target.key()]);
    for col in ref_columns {
        deps.insert(column_key(&target, col));
    }
    deps
}

fn diff_check_constraints(table: &CanonicalName, local_ast: &CreateTableStatement, remote_ast: &CreateTableStatement) -> Vec<Difference> {
    let keyed = |constraints: Vec<&TableConstraint>| -> HashMap<String, &Expr> {
        constraints
            .into_iter()
            .enumerate()
            .map(|(i, c)| {
                let TableConstraint::Check { name, expr } = c else { unreachable!() };
                (name.clone().unwrap_or_else(|| format!("{}_check_{i}", table.name)), expr)
            })
            .collect()
    };
    let local = keyed(check_constraints(local_ast));
    let remote = keyed(check_constraints(remote_ast));

    let mut diffs = Vec::new();
    let mut names: Vec<&String> = local.keys().chain(remote.keys()).collect();
    names.sort();
    names.dedup();
    for name in names {
        match (local.get(name), remote.get(name)) {
            (Some(expr), None) => diffs.push(Difference::new(
                DifferenceKind::Added,
                format!("{}.{name}", table.key()),
                format!("add check constraint {name} on {table}"),
                vec![alter_add_constraint(
                    table,
                    TableConstraint::Check { name: Some(name.clone()), expr: (*expr).clone() },
                )],
            )),
            (None, Some(_)) => diffs.push(Difference::new(
                DifferenceKind::Removed,
                format!("{}.{name}", table.key()),
                format!("drop check constraint {name} on {table}"),
                vec![alter_drop_constraint(table, name)],
            )),
            (Some(local_expr), Some(remote_expr)) => {
                if local_expr != remote_expr {
                    diffs.push(Difference::new(
                        DifferenceKind::Modified,
                        format!("{}.{name}", table.key()),
                        format!("recreate check constraint {name} on {table} (expression changed)"),
                        vec![
                            alter_drop_constraint(table, name),
                            alter_add_constraint(table, TableConstraint::Check { name: Some(name.clone()), expr: (*local_expr).clone() }),
                        ],
                    ));
                }
            }
            (None, None) => unreachable!("name drawn from the union of both constraint maps"),
        }
    }
    diffs
}

fn alter_add_constraint(table: &CanonicalName, constraint: TableConstraint) -> Statement {
    Statement::AlterTable(AlterTableStatement {
        table: QualifiedName::qualified(table.schema.clone(), table.name.clone()),
        actions: vec![AlterTableAction::AddConstraint(constraint)],
    })
}

fn alter_drop_constraint(table: &CanonicalName, name: &str) -> Statement {
    Statement::AlterTable(AlterTableStatement {
        table: QualifiedName::qualified(table.schema.clone(), table.name.clone()),
        actions: vec![AlterTableAction::DropConstraint { name: name.to_string() }],
    })
}

/// Builds the single §4.4.1 `Difference` covering every rewrite-requiring
/// column type change on this table.
fn build_rewrite_difference(
    table: &CanonicalName,
    changed: &[String],
    local_cols: &HashMap<String, &ColumnDef>,
    remote_cols: &HashMap<String, &ColumnDef>,
    local_indexes: &HashMap<String, &CreateIndexStatement>,
    remote_indexes: &HashMap<String, &CreateIndexStatement>,
    default_schema: &str,
) -> Difference {
    let mut statements = vec![Statement::Commit, Statement::Begin];

    // Step 2: drop every index/unique constraint referencing a changed column.
    let mut affected: Vec<&String> = remote_indexes
        .iter()
        .filter(|(_, idx)| changed.iter().any(|c| index_references_column(idx, table, c, default_schema)))
        .map(|(name, _)| name)
        .collect();
    affected.sort();
    for name in &affected {
        let cascade = remote_indexes[*name].unique;
        statements.push(drop_index_stmt(table, name, cascade));
    }

    statements.push(Statement::Commit);
    statements.push(Statement::Begin);
    statements.push(Statement::Commit);

    let actions = changed
        .iter()
        .map(|name| {
            let target = local_cols[name].data_type.clone();
            let needs_cast = target.family() != remote_cols[name].data_type.family();
            AlterTableAction::AlterColumnType {
                name: name.clone(),
                data_type: target.clone(),
                using: needs_cast.then(|| Expr::Cast {
                    expr: Box::new(Expr::column(name)),
                    data_type: target,
                }),
            }
        })
        .collect();
    statements.push(Statement::AlterTable(AlterTableStatement {
        table: QualifiedName::qualified(table.schema.clone(), table.name.clone()),
        actions,
    }));

    statements.push(Statement::Begin);
    statements.push(Statement::Commit);
    statements.push(Statement::Begin);

    // Step 8: recreate unique-backing indexes first, then plain indexes,
    // from the desired (local) definitions.
    let mut recreate: Vec<&String> = local_indexes
        .iter()
        .filter(|(_, idx)| changed.iter().any(|c| index_references_column(idx, table, c, default_schema)))
        .map(|(name, _)| name)
        .collect();
    recreate.sort_by_key(|name| (!local_indexes[*name].unique, (*name).clone()));
    for name in recreate {
        statements.push(Statement::CreateIndex((*local_indexes[name]).clone()));
    }

    Difference::new(
        DifferenceKind::Modified,
        table.key(),
        format!("rewrite column type(s) {} on {table}", changed.join(", ")),
        statements,
    )
    .dangerous()
    .warn(format!("columns {} on {table} require an on-disk rewrite and cannot run inside a transaction", changed.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scurry_ast::parser::parse_statements;

    fn schema_from(sql: &str) -> Schema {
        Schema::from_statements(parse_statements(sql).unwrap(), "public").unwrap()
    }

    #[test]
    fn added_table_emits_single_create() {
        let local = schema_from("CREATE TABLE users (id INT8 PRIMARY KEY, name STRING NOT NULL);");
        let remote = Schema::default();
        let diffs = diff_tables(&local, &remote, "public");
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].kind, DifferenceKind::Added);
        assert_eq!(diffs[0].migration_statements.len(), 1);
    }

    #[test]
    fn sibling_computed_column_is_two_separate_add_column_statements() {
        let local = schema_from(
            "CREATE TABLE inventory (quantity INT8, committed INT8, available INT8 AS (quantity - committed) STORED);",
        );
        let remote = schema_from("CREATE TABLE inventory (quantity INT8);");
        let diffs = diff_tables(&local, &remote, "public");
        assert_eq!(diffs.iter().filter(|d| d.kind == DifferenceKind::Added).count(), 2);
        for d in &diffs {
            assert_eq!(d.migration_statements.len(), 1);
        }
    }

    #[test]
    fn drop_column_suppresses_index_drop() {
        let local = schema_from("CREATE TABLE users (id INT8 PRIMARY KEY); CREATE INDEX email_idx ON users (email);");
        let remote = schema_from(
            "CREATE TABLE users (id INT8 PRIMARY KEY, email STRING); CREATE INDEX email_idx ON users (email);",
        );
        let diffs = diff_tables(&local, &remote, "public");
        let drop_col = diffs.iter().filter(|d| d.description.contains("drop column email")).count();
        let drop_idx = diffs.iter().filter(|d| d.description.contains("drop index")).count();
        assert_eq!(drop_col, 1);
        assert_eq!(drop_idx, 0);
    }

    #[test]
    fn narrowing_type_change_emits_rewrite_sequence() {
        let local = schema_from("CREATE TABLE users (id INT8 PRIMARY KEY, email VARCHAR(255)); CREATE INDEX email_idx ON users (email);");
        let remote = schema_from("CREATE TABLE users (id INT8 PRIMARY KEY, email STRING); CREATE INDEX email_idx ON users (email);");
        let diffs = diff_tables(&local, &remote, "public");
        let rewrite = diffs.iter().find(|d| d.description.starts_with("rewrite column type")).unwrap();
        assert!(rewrite.dangerous);
        assert_eq!(rewrite.migration_statements.len(), 11);
        assert!(matches!(rewrite.migration_statements[0], Statement::Commit));
        assert!(matches!(rewrite.migration_statements[1], Statement::Begin));
    }

    #[test]
    fn primary_key_change_emits_five_statements() {
        let local = schema_from("CREATE TABLE users (id INT8, email STRING, CONSTRAINT users_pkey PRIMARY KEY (email));");
        let remote = schema_from("CREATE TABLE users (id INT8, email STRING, CONSTRAINT users_pkey PRIMARY KEY (id));");
        let diffs = diff_tables(&local, &remote, "public");
        let pk_diff = diffs.iter().find(|d| d.description.starts_with("change primary key")).unwrap();
        assert_eq!(pk_diff.migration_statements.len(), 5);
        assert!(pk_diff.dangerous);
    }
}
