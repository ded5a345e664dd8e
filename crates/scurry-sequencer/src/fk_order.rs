//! FK Order Resolver (§4.6): orders a set of `CREATE TABLE` statements so
//! that every table referenced by a foreign key precedes the table that
//! declares it, and flags self-referential FK columns for the load
//! orchestrator's two-phase insert (§4.7).

use std::collections::{HashMap, HashSet};

use scurry_ast::ast::{CreateTableStatement, Statement, TableConstraint};
use scurry_ast::printer::canonical;
use scurry_diff::extract;
use scurry_schema::{qualify_table, CanonicalName};

use crate::error::Result;
use crate::graph::{topological_order, Node};

/// Output of the FK Order Resolver.
#[derive(Debug, Clone, Default)]
pub struct FkOrder {
    /// Tables in dependency order: every FK target precedes its referrer.
    pub order: Vec<CanonicalName>,
    /// For each self-referential table, the local column names whose FK
    /// targets the table itself.
    pub self_ref_columns: HashMap<CanonicalName, Vec<String>>,
}

/// Resolves the FK-safe table order for `tables` (each paired with its
/// canonical name, as produced by [`scurry_schema::Schema`]).
pub fn resolve(tables: &[(CanonicalName, CreateTableStatement)], default_schema: &str) -> Result<FkOrder> {
    let names: Vec<&CanonicalName> = tables.iter().map(|(n, _)| n).collect();
    let nodes: Vec<Node> = tables
        .iter()
        .map(|(_, ast)| {
            let stmt = Statement::CreateTable(ast.clone());
            let pr = extract(&stmt, default_schema);
            Node { label: canonical(&stmt), provides: pr.provides, requires: pr.requires }
        })
        .collect();

    let extra = vec![HashSet::new(); nodes.len()];
    let order_idx = topological_order(&nodes, &extra)?;
    let order = order_idx.into_iter().map(|i| names[i].clone()).collect();

    let mut self_ref_columns = HashMap::new();
    for (name, ast) in tables {
        let cols: Vec<String> = ast
            .constraints
            .iter()
            .filter_map(|c| match c {
                TableConstraint::ForeignKey { columns, ref_table, .. } if qualify_table(ref_table, default_schema) == *name => {
                    Some(columns.clone())
                }
                _ => None,
            })
            .flatten()
            .collect();
        if !cols.is_empty() {
            self_ref_columns.insert(name.clone(), cols);
        }
    }

    Ok(FkOrder { order, self_ref_columns })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scurry_ast::parser::parse_statements;

    fn table_ast(sql: &str) -> CreateTableStatement {
        match parse_statements(sql).unwrap().into_iter().next().unwrap() {
            Statement::CreateTable(t) => t,
            _ => panic!("expected CREATE TABLE"),
        }
    }

    #[test]
    fn parent_precedes_child() {
        let parent = table_ast("CREATE TABLE categories (id INT8 PRIMARY KEY);");
        let child = table_ast(
            "CREATE TABLE posts (id INT8 PRIMARY KEY, category_id INT8 REFERENCES categories(id));",
        );
        let tables = vec![
            (CanonicalName::new("public", "posts"), child),
            (CanonicalName::new("public", "categories"), parent),
        ];
        let resolved = resolve(&tables, "public").unwrap();
        let posts_idx = resolved.order.iter().position(|n| n.name == "posts").unwrap();
        let categories_idx = resolved.order.iter().position(|n| n.name == "categories").unwrap();
        assert!(categories_idx < posts_idx);
    }

    #[test]
    fn self_referential_fk_is_recorded() {
        let table = table_ast(
            "CREATE TABLE categories (id INT8 PRIMARY KEY, parent_id INT8 REFERENCES categories(id));",
        );
        let name = CanonicalName::new("public", "categories");
        let tables = vec![(name.clone(), table)];
        let resolved = resolve(&tables, "public").unwrap();
        assert_eq!(resolved.self_ref_columns.get(&name), Some(&vec!["parent_id".to_string()]));
    }
}
