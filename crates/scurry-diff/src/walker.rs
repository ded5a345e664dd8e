//! Expression Dependency Walker (§4.2).
//!
//! Walks an expression tree — a `DEFAULT`, computed-column, or `CHECK`
//! expression — and collects the set of Provides-style keys it depends on,
//! so the Provides/Requires Extractor (`provides_requires.rs`) can fold
//! expression dependencies into a statement's Requires set.

use std::collections::HashSet;

use scurry_ast::ast::{DataType, Expr};
use scurry_schema::{column_key, provider_keys, CanonicalName};

/// Splits a possibly dot-qualified name (as produced by the parser for a
/// three-level `schema.table.col` reference, or a `CAST` target type written
/// `schema.type`) into its schema and bare-name parts, defaulting the schema
/// when no dot is present.
fn split_qualified(raw: &str, default_schema: &str) -> (String, String) {
    raw.split_once('.').map_or_else(
        || (default_schema.to_string(), raw.to_string()),
        |(schema, name)| (schema.to_string(), name.to_string()),
    )
}

/// Collects every object-reference dependency inside `expr`, resolved
/// against `default_schema`. Used for contexts with no containing table
/// (e.g. a standalone `CHECK` at the statement level is always on some
/// table, but the sibling-column rewrite only applies when the caller knows
/// which one — see [`walk_in_table`]).
#[must_use]
pub fn walk(expr: &Expr, default_schema: &str) -> HashSet<String> {
    let mut deps = HashSet::new();
    collect(expr, default_schema, None, &mut deps);
    deps
}

/// As [`walk`], but any bare (single-level, unqualified) column reference is
/// additionally rewritten as a reference to a sibling column of
/// `(containing_schema, containing_table)`. This is the mechanism by which a
/// computed column's expression declares another column of the same table
/// (e.g. `committed`) as a dependency, so the sequencer orders the two
/// `ADD COLUMN`s correctly when both are new.
#[must_use]
pub fn walk_in_table(
    expr: &Expr,
    containing_schema: &str,
    containing_table: &str,
    default_schema: &str,
) -> HashSet<String> {
    let mut deps = HashSet::new();
    collect(expr, default_schema, Some((containing_schema, containing_table)), &mut deps);
    deps
}

fn collect(expr: &Expr, default_schema: &str, containing: Option<(&str, &str)>, deps: &mut HashSet<String>) {
    match expr {
        Expr::Literal(_) | Expr::Wildcard => {}

        Expr::Column { table: None, name, .. } => {
            if let Some((schema, table)) = containing {
                let owner = CanonicalName::new(schema, table);
                deps.insert(column_key(&owner, name));
            } else {
                deps.extend(provider_keys(default_schema, name, default_schema));
            }
        }
        Expr::Column { table: Some(qualifier), .. } => {
            let (schema, name) = split_qualified(qualifier, default_schema);
            deps.extend(provider_keys(&schema, &name, default_schema));
        }

        Expr::Binary { left, right, .. } => {
            collect(left, default_schema, containing, deps);
            collect(right, default_schema, containing, deps);
        }
        Expr::Unary { operand, .. } => collect(operand, default_schema, containing, deps),

        Expr::Function(call) => {
            let schema = call.schema.clone().unwrap_or_else(|| default_schema.to_string());
            deps.insert(CanonicalName::new(schema, &call.name).key());
            for arg in &call.args {
                collect(arg, default_schema, containing, deps);
            }
        }

        Expr::IsNull { expr, .. } => collect(expr, default_schema, containing, deps),
        Expr::In { expr, list, .. } => {
            collect(expr, default_schema, containing, deps);
            for item in list {
                collect(item, default_schema, containing, deps);
            }
        }
        Expr::Between { expr, low, high, .. } => {
            collect(expr, default_schema, containing, deps);
            collect(low, default_schema, containing, deps);
            collect(high, default_schema, containing, deps);
        }
        Expr::Case { operand, when_clauses, else_clause } => {
            if let Some(operand) = operand {
                collect(operand, default_schema, containing, deps);
            }
            for (when, then) in when_clauses {
                collect(when, default_schema, containing, deps);
                collect(then, default_schema, containing, deps);
            }
            if let Some(else_clause) = else_clause {
                collect(else_clause, default_schema, containing, deps);
            }
        }
        Expr::Cast { expr, data_type } => {
            collect(expr, default_schema, containing, deps);
            if let Some(name) = data_type.dependency_name() {
                let (schema, name) = split_qualified(name, default_schema);
                deps.extend(provider_keys(&schema, &name, default_schema));
            }
        }
        Expr::Paren(inner) => collect(inner, default_schema, containing, deps),
    }
}

/// Unwraps array wrapping to find the underlying referenced type name, for
/// callers diffing a column's type directly rather than an expression (used
/// by the differ's rewrite-requiring-change detection, which needs the
/// referenced custom type name rather than a full dependency set).
#[must_use]
pub fn type_dependency(data_type: &DataType, default_schema: &str) -> Option<CanonicalName> {
    data_type.dependency_name().map(|raw| {
        let (schema, name) = split_qualified(raw, default_schema);
        CanonicalName::new(schema, name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scurry_ast::ast::{FunctionCall, Literal};

    #[test]
    fn column_reference_defaults_schema_and_includes_bare_name() {
        let expr = Expr::column("status");
        let deps = walk(&expr, "public");
        assert!(deps.contains("public.status"));
        assert!(deps.contains("status"));
    }

    #[test]
    fn qualified_column_reference_does_not_add_bare_form() {
        let expr = Expr::qualified_column("billing", "invoices");
        let deps = walk(&expr, "public");
        assert!(deps.contains("billing.invoices"));
        assert!(!deps.contains("invoices"));
    }

    #[test]
    fn function_call_resolves_schema_and_recurses_into_args() {
        let expr = Expr::Function(FunctionCall {
            schema: None,
            name: "now".to_string(),
            args: vec![Expr::column("tz")],
        });
        let deps = walk(&expr, "public");
        assert!(deps.contains("public.now"));
        assert!(deps.contains("public.tz"));
    }

    #[test]
    fn cast_to_custom_type_adds_type_dependency() {
        let expr = Expr::Cast {
            expr: Box::new(Expr::string("active")),
            data_type: DataType::Custom("status".to_string()),
        };
        let deps = walk(&expr, "public");
        assert!(deps.contains("public.status"));
    }

    #[test]
    fn array_of_custom_type_unwraps_to_element_name() {
        let expr = Expr::Cast {
            expr: Box::new(Expr::Literal(Literal::Null)),
            data_type: DataType::Array(Box::new(DataType::Custom("status".to_string()))),
        };
        let deps = walk(&expr, "public");
        assert!(deps.contains("public.status"));
    }

    #[test]
    fn bare_reference_in_table_context_resolves_to_sibling_column() {
        let expr = Expr::column("committed");
        let deps = walk_in_table(&expr, "public", "inventory", "public");
        assert_eq!(deps, HashSet::from(["public.inventory.committed".to_string()]));
    }

    #[test]
    fn qualified_reference_in_table_context_is_not_rewritten() {
        let expr = Expr::qualified_column("other_table", "col");
        let deps = walk_in_table(&expr, "public", "inventory", "public");
        assert!(deps.contains("public.other_table"));
        assert!(!deps.iter().any(|d| d.contains("inventory")));
    }
}
