//! Migration Sequencer (§4.5): turns the differ's unordered `Difference`
//! list into one dependency-safe, transaction-chunked statement stream.

use std::collections::{HashMap, HashSet};

use scurry_ast::ast::{ObjectKind, Statement};
use scurry_ast::printer::{canonical, pretty};
use scurry_diff::{extract, Difference, DifferenceKind};
use tracing::{debug, info};

use crate::error::Result;
use crate::graph::{chunk, topological_order, Node};

/// The result of sequencing: a rendered statement stream plus the
/// warning strings collected along the way, returned separately so a
/// caller can display them as a summary in addition to the embedded
/// `-- WARNING:` comments (§4.5 step 5).
#[derive(Debug, Clone)]
pub struct SequencedMigration {
    /// The ordered, rendered statements (including transaction markers and
    /// embedded warning comments).
    pub statements: Vec<String>,
    /// Every warning message attached to a `Difference`, in emission order.
    pub warnings: Vec<String>,
}

struct DiffNode {
    node: Node,
    statements: Vec<Statement>,
    warning: Option<String>,
    is_drop_schema: bool,
    kind: DifferenceKind,
    object_name: String,
    original_dependencies: Option<HashSet<String>>,
}

fn is_drop_schema(stmt: &Statement) -> bool {
    matches!(stmt, Statement::Drop(d) if d.kind == ObjectKind::Schema)
}

fn build_diff_nodes(diffs: &[Difference], default_schema: &str) -> Vec<DiffNode> {
    diffs
        .iter()
        .map(|diff| {
            let mut provides = HashSet::new();
            let mut requires = HashSet::new();
            for stmt in &diff.migration_statements {
                let pr = extract(stmt, default_schema);
                provides.extend(pr.provides);
                requires.extend(pr.requires);
            }
            let label = diff
                .migration_statements
                .first()
                .map(canonical)
                .unwrap_or_default();
            DiffNode {
                node: Node { label, provides, requires },
                statements: diff.migration_statements.clone(),
                warning: diff.warning_message.clone(),
                is_drop_schema: diff.migration_statements.iter().any(is_drop_schema),
                kind: diff.kind,
                object_name: diff.object_name.clone(),
                original_dependencies: diff.original_dependencies.clone(),
            }
        })
        .collect()
}

/// Runs §4.5 steps 2-4 over one bucket (main, or drop-schemas-last) of
/// `DiffNode`s and returns the node indices (local to `bucket`) grouped
/// into transaction-safe chunks.
fn order_bucket(bucket: &[DiffNode]) -> Result<Vec<Vec<usize>>> {
    let nodes: Vec<Node> = bucket.iter().map(|d| d.node.clone()).collect();

    let dropped_by: HashMap<&str, Vec<usize>> = bucket
        .iter()
        .enumerate()
        .filter(|(_, d)| d.kind == DifferenceKind::Removed)
        .map(|(i, d)| (d.object_name.as_str(), i))
        .fold(HashMap::new(), |mut map, (i, name)| {
            map.entry(name).or_default().push(i);
            map
        });

    let mut extra: Vec<HashSet<usize>> = vec![HashSet::new(); bucket.len()];
    for (n, diff_node) in bucket.iter().enumerate() {
        let Some(deps) = &diff_node.original_dependencies else { continue };
        for x in deps {
            if let Some(droppers) = dropped_by.get(x.as_str()) {
                for &m in droppers {
                    if m != n {
                        extra[m].insert(n);
                    }
                }
            }
        }
    }

    let order = topological_order(&nodes, &extra)?;
    Ok(chunk(&order, &nodes))
}

/// One rendered statement, with the warning (if any) that should be
/// printed as a comment immediately before it.
struct Emitted {
    stmt: Statement,
    warning: Option<String>,
}

fn flatten(chunks: &[Vec<usize>], bucket: &[DiffNode]) -> Vec<Emitted> {
    let mut out = Vec::new();
    for group in chunks {
        for &idx in group {
            let diff_node = &bucket[idx];
            for (pos, stmt) in diff_node.statements.iter().enumerate() {
                out.push(Emitted {
                    stmt: stmt.clone(),
                    warning: if pos == 0 { diff_node.warning.clone() } else { None },
                });
            }
        }
    }
    out
}

/// Strips a leading and trailing `COMMIT; BEGIN` pair, which the chunking
/// scheme leaves at the outer edges of the overall stream (§4.5 step 5):
/// they are redundant once there is no statement before/after them.
fn strip_outer_transaction_markers(mut emitted: Vec<Emitted>) -> Vec<Emitted> {
    if emitted.len() >= 2 && matches!(emitted[0].stmt, Statement::Commit) && matches!(emitted[1].stmt, Statement::Begin) {
        emitted.drain(0..2);
    }
    let n = emitted.len();
    if n >= 2 && matches!(emitted[n - 2].stmt, Statement::Commit) && matches!(emitted[n - 1].stmt, Statement::Begin) {
        emitted.truncate(n - 2);
    }
    emitted
}

/// Runs the full Migration Sequencer (§4.5) over `diffs`, producing one
/// rendered statement stream. `pretty` selects the AST pretty-printer over
/// the canonical single-line form.
pub fn sequence(diffs: &[Difference], default_schema: &str, render_pretty: bool) -> Result<SequencedMigration> {
    info!(count = diffs.len(), "sequencing migration");
    let diff_nodes = build_diff_nodes(diffs, default_schema);

    let (schema_drops, main): (Vec<usize>, Vec<usize>) =
        (0..diff_nodes.len()).partition(|&i| diff_nodes[i].is_drop_schema);

    let main_bucket: Vec<DiffNode> = main.into_iter().map(|i| clone_diff_node(&diff_nodes[i])).collect();
    let schema_bucket: Vec<DiffNode> = schema_drops.into_iter().map(|i| clone_diff_node(&diff_nodes[i])).collect();

    let main_chunks = order_bucket(&main_bucket)?;
    let schema_chunks = order_bucket(&schema_bucket)?;
    debug!(main = main_chunks.len(), schema_drops = schema_chunks.len(), "chunked");

    let mut emitted = flatten(&main_chunks, &main_bucket);
    emitted.extend(flatten(&schema_chunks, &schema_bucket));
    let emitted = strip_outer_transaction_markers(emitted);

    let mut statements = Vec::with_capacity(emitted.len());
    let mut warnings = Vec::new();
    for e in emitted {
        if let Some(w) = &e.warning {
            statements.push(format!("-- WARNING: {w}"));
            warnings.push(w.clone());
        }
        statements.push(if render_pretty { pretty(&e.stmt) } else { canonical(&e.stmt) });
    }

    Ok(SequencedMigration { statements, warnings })
}

fn clone_diff_node(d: &DiffNode) -> DiffNode {
    DiffNode {
        node: d.node.clone(),
        statements: d.statements.clone(),
        warning: d.warning.clone(),
        is_drop_schema: d.is_drop_schema,
        kind: d.kind,
        object_name: d.object_name.clone(),
        original_dependencies: d.original_dependencies.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scurry_ast::ast::{CreateTableStatement, QualifiedName};

    fn create_table(name: &str) -> Statement {
        Statement::CreateTable(CreateTableStatement {
            name: QualifiedName::qualified("public", name),
            columns: vec![],
            constraints: vec![],
            if_not_exists: false,
        })
    }

    #[test]
    fn single_create_table_emits_one_statement_no_warnings() {
        let diffs = vec![Difference::new(DifferenceKind::Added, "public.users", "create table users", vec![create_table("users")])];
        let result = sequence(&diffs, "public", false).unwrap();
        assert_eq!(result.statements.len(), 1);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn strips_outer_commit_begin_pair() {
        let diffs = vec![Difference::new(
            DifferenceKind::Modified,
            "public.users",
            "change primary key",
            vec![Statement::Commit, Statement::Begin, create_table("users"), Statement::Commit, Statement::Begin],
        )];
        let result = sequence(&diffs, "public", false).unwrap();
        assert_eq!(result.statements.len(), 1);
    }

    #[test]
    fn warning_is_embedded_as_comment_before_first_statement() {
        let diffs = vec![Difference::new(DifferenceKind::Added, "public.users", "create table users", vec![create_table("users")])
            .warn("heads up")];
        let result = sequence(&diffs, "public", false).unwrap();
        assert_eq!(result.statements[0], "-- WARNING: heads up");
        assert_eq!(result.warnings, vec!["heads up".to_string()]);
    }
}
