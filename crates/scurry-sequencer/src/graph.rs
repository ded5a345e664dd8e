//! The identity-graph ordering primitive shared by the Migration Sequencer
//! (§4.5) and the FK Order Resolver (§4.6).
//!
//! §9 "Cyclic graph with identity-based nodes" asks for nodes compared and
//! hashed by identity rather than content, backed by an address-stable
//! container. A `Vec<Node>` arena indexed by a plain `usize` gives the same
//! guarantee idiomatically: two nodes with byte-identical `Difference`s
//! still get distinct slots, and the index is stable for the arena's
//! lifetime, so it stands in for a pointer without `unsafe` or a GC'd heap.

use std::collections::HashSet;

use crate::error::{Result, SequencerError};

/// One node in the dependency graph: a unit that must be emitted as a whole
/// (never split across a dependency edge), with the names it provides and
/// requires.
#[derive(Debug, Clone)]
pub struct Node {
    /// Canonical text of the node's first statement; the sort key used for
    /// deterministic ordering everywhere the algorithm needs a tie-break.
    pub label: String,
    /// Names this node makes available to others.
    pub provides: HashSet<String>,
    /// Names this node needs available before it runs.
    pub requires: HashSet<String>,
}

/// Topologically orders `nodes` by wiring `requires` to `provides` (plus any
/// extra edges the caller has already folded into `extra_deps`), breaking
/// ties lexicographically by `label` for determinism, and detecting cycles.
///
/// Returns node indices in dependency order: every node appears after every
/// node it depends on.
pub fn topological_order(nodes: &[Node], extra_deps: &[HashSet<usize>]) -> Result<Vec<usize>> {
    let mut providers: std::collections::HashMap<&str, Vec<usize>> = std::collections::HashMap::new();
    for (i, node) in nodes.iter().enumerate() {
        for name in &node.provides {
            providers.entry(name.as_str()).or_default().push(i);
        }
    }

    let mut deps: Vec<HashSet<usize>> = vec![HashSet::new(); nodes.len()];
    for (i, node) in nodes.iter().enumerate() {
        for name in &node.requires {
            if let Some(providing) = providers.get(name.as_str()) {
                for &j in providing {
                    if j != i {
                        deps[i].insert(j);
                    }
                }
            }
        }
    }
    for (i, extra) in extra_deps.iter().enumerate() {
        deps[i].extend(extra.iter().copied());
    }

    let mut start_order: Vec<usize> = (0..nodes.len()).collect();
    start_order.sort_by(|&a, &b| nodes[a].label.cmp(&nodes[b].label));

    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Unvisited,
        Pending,
        Done,
    }
    let mut state = vec![State::Unvisited; nodes.len()];
    let mut order = Vec::with_capacity(nodes.len());
    let mut path: Vec<usize> = Vec::new();

    fn visit(
        i: usize,
        nodes: &[Node],
        deps: &[HashSet<usize>],
        state: &mut [State],
        order: &mut Vec<usize>,
        path: &mut Vec<usize>,
    ) -> Result<()> {
        state[i] = State::Pending;
        path.push(i);

        let mut children: Vec<usize> = deps[i].iter().copied().collect();
        children.sort_by(|&a, &b| nodes[a].label.cmp(&nodes[b].label));
        for child in children {
            match state[child] {
                State::Unvisited => visit(child, nodes, deps, state, order, path)?,
                State::Pending => {
                    let cycle_start = path.iter().position(|&n| n == child).unwrap_or(0);
                    let mut cycle: Vec<String> = path[cycle_start..].iter().map(|&n| nodes[n].label.clone()).collect();
                    cycle.push(nodes[child].label.clone());
                    return Err(SequencerError::CircularDependency(cycle));
                }
                State::Done => {}
            }
        }

        path.pop();
        state[i] = State::Done;
        order.push(i);
        Ok(())
    }

    for start in start_order {
        if state[start] == State::Unvisited {
            visit(start, nodes, &deps, &mut state, &mut order, &mut path)?;
        }
    }

    Ok(order)
}

/// Splits a dependency-ordered node list into transaction-safe chunks
/// (§4.5 step 4): a new chunk starts whenever the next node's `requires`
/// intersects the set of names already provided within the current chunk.
/// Each chunk is then re-sorted lexicographically by label for determinism.
#[must_use]
pub fn chunk(order: &[usize], nodes: &[Node]) -> Vec<Vec<usize>> {
    let mut chunks: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    let mut provided_so_far: HashSet<&str> = HashSet::new();

    for &idx in order {
        let node = &nodes[idx];
        let conflicts = node.requires.iter().any(|r| provided_so_far.contains(r.as_str()));
        if conflicts && !current.is_empty() {
            current.sort_by(|&a, &b| nodes[a].label.cmp(&nodes[b].label));
            chunks.push(std::mem::take(&mut current));
            provided_so_far.clear();
        }
        provided_so_far.extend(node.provides.iter().map(String::as_str));
        current.push(idx);
    }
    if !current.is_empty() {
        current.sort_by(|&a, &b| nodes[a].label.cmp(&nodes[b].label));
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(label: &str, provides: &[&str], requires: &[&str]) -> Node {
        Node {
            label: label.to_string(),
            provides: provides.iter().map(|s| (*s).to_string()).collect(),
            requires: requires.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[test]
    fn providers_are_ordered_before_dependents() {
        let nodes = vec![node("b", &["b"], &["a"]), node("a", &["a"], &[])];
        let extra = vec![HashSet::new(); nodes.len()];
        let order = topological_order(&nodes, &extra).unwrap();
        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn cycle_is_detected() {
        let nodes = vec![node("a", &["a"], &["b"]), node("b", &["b"], &["a"])];
        let extra = vec![HashSet::new(); nodes.len()];
        let err = topological_order(&nodes, &extra).unwrap_err();
        assert!(matches!(err, SequencerError::CircularDependency(_)));
    }

    #[test]
    fn chunk_boundary_on_same_chunk_dependency() {
        let nodes = vec![node("a", &["a"], &[]), node("b", &["b"], &["a"])];
        let order = topological_order(&nodes, &vec![HashSet::new(); nodes.len()]).unwrap();
        let chunks = chunk(&order, &nodes);
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn independent_nodes_share_a_chunk() {
        let nodes = vec![node("a", &["a"], &[]), node("b", &["b"], &[])];
        let order = topological_order(&nodes, &vec![HashSet::new(); nodes.len()]).unwrap();
        let chunks = chunk(&order, &nodes);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 2);
    }
}
