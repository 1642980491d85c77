//! Critical path derivation.
//!
//! The path is found by walking backward from the least advanced sink, always
//! stepping to the least advanced direct dependency. It is the chain of work
//! most likely to hold up the end of the project, not the longest path.

use std::collections::HashSet;

use crate::models::graph::{ComponentLookup, DependencyGraph};
use crate::{Error, Result};

/// Derive the critical path, ordered root first and sink last.
///
/// An edgeless graph yields an empty path. Ties on progress go to the
/// component declared first. Untracked components count as 0%.
pub fn critical_path(graph: &DependencyGraph, lookup: &dyn ComponentLookup) -> Result<Vec<String>> {
    if !graph.has_edges() {
        return Ok(Vec::new());
    }

    let Some(sink) = least_advanced(graph.sinks(), lookup) else {
        return Err(Error::CyclicDependency(
            graph.find_cycle().unwrap_or_default(),
        ));
    };

    // Built sink first, reversed at the end
    let mut path = vec![sink];
    let mut visited = HashSet::from([sink]);
    let mut current = sink;

    while let Some(next) = least_advanced(
        graph.dependencies_of(current).iter().map(String::as_str),
        lookup,
    ) {
        if !visited.insert(next) {
            let start = path.iter().position(|n| *n == next).unwrap_or(0);
            let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
            cycle.push(next.to_string());
            return Err(Error::CyclicDependency(cycle));
        }
        path.push(next);
        current = next;
    }

    tracing::debug!(length = path.len(), sink, "derived critical path");
    Ok(path.into_iter().rev().map(str::to_string).collect())
}

/// Pick the lowest-progress candidate; the first one wins ties.
fn least_advanced<'a>(
    candidates: impl IntoIterator<Item = &'a str>,
    lookup: &dyn ComponentLookup,
) -> Option<&'a str> {
    let mut best: Option<(&'a str, u8)> = None;
    for name in candidates {
        let progress = lookup.progress_of(name).unwrap_or(0);
        match best {
            Some((_, lowest)) if progress >= lowest => {}
            _ => best = Some((name, progress)),
        }
    }
    best.map(|(name, _)| name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::fixture;

    #[test]
    fn test_chain_walks_back_from_sink() {
        let (graph, components, _) = fixture(
            vec![("A", vec![]), ("B", vec!["A"]), ("C", vec!["B"])],
            &[("A", 80), ("B", 20), ("C", 50)],
        );
        assert_eq!(critical_path(&graph, &components).unwrap(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_edgeless_graph_has_empty_path() {
        let (graph, components, _) = fixture(vec![("A", vec![]), ("B", vec![])], &[]);
        assert!(critical_path(&graph, &components).unwrap().is_empty());
    }

    #[test]
    fn test_picks_least_advanced_sink_and_dependency() {
        // root -> {fast, slow} -> {done, lagging}
        let (graph, components, _) = fixture(
            vec![
                ("root", vec![]),
                ("fast", vec!["root"]),
                ("slow", vec!["root"]),
                ("done", vec!["fast", "slow"]),
                ("lagging", vec!["fast", "slow"]),
            ],
            &[("root", 90), ("fast", 70), ("slow", 10), ("done", 100), ("lagging", 5)],
        );
        assert_eq!(
            critical_path(&graph, &components).unwrap(),
            vec!["root", "slow", "lagging"]
        );
    }

    #[test]
    fn test_ties_go_to_first_declared() {
        let (graph, components, _) = fixture(
            vec![("a", vec![]), ("b", vec![]), ("c", vec!["a", "b"]), ("d", vec!["a", "b"])],
            &[],
        );
        assert_eq!(critical_path(&graph, &components).unwrap(), vec!["a", "c"]);
    }

    #[test]
    fn test_cycle_without_sinks_is_reported() {
        let (graph, components, _) = fixture(vec![("a", vec!["b"]), ("b", vec!["a"])], &[]);
        match critical_path(&graph, &components) {
            Err(Error::CyclicDependency(cycle)) => {
                assert_eq!(cycle.first(), cycle.last());
                assert!(cycle.contains(&"a".to_string()));
            }
            other => panic!("expected cycle error, got {:?}", other),
        }
    }

    #[test]
    fn test_cycle_behind_a_sink_is_reported() {
        // sink depends on a two-node loop
        let (graph, components, _) = fixture(
            vec![("a", vec!["b"]), ("b", vec!["a"]), ("sink", vec!["a"])],
            &[],
        );
        match critical_path(&graph, &components) {
            Err(Error::CyclicDependency(cycle)) => {
                assert_eq!(cycle.first(), cycle.last());
                assert!(!cycle.contains(&"sink".to_string()));
            }
            other => panic!("expected cycle error, got {:?}", other),
        }
    }
}
