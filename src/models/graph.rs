//! Dependency graph between components.
//!
//! The graph is static configuration: it is built once at startup from the
//! declared edge table and shared by reference with everything that needs it.
//! Reverse edges (dependents) are derived by inverting the table on demand.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::ComponentStatus;

/// Read access to component state, as needed by graph queries.
///
/// Implemented by the component tracker; graph algorithms only ever read.
pub trait ComponentLookup {
    /// Current status, or `None` if the component is not tracked.
    fn status_of(&self, name: &str) -> Option<ComponentStatus>;

    /// Current completion percentage, or `None` if the component is not tracked.
    fn progress_of(&self, name: &str) -> Option<u8>;
}

/// Label reported for a dependency that is not tracked.
pub const UNKNOWN_STATUS: &str = "Unknown";

/// An unsatisfied dependency and its current status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Blocker {
    pub name: String,
    pub status: String,
}

/// Whether a component's direct dependencies are all satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Readiness {
    pub ready: bool,
    pub blockers: Vec<Blocker>,
}

/// Immutable component dependency graph.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Component names in declaration order
    order: Vec<String>,

    /// Direct prerequisites per component, in declaration order
    dependencies: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Build a graph from `(component, prerequisites)` declarations.
    ///
    /// Declaration order is preserved and used for every tie-break. A component
    /// declared twice keeps its first position; its prerequisite lists merge.
    pub fn new<I, S>(declarations: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<S>)>,
        S: Into<String>,
    {
        let mut graph = Self::default();
        for (name, deps) in declarations {
            let name = name.into();
            if !graph.dependencies.contains_key(&name) {
                graph.order.push(name.clone());
            }
            let entry = graph.dependencies.entry(name).or_default();
            for dep in deps {
                let dep = dep.into();
                if !entry.contains(&dep) {
                    entry.push(dep);
                }
            }
        }
        graph
    }

    /// Component names in declaration order.
    pub fn components(&self) -> &[String] {
        &self.order
    }

    pub fn contains(&self, name: &str) -> bool {
        self.dependencies.contains_key(name)
    }

    /// Direct prerequisites of `name`; empty if none are declared.
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.dependencies
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every component whose prerequisites include `name`, in declaration order.
    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        self.order
            .iter()
            .filter(|candidate| self.dependencies_of(candidate).iter().any(|d| d == name))
            .cloned()
            .collect()
    }

    /// Whether any dependency edge is declared at all.
    pub fn has_edges(&self) -> bool {
        self.dependencies.values().any(|deps| !deps.is_empty())
    }

    /// All edges as `(dependency, dependent)` pairs in declaration order.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.order
            .iter()
            .flat_map(|dependent| {
                self.dependencies_of(dependent)
                    .iter()
                    .map(move |dep| (dep.as_str(), dependent.as_str()))
            })
            .collect()
    }

    /// Components nothing depends on, in declaration order.
    pub fn sinks(&self) -> Vec<&str> {
        let depended_on: HashSet<&str> = self
            .dependencies
            .values()
            .flat_map(|deps| deps.iter().map(String::as_str))
            .collect();
        self.order
            .iter()
            .map(String::as_str)
            .filter(|name| !depended_on.contains(name))
            .collect()
    }

    /// Check whether `name` may proceed given the current component state.
    ///
    /// Ready iff every direct dependency is `Completed` or `Review`. Each
    /// unsatisfied dependency is reported, in declaration order; untracked
    /// dependencies are reported with status `Unknown`.
    pub fn readiness(&self, name: &str, lookup: &dyn ComponentLookup) -> Readiness {
        let blockers: Vec<Blocker> = self
            .dependencies_of(name)
            .iter()
            .filter_map(|dep| match lookup.status_of(dep) {
                Some(status) if status.is_satisfied() => None,
                Some(status) => Some(Blocker {
                    name: dep.clone(),
                    status: status.as_str().to_string(),
                }),
                None => Some(Blocker {
                    name: dep.clone(),
                    status: UNKNOWN_STATUS.to_string(),
                }),
            })
            .collect();

        Readiness {
            ready: blockers.is_empty(),
            blockers,
        }
    }

    /// Find a dependency cycle, if one exists.
    ///
    /// Returns the cycle as a path that starts and ends with the same component.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut visited = HashSet::new();
        for start in &self.order {
            if visited.contains(start.as_str()) {
                continue;
            }
            let mut path: Vec<&str> = Vec::new();
            if let Some(cycle) = self.cycle_from(start, &mut visited, &mut path) {
                return Some(cycle);
            }
        }
        None
    }

    fn cycle_from<'a>(
        &'a self,
        node: &'a str,
        visited: &mut HashSet<&'a str>,
        path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        if let Some(pos) = path.iter().position(|n| *n == node) {
            let mut cycle: Vec<String> = path[pos..].iter().map(|n| n.to_string()).collect();
            cycle.push(node.to_string());
            return Some(cycle);
        }
        if !visited.insert(node) {
            return None;
        }

        path.push(node);
        for dep in self.dependencies_of(node) {
            if let Some(cycle) = self.cycle_from(dep, visited, path) {
                return Some(cycle);
            }
        }
        path.pop();
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Minimal lookup backed by a map of statuses.
    struct Statuses(HashMap<&'static str, ComponentStatus>);

    impl ComponentLookup for Statuses {
        fn status_of(&self, name: &str) -> Option<ComponentStatus> {
            self.0.get(name).copied()
        }

        fn progress_of(&self, _name: &str) -> Option<u8> {
            Some(0)
        }
    }

    fn sample_graph() -> DependencyGraph {
        DependencyGraph::new(vec![
            ("database", vec![]),
            ("auth", vec!["database"]),
            ("api", vec!["database", "auth"]),
            ("ui", vec!["api"]),
            ("docs", vec![]),
        ])
    }

    #[test]
    fn test_dependencies_of_unknown_is_empty() {
        let graph = sample_graph();
        assert!(graph.dependencies_of("nope").is_empty());
        assert_eq!(graph.dependencies_of("api"), ["database", "auth"]);
    }

    #[test]
    fn test_dependents_are_exact_inverse() {
        let graph = sample_graph();
        for a in graph.components() {
            for b in graph.components() {
                let forward = graph.dependents_of(a).contains(b);
                let backward = graph.dependencies_of(b).contains(a);
                assert_eq!(forward, backward, "edge {a} -> {b}");
            }
        }
        assert_eq!(graph.dependents_of("database"), vec!["auth", "api"]);
    }

    #[test]
    fn test_duplicate_declarations_merge() {
        let graph = DependencyGraph::new(vec![("a", vec![]), ("b", vec!["a"]), ("b", vec!["a"])]);
        assert_eq!(graph.components(), ["a", "b"]);
        assert_eq!(graph.dependencies_of("b"), ["a"]);
    }

    #[test]
    fn test_sinks_in_declaration_order() {
        let graph = sample_graph();
        assert_eq!(graph.sinks(), vec!["ui", "docs"]);
    }

    #[test]
    fn test_edges_and_has_edges() {
        let graph = sample_graph();
        assert!(graph.has_edges());
        assert_eq!(graph.edges()[0], ("database", "auth"));
        assert_eq!(graph.edges().len(), 4);

        let flat = DependencyGraph::new(vec![("a", vec![]), ("b", vec![])]);
        assert!(!flat.has_edges());
        assert!(flat.edges().is_empty());
    }

    #[test]
    fn test_readiness_without_dependencies() {
        let graph = sample_graph();
        let statuses = Statuses(HashMap::new());
        let readiness = graph.readiness("docs", &statuses);
        assert!(readiness.ready);
        assert!(readiness.blockers.is_empty());
    }

    #[test]
    fn test_readiness_scenario() {
        let graph = DependencyGraph::new(vec![("X", vec![]), ("Y", vec!["X"])]);
        let mut statuses = Statuses(HashMap::from([
            ("X", ComponentStatus::NotStarted),
            ("Y", ComponentStatus::NotStarted),
        ]));

        let readiness = graph.readiness("Y", &statuses);
        assert!(!readiness.ready);
        assert_eq!(
            readiness.blockers,
            vec![Blocker {
                name: "X".to_string(),
                status: "Not Started".to_string()
            }]
        );

        statuses.0.insert("X", ComponentStatus::Completed);
        let readiness = graph.readiness("Y", &statuses);
        assert!(readiness.ready);
        assert!(readiness.blockers.is_empty());
    }

    #[test]
    fn test_readiness_flips_on_single_dependency() {
        let graph = sample_graph();
        let mut statuses = Statuses(HashMap::from([
            ("database", ComponentStatus::Completed),
            ("auth", ComponentStatus::Review),
        ]));
        assert!(graph.readiness("api", &statuses).ready);

        statuses.0.insert("auth", ComponentStatus::Blocked);
        let readiness = graph.readiness("api", &statuses);
        assert!(!readiness.ready);
        assert_eq!(readiness.blockers.len(), 1);
        assert_eq!(readiness.blockers[0].name, "auth");
        assert_eq!(readiness.blockers[0].status, "Blocked");
    }

    #[test]
    fn test_readiness_reports_untracked_as_unknown() {
        let graph = sample_graph();
        let statuses = Statuses(HashMap::from([("database", ComponentStatus::Completed)]));
        let readiness = graph.readiness("api", &statuses);
        assert_eq!(readiness.blockers[0].name, "auth");
        assert_eq!(readiness.blockers[0].status, UNKNOWN_STATUS);
    }

    #[test]
    fn test_find_cycle_none_for_dag() {
        assert!(sample_graph().find_cycle().is_none());
    }

    #[test]
    fn test_find_cycle_reports_path() {
        let graph = DependencyGraph::new(vec![
            ("a", vec!["c"]),
            ("b", vec!["a"]),
            ("c", vec!["b"]),
            ("d", vec![]),
        ]);
        let cycle = graph.find_cycle().unwrap();
        assert_eq!(cycle.first(), cycle.last());
        assert_eq!(cycle.len(), 4);
    }

    #[test]
    fn test_find_cycle_self_loop() {
        let graph = DependencyGraph::new(vec![("a", vec!["a"])]);
        assert_eq!(graph.find_cycle().unwrap(), vec!["a", "a"]);
    }
}
