//! Diagnostic and plan engine.
//!
//! Everything here is a pure function of the current component, milestone and
//! dependency graph state. The engine never mutates records and never writes
//! to the activity log; the command layer decides what to persist.

pub mod critical_path;
pub mod dot;
pub mod plan;
pub mod report;

pub use critical_path::critical_path;
pub use plan::{BlockedItem, FocusComponent, MilestoneFocus, ReadyItem, Recommendations};
pub use report::{DiagnosticReport, MilestoneView};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::graph::{Blocker, DependencyGraph};
use crate::models::{Component, ComponentStatus, MilestoneStatus, Phase};
use crate::tracker::{ComponentTracker, MilestoneTracker};

/// Count of components at one status level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: ComponentStatus,
    pub count: usize,
}

/// Project-wide summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_components: usize,

    /// One entry per status level, in workflow order, zeros included
    pub status_counts: Vec<StatusCount>,

    /// Mean completion across all components; `None` when there are none
    pub overall_progress: Option<f64>,

    pub completed_milestones: usize,
    pub total_milestones: usize,
    pub blocked_components: Vec<String>,
    pub ready_for_production: bool,
}

impl Summary {
    pub fn count(&self, status: ComponentStatus) -> usize {
        self.status_counts
            .iter()
            .find(|c| c.status == status)
            .map_or(0, |c| c.count)
    }
}

/// Canonical per-component view that the other reports are built from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentAnalysis {
    pub name: String,
    pub status: ComponentStatus,
    pub phase: Phase,
    pub progress: u8,
    pub dependencies: Vec<String>,
    pub dependents: Vec<String>,
    pub ready: bool,
    pub blockers: Vec<Blocker>,
}

/// An issue tagged with its owning component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRef {
    pub component: String,
    pub index: usize,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

/// All issues, split by resolution.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueReport {
    pub open: Vec<IssueRef>,
    pub resolved: Vec<IssueRef>,
}

/// Read-only view over tracker and graph state.
#[derive(Clone, Copy)]
pub struct Engine<'a> {
    pub graph: &'a DependencyGraph,
    pub components: &'a ComponentTracker,
    pub milestones: &'a MilestoneTracker,
}

impl<'a> Engine<'a> {
    pub fn new(
        graph: &'a DependencyGraph,
        components: &'a ComponentTracker,
        milestones: &'a MilestoneTracker,
    ) -> Self {
        Self {
            graph,
            components,
            milestones,
        }
    }

    /// Components in declaration order.
    pub fn ordered_components(&self) -> Vec<&'a Component> {
        self.components.ordered(self.graph)
    }

    pub fn summary(&self) -> Summary {
        let components = self.ordered_components();

        let status_counts = ComponentStatus::ALL
            .iter()
            .map(|status| StatusCount {
                status: *status,
                count: components.iter().filter(|c| c.status == *status).count(),
            })
            .collect();

        let overall_progress = if components.is_empty() {
            None
        } else {
            let total: u32 = components
                .iter()
                .map(|c| u32::from(c.completion_percentage))
                .sum();
            Some(f64::from(total) / components.len() as f64)
        };

        let completed_milestones = self
            .milestones
            .all()
            .filter(|m| m.status == MilestoneStatus::Completed)
            .count();

        Summary {
            total_components: components.len(),
            status_counts,
            overall_progress,
            completed_milestones,
            total_milestones: self.milestones.len(),
            blocked_components: components
                .iter()
                .filter(|c| c.status == ComponentStatus::Blocked)
                .map(|c| c.name.clone())
                .collect(),
            ready_for_production: overall_progress == Some(100.0),
        }
    }

    pub fn analyze(&self, component: &Component) -> ComponentAnalysis {
        let readiness = self.graph.readiness(&component.name, self.components);
        ComponentAnalysis {
            name: component.name.clone(),
            status: component.status,
            phase: component.phase,
            progress: component.completion_percentage,
            dependencies: self.graph.dependencies_of(&component.name).to_vec(),
            dependents: self.graph.dependents_of(&component.name),
            ready: readiness.ready,
            blockers: readiness.blockers,
        }
    }

    pub fn dependency_analysis(&self) -> Vec<ComponentAnalysis> {
        self.ordered_components()
            .into_iter()
            .map(|c| self.analyze(c))
            .collect()
    }

    /// Every issue, tagged with its component, in declaration order.
    pub fn issues(&self) -> IssueReport {
        let mut report = IssueReport::default();
        for component in self.ordered_components() {
            for (index, issue) in component.issues.iter().enumerate() {
                let issue_ref = IssueRef {
                    component: component.name.clone(),
                    index,
                    content: issue.content.clone(),
                    timestamp: issue.timestamp,
                    resolved: issue.resolved,
                    resolved_at: issue.resolved_at,
                };
                if issue.resolved {
                    report.resolved.push(issue_ref);
                } else {
                    report.open.push(issue_ref);
                }
            }
        }
        report
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tracker::NewMilestone;

    /// Build trackers for a declared graph with the given progress values.
    pub(crate) fn fixture(
        declarations: Vec<(&str, Vec<&str>)>,
        progress: &[(&str, i64)],
    ) -> (DependencyGraph, ComponentTracker, MilestoneTracker) {
        let graph = DependencyGraph::new(declarations);
        let mut components = ComponentTracker::default();
        components.bootstrap(&graph.components().to_vec());
        for (name, pct) in progress {
            components.update_progress(name, *pct, &graph).unwrap();
        }
        (graph, components, MilestoneTracker::default())
    }

    #[test]
    fn test_summary_counts_every_status_level() {
        let (graph, mut components, milestones) =
            fixture(vec![("a", vec![]), ("b", vec!["a"])], &[("a", 100), ("b", 50)]);
        components
            .update_status("b", ComponentStatus::Blocked, &graph)
            .unwrap();

        let summary = Engine::new(&graph, &components, &milestones).summary();
        assert_eq!(summary.status_counts.len(), ComponentStatus::ALL.len());
        assert_eq!(summary.count(ComponentStatus::NotStarted), 1);
        assert_eq!(summary.count(ComponentStatus::Blocked), 1);
        assert_eq!(summary.count(ComponentStatus::Completed), 0);
        assert_eq!(summary.overall_progress, Some(75.0));
        assert_eq!(summary.blocked_components, vec!["b"]);
        assert!(!summary.ready_for_production);
    }

    #[test]
    fn test_summary_without_components_has_no_progress() {
        let graph = DependencyGraph::default();
        let components = ComponentTracker::default();
        let milestones = MilestoneTracker::default();
        let summary = Engine::new(&graph, &components, &milestones).summary();
        assert_eq!(summary.overall_progress, None);
        assert!(!summary.ready_for_production);
        assert_eq!(summary.total_components, 0);
    }

    #[test]
    fn test_ready_for_production_at_100() {
        let (graph, components, mut milestones) =
            fixture(vec![("a", vec![]), ("b", vec![])], &[("a", 100), ("b", 100)]);
        milestones
            .create(
                NewMilestone {
                    name: "M".to_string(),
                    ..Default::default()
                },
                &components,
            )
            .unwrap();
        milestones.complete("M", &components).unwrap();

        let summary = Engine::new(&graph, &components, &milestones).summary();
        assert!(summary.ready_for_production);
        assert_eq!(summary.completed_milestones, 1);
        assert_eq!(summary.total_milestones, 1);
    }

    #[test]
    fn test_dependency_analysis_bundles_graph_and_state() {
        let (graph, components, milestones) = fixture(
            vec![("db", vec![]), ("api", vec!["db"]), ("ui", vec!["api"])],
            &[("db", 30)],
        );
        let analysis = Engine::new(&graph, &components, &milestones).dependency_analysis();

        let names: Vec<&str> = analysis.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["db", "api", "ui"]);

        assert!(analysis[0].ready);
        assert_eq!(analysis[0].dependents, vec!["api"]);
        assert_eq!(analysis[0].progress, 30);

        assert!(!analysis[1].ready);
        assert_eq!(analysis[1].dependencies, vec!["db"]);
        assert_eq!(analysis[1].blockers[0].name, "db");
    }

    #[test]
    fn test_issues_split_by_resolution() {
        let (graph, mut components, milestones) =
            fixture(vec![("a", vec![]), ("b", vec![])], &[]);
        components.add_issue("a", "one", &graph).unwrap();
        components.add_issue("b", "two", &graph).unwrap();
        components.resolve_issue("a", 0, &graph).unwrap();

        let issues = Engine::new(&graph, &components, &milestones).issues();
        assert_eq!(issues.open.len(), 1);
        assert_eq!(issues.open[0].component, "b");
        assert_eq!(issues.resolved.len(), 1);
        assert_eq!(issues.resolved[0].component, "a");
        assert!(issues.resolved[0].resolved_at.is_some());
    }
}
