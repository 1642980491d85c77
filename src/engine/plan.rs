//! Next-step recommendations.

use chrono::NaiveDate;
use serde::Serialize;

use super::{Engine, IssueRef};
use crate::models::{ComponentStatus, Milestone};
use crate::tracker::milestones::milestone_progress;

/// A blocked component and what is blocking it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedItem {
    pub name: String,
    pub progress: u8,
    pub open_issues: Vec<IssueRef>,
}

/// A component whose dependencies are satisfied and that can move forward.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyItem {
    pub name: String,
    pub status: ComponentStatus,
    pub progress: u8,
    pub on_critical_path: bool,
}

/// An unfinished member of the upcoming milestone.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusComponent {
    pub name: String,
    pub status: ComponentStatus,
    pub progress: u8,
}

/// The nearest upcoming milestone and its remaining work.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneFocus {
    pub name: String,
    pub target_date: NaiveDate,
    pub progress: u8,
    pub remaining: Vec<FocusComponent>,
}

/// Three-part recommendation list. Every part is always present.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations {
    pub blocked: Vec<BlockedItem>,
    pub ready: Vec<ReadyItem>,
    pub next_milestone: Option<MilestoneFocus>,
}

impl Engine<'_> {
    /// Build recommendations relative to `today`.
    ///
    /// `critical_path` is the already-derived path, used to rank ready work.
    pub fn recommendations(&self, critical_path: &[String], today: NaiveDate) -> Recommendations {
        let issues = self.issues();

        let blocked = self
            .ordered_components()
            .into_iter()
            .filter(|c| c.status == ComponentStatus::Blocked)
            .map(|c| BlockedItem {
                name: c.name.clone(),
                progress: c.completion_percentage,
                open_issues: issues
                    .open
                    .iter()
                    .filter(|i| i.component == c.name)
                    .cloned()
                    .collect(),
            })
            .collect();

        let mut ready: Vec<ReadyItem> = self
            .dependency_analysis()
            .into_iter()
            .filter(|a| {
                a.ready && !matches!(a.status, ComponentStatus::Completed | ComponentStatus::Blocked)
            })
            .map(|a| ReadyItem {
                on_critical_path: critical_path.contains(&a.name),
                name: a.name,
                status: a.status,
                progress: a.progress,
            })
            .collect();
        ready.sort_by(|a, b| {
            b.on_critical_path
                .cmp(&a.on_critical_path)
                .then(b.progress.cmp(&a.progress))
        });

        Recommendations {
            blocked,
            ready,
            next_milestone: self.next_milestone(today).map(|m| self.focus(m)),
        }
    }

    /// Earliest open milestone dated today or later. Name breaks date ties.
    pub fn next_milestone(&self, today: NaiveDate) -> Option<&Milestone> {
        self.milestones
            .all()
            .filter(|m| !m.status.is_closed())
            .filter_map(|m| m.target_date.filter(|d| *d >= today).map(|d| (d, m)))
            .min_by_key(|(date, _)| *date)
            .map(|(_, m)| m)
    }

    fn focus(&self, milestone: &Milestone) -> MilestoneFocus {
        let mut remaining: Vec<FocusComponent> = milestone
            .components
            .iter()
            .filter_map(|name| self.components.get(name).ok())
            .filter(|c| c.status != ComponentStatus::Completed)
            .map(|c| FocusComponent {
                name: c.name.clone(),
                status: c.status,
                progress: c.completion_percentage,
            })
            .collect();
        remaining.sort_by(|a, b| b.progress.cmp(&a.progress));

        MilestoneFocus {
            name: milestone.name.clone(),
            // Only dated milestones are ever focused
            target_date: milestone.target_date.unwrap_or(NaiveDate::MIN),
            progress: milestone_progress(milestone, self.components),
            remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::fixture;
    use crate::models::MilestoneStatus;
    use crate::tracker::{MilestoneUpdate, NewMilestone};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_blocked_components_carry_open_issues() {
        let (graph, mut components, milestones) =
            fixture(vec![("a", vec![]), ("b", vec![])], &[]);
        components
            .update_status("a", ComponentStatus::Blocked, &graph)
            .unwrap();
        components.add_issue("a", "waiting on vendor", &graph).unwrap();
        components.add_issue("a", "fixed already", &graph).unwrap();
        components.resolve_issue("a", 1, &graph).unwrap();

        let engine = Engine::new(&graph, &components, &milestones);
        let recs = engine.recommendations(&[], date("2026-01-01"));
        assert_eq!(recs.blocked.len(), 1);
        assert_eq!(recs.blocked[0].name, "a");
        assert_eq!(recs.blocked[0].open_issues.len(), 1);
        assert_eq!(recs.blocked[0].open_issues[0].content, "waiting on vendor");
        assert!(recs.ready.iter().all(|r| r.name != "a"));
    }

    #[test]
    fn test_ready_sorted_by_critical_path_then_progress() {
        let (graph, mut components, milestones) = fixture(
            vec![("a", vec![]), ("b", vec![]), ("c", vec![]), ("d", vec!["a"])],
            &[("a", 10), ("b", 60), ("c", 30)],
        );
        components
            .update_status("c", ComponentStatus::Completed, &graph)
            .unwrap();

        let engine = Engine::new(&graph, &components, &milestones);
        let path = vec!["a".to_string(), "d".to_string()];
        let recs = engine.recommendations(&path, date("2026-01-01"));

        let names: Vec<&str> = recs.ready.iter().map(|r| r.name.as_str()).collect();
        // d is not ready: a is neither Completed nor Review
        assert_eq!(names, vec!["a", "b"]);
        assert!(recs.ready[0].on_critical_path);
        assert!(!recs.ready[1].on_critical_path);
    }

    #[test]
    fn test_next_milestone_skips_past_and_closed() {
        let (graph, mut components, mut milestones) = fixture(
            vec![("a", vec![]), ("b", vec![]), ("c", vec![])],
            &[("a", 40), ("b", 90)],
        );
        components
            .update_status("c", ComponentStatus::Completed, &graph)
            .unwrap();

        for (name, target) in [
            ("Past", "2025-06-01"),
            ("Cancelled", "2026-02-01"),
            ("Later", "2026-09-01"),
            ("Soon", "2026-03-01"),
        ] {
            milestones
                .create(
                    NewMilestone {
                        name: name.to_string(),
                        target_date: Some(date(target)),
                        components: vec!["a".to_string(), "b".to_string(), "c".to_string()],
                        ..Default::default()
                    },
                    &components,
                )
                .unwrap();
        }
        milestones
            .apply(
                "Cancelled",
                MilestoneUpdate::Status(MilestoneStatus::Cancelled),
                &components,
            )
            .unwrap();

        let engine = Engine::new(&graph, &components, &milestones);
        let recs = engine.recommendations(&[], date("2026-01-15"));
        let focus = recs.next_milestone.unwrap();
        assert_eq!(focus.name, "Soon");
        assert_eq!(focus.target_date, date("2026-03-01"));
        let remaining: Vec<&str> = focus.remaining.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(remaining, vec!["b", "a"]);
        assert_eq!(focus.progress, 43);
    }

    #[test]
    fn test_milestone_due_today_is_upcoming() {
        let (graph, components, mut milestones) = fixture(vec![("a", vec![])], &[]);
        milestones
            .create(
                NewMilestone {
                    name: "Today".to_string(),
                    target_date: Some(date("2026-05-05")),
                    ..Default::default()
                },
                &components,
            )
            .unwrap();
        let engine = Engine::new(&graph, &components, &milestones);
        assert_eq!(
            engine.next_milestone(date("2026-05-05")).map(|m| m.name.as_str()),
            Some("Today")
        );
        assert!(engine.next_milestone(date("2026-05-06")).is_none());
    }

    #[test]
    fn test_empty_state_yields_empty_parts() {
        let (graph, components, milestones) = fixture(vec![], &[]);
        let engine = Engine::new(&graph, &components, &milestones);
        let recs = engine.recommendations(&[], date("2026-01-01"));
        assert!(recs.blocked.is_empty());
        assert!(recs.ready.is_empty());
        assert!(recs.next_milestone.is_none());
    }
}
