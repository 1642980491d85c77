//! Milestone tracker and progress roll-up.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::MilestoneConfig;
use crate::models::graph::ComponentLookup;
use crate::models::{Milestone, MilestoneStatus, Note};
use crate::{Error, Result};

/// Parameters for creating a milestone.
#[derive(Debug, Clone, Default)]
pub struct NewMilestone {
    pub name: String,
    pub target_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub components: Vec<String>,
}

impl From<&MilestoneConfig> for NewMilestone {
    fn from(config: &MilestoneConfig) -> Self {
        Self {
            name: config.name.clone(),
            target_date: config.target_date,
            description: config.description.clone(),
            components: config.components.clone(),
        }
    }
}

/// A single field-level mutation of a milestone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MilestoneUpdate {
    /// Setting `Completed` stamps `completed_at`; any other status clears it
    Status(MilestoneStatus),
    TargetDate(Option<NaiveDate>),
    Description(Option<String>),
    AddComponents(Vec<String>),
    RemoveComponents(Vec<String>),
    ReplaceComponents(Vec<String>),
    Note(String),
}

impl MilestoneUpdate {
    /// Action label recorded in the activity log.
    pub fn action(&self) -> &'static str {
        match self {
            MilestoneUpdate::Status(MilestoneStatus::Completed) => "milestone-complete",
            MilestoneUpdate::Status(_) => "milestone-status",
            MilestoneUpdate::TargetDate(_) => "milestone-target-date",
            MilestoneUpdate::Description(_) => "milestone-description",
            MilestoneUpdate::AddComponents(_) => "milestone-add-components",
            MilestoneUpdate::RemoveComponents(_) => "milestone-remove-components",
            MilestoneUpdate::ReplaceComponents(_) => "milestone-set-components",
            MilestoneUpdate::Note(_) => "milestone-note",
        }
    }
}

/// Result of applying one milestone update.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneOutcome {
    pub milestone: Milestone,
    pub action: String,
    pub details: String,
}

/// Rounded mean completion of a milestone's members.
///
/// Members the lookup does not know contribute 0. No members yields 0.
pub fn milestone_progress(milestone: &Milestone, lookup: &dyn ComponentLookup) -> u8 {
    if milestone.components.is_empty() {
        return 0;
    }
    let total: u32 = milestone
        .components
        .iter()
        .map(|name| u32::from(lookup.progress_of(name).unwrap_or(0)))
        .sum();
    (f64::from(total) / milestone.components.len() as f64).round() as u8
}

/// Holds every milestone record for the session.
#[derive(Debug, Clone, Default)]
pub struct MilestoneTracker {
    milestones: BTreeMap<String, Milestone>,
}

impl MilestoneTracker {
    pub fn new(milestones: BTreeMap<String, Milestone>) -> Self {
        Self { milestones }
    }

    /// Create configured default milestones that are missing.
    ///
    /// Existing milestones are never overwritten. Returns the names created.
    pub fn bootstrap(&mut self, defaults: &[MilestoneConfig]) -> Vec<String> {
        let mut created = Vec::new();
        for config in defaults {
            if self.milestones.contains_key(&config.name) {
                continue;
            }
            self.milestones
                .insert(config.name.clone(), build_milestone(NewMilestone::from(config)));
            created.push(config.name.clone());
        }
        created
    }

    pub fn get(&self, name: &str) -> Result<&Milestone> {
        self.milestones
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("Milestone not found: {}", name)))
    }

    /// The persisted form: milestone name to record.
    pub fn records(&self) -> &BTreeMap<String, Milestone> {
        &self.milestones
    }

    pub fn all(&self) -> impl Iterator<Item = &Milestone> {
        self.milestones.values()
    }

    pub fn len(&self) -> usize {
        self.milestones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.milestones.is_empty()
    }

    /// Create a milestone.
    ///
    /// Fails with `AlreadyExists` if the name is taken and `NotFound` if a
    /// member is not a tracked component.
    pub fn create(&mut self, new: NewMilestone, lookup: &dyn ComponentLookup) -> Result<&Milestone> {
        if new.name.trim().is_empty() {
            return Err(Error::InvalidInput("milestone name must not be empty".to_string()));
        }
        if self.milestones.contains_key(&new.name) {
            return Err(Error::AlreadyExists(format!("Milestone already exists: {}", new.name)));
        }
        ensure_known(&new.components, lookup)?;

        let name = new.name.clone();
        let milestone = build_milestone(new);
        Ok(self.milestones.entry(name).or_insert(milestone))
    }

    /// Apply one update. Validation happens before anything is changed.
    pub fn apply(
        &mut self,
        name: &str,
        update: MilestoneUpdate,
        lookup: &dyn ComponentLookup,
    ) -> Result<MilestoneOutcome> {
        let milestone = self
            .milestones
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(format!("Milestone not found: {}", name)))?;

        match &update {
            MilestoneUpdate::AddComponents(names) | MilestoneUpdate::ReplaceComponents(names) => {
                ensure_known(names, lookup)?;
            }
            MilestoneUpdate::RemoveComponents(names) => {
                if let Some(missing) = names.iter().find(|n| !milestone.components.contains(*n)) {
                    return Err(Error::NotFound(format!(
                        "Component {} is not part of milestone {}",
                        missing, name
                    )));
                }
            }
            _ => {}
        }

        let action = update.action().to_string();
        let details = match update {
            MilestoneUpdate::Status(status) => {
                let previous = milestone.status;
                milestone.status = status;
                milestone.completed_at = if status == MilestoneStatus::Completed {
                    Some(Utc::now())
                } else {
                    None
                };
                format!("{} -> {}", previous, status)
            }
            MilestoneUpdate::TargetDate(date) => {
                milestone.target_date = date;
                match date {
                    Some(date) => format!("target date {}", date.format("%Y-%m-%d")),
                    None => "target date cleared".to_string(),
                }
            }
            MilestoneUpdate::Description(description) => {
                milestone.description = description;
                "description updated".to_string()
            }
            MilestoneUpdate::AddComponents(names) => {
                milestone.add_members(names.iter().cloned());
                format!("added {}", names.join(", "))
            }
            MilestoneUpdate::RemoveComponents(names) => {
                milestone.components.retain(|c| !names.contains(c));
                format!("removed {}", names.join(", "))
            }
            MilestoneUpdate::ReplaceComponents(names) => {
                milestone.components.clear();
                milestone.add_members(names.iter().cloned());
                format!("components set to {}", milestone.components.join(", "))
            }
            MilestoneUpdate::Note(content) => {
                milestone.notes.push(Note::new(content.clone()));
                content
            }
        };

        Ok(MilestoneOutcome {
            milestone: milestone.clone(),
            action,
            details,
        })
    }

    /// Mark a milestone Completed regardless of its progress.
    pub fn complete(&mut self, name: &str, lookup: &dyn ComponentLookup) -> Result<MilestoneOutcome> {
        self.apply(name, MilestoneUpdate::Status(MilestoneStatus::Completed), lookup)
    }

    pub fn add_note(
        &mut self,
        name: &str,
        text: &str,
        lookup: &dyn ComponentLookup,
    ) -> Result<MilestoneOutcome> {
        self.apply(name, MilestoneUpdate::Note(text.to_string()), lookup)
    }

    /// Rounded mean completion of the milestone's members.
    pub fn calculate_progress(&self, name: &str, lookup: &dyn ComponentLookup) -> Result<u8> {
        Ok(milestone_progress(self.get(name)?, lookup))
    }
}

fn build_milestone(new: NewMilestone) -> Milestone {
    let mut milestone = Milestone::new(new.name);
    milestone.target_date = new.target_date;
    milestone.description = new.description;
    milestone.add_members(new.components);
    milestone
}

fn ensure_known(names: &[String], lookup: &dyn ComponentLookup) -> Result<()> {
    match names.iter().find(|n| lookup.status_of(n).is_none()) {
        Some(missing) => Err(Error::NotFound(format!("Component not found: {}", missing))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::graph::DependencyGraph;
    use crate::tracker::ComponentTracker;

    fn components() -> (ComponentTracker, DependencyGraph) {
        let graph = DependencyGraph::new(vec![("a", vec![]), ("b", vec![]), ("c", vec![])]);
        let mut tracker = ComponentTracker::default();
        tracker.bootstrap(&graph.components().to_vec());
        tracker.update_progress("a", 50, &graph).unwrap();
        tracker.update_progress("b", 25, &graph).unwrap();
        tracker.update_progress("c", 100, &graph).unwrap();
        (tracker, graph)
    }

    fn new_milestone(name: &str, members: &[&str]) -> NewMilestone {
        NewMilestone {
            name: name.to_string(),
            components: members.iter().map(|m| m.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_progress_is_rounded_mean() {
        let (tracker, _graph) = components();
        let mut milestones = MilestoneTracker::default();
        milestones
            .create(new_milestone("M", &["a", "b"]), &tracker)
            .unwrap();
        // (50 + 25) / 2 = 37.5 rounds to 38
        assert_eq!(milestones.calculate_progress("M", &tracker).unwrap(), 38);
    }

    #[test]
    fn test_progress_empty_membership_is_zero() {
        let (tracker, _graph) = components();
        let mut milestones = MilestoneTracker::default();
        milestones.create(new_milestone("M", &[]), &tracker).unwrap();
        assert_eq!(milestones.calculate_progress("M", &tracker).unwrap(), 0);
    }

    #[test]
    fn test_missing_member_contributes_zero() {
        let (tracker, _graph) = components();
        let mut milestone = Milestone::new("M");
        milestone.add_members(["c", "ghost"]);
        assert_eq!(milestone_progress(&milestone, &tracker), 50);
    }

    #[test]
    fn test_create_rejects_duplicates_and_unknown_members() {
        let (tracker, _graph) = components();
        let mut milestones = MilestoneTracker::default();
        milestones.create(new_milestone("M", &["a"]), &tracker).unwrap();

        let err = milestones
            .create(new_milestone("M", &["b"]), &tracker)
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));

        let err = milestones
            .create(new_milestone("N", &["zzz"]), &tracker)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(milestones.get("N").is_err());
    }

    #[test]
    fn test_complete_stamps_completed_at_regardless_of_progress() {
        let (tracker, _graph) = components();
        let mut milestones = MilestoneTracker::default();
        milestones.create(new_milestone("M", &["b"]), &tracker).unwrap();

        let outcome = milestones.complete("M", &tracker).unwrap();
        assert_eq!(outcome.milestone.status, MilestoneStatus::Completed);
        assert!(outcome.milestone.completed_at.is_some());
        assert_eq!(outcome.action, "milestone-complete");

        let outcome = milestones
            .apply("M", MilestoneUpdate::Status(MilestoneStatus::InProgress), &tracker)
            .unwrap();
        assert!(outcome.milestone.completed_at.is_none());
    }

    #[test]
    fn test_membership_updates() {
        let (tracker, _graph) = components();
        let mut milestones = MilestoneTracker::default();
        milestones.create(new_milestone("M", &["a"]), &tracker).unwrap();

        milestones
            .apply(
                "M",
                MilestoneUpdate::AddComponents(vec!["b".into(), "a".into()]),
                &tracker,
            )
            .unwrap();
        assert_eq!(milestones.get("M").unwrap().components, vec!["a", "b"]);

        milestones
            .apply("M", MilestoneUpdate::RemoveComponents(vec!["a".into()]), &tracker)
            .unwrap();
        assert_eq!(milestones.get("M").unwrap().components, vec!["b"]);

        milestones
            .apply(
                "M",
                MilestoneUpdate::ReplaceComponents(vec!["c".into(), "a".into()]),
                &tracker,
            )
            .unwrap();
        assert_eq!(milestones.get("M").unwrap().components, vec!["c", "a"]);
    }

    #[test]
    fn test_failed_membership_update_leaves_state_untouched() {
        let (tracker, _graph) = components();
        let mut milestones = MilestoneTracker::default();
        milestones.create(new_milestone("M", &["a"]), &tracker).unwrap();
        let before = milestones.get("M").unwrap().clone();

        assert!(milestones
            .apply("M", MilestoneUpdate::AddComponents(vec!["ghost".into()]), &tracker)
            .is_err());
        assert!(milestones
            .apply("M", MilestoneUpdate::RemoveComponents(vec!["b".into()]), &tracker)
            .is_err());
        assert_eq!(milestones.get("M").unwrap(), &before);
    }

    #[test]
    fn test_unknown_milestone_is_not_found() {
        let (tracker, _graph) = components();
        let mut milestones = MilestoneTracker::default();
        assert!(matches!(
            milestones.add_note("nope", "x", &tracker),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            milestones.calculate_progress("nope", &tracker),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_bootstrap_keeps_existing() {
        let (tracker, _graph) = components();
        let mut milestones = MilestoneTracker::default();
        milestones.create(new_milestone("M", &["a"]), &tracker).unwrap();

        let defaults = vec![
            MilestoneConfig {
                name: "M".to_string(),
                target_date: None,
                description: None,
                components: vec!["b".to_string()],
            },
            MilestoneConfig {
                name: "N".to_string(),
                target_date: NaiveDate::from_ymd_opt(2027, 1, 1),
                description: Some("next".to_string()),
                components: vec!["c".to_string()],
            },
        ];
        let created = milestones.bootstrap(&defaults);
        assert_eq!(created, vec!["N"]);
        assert_eq!(milestones.get("M").unwrap().components, vec!["a"]);
        assert_eq!(milestones.get("N").unwrap().description.as_deref(), Some("next"));
    }
}
