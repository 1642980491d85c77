//! Component tracker.

use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::graph::{Blocker, ComponentLookup, DependencyGraph, Readiness};
use crate::models::{Component, ComponentStatus, Issue, Note, Phase};
use crate::{Error, Result};

/// A single field-level mutation of a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentUpdate {
    Status(ComponentStatus),
    Phase(Phase),
    /// Raw percentage; clamped to 0..=100 when applied
    Progress(i64),
    Note(String),
    Issue(String),
    /// Index into the component's issue list
    ResolveIssue(usize),
}

impl ComponentUpdate {
    /// Action label recorded in the activity log.
    pub fn action(&self) -> &'static str {
        match self {
            ComponentUpdate::Status(_) => "status",
            ComponentUpdate::Phase(_) => "phase",
            ComponentUpdate::Progress(_) => "progress",
            ComponentUpdate::Note(_) => "note",
            ComponentUpdate::Issue(_) => "issue",
            ComponentUpdate::ResolveIssue(_) => "resolve-issue",
        }
    }
}

/// An optional transition offered to the caller after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUp {
    /// Progress reached 100%; offer to mark the component Completed
    OfferCompletion,
    /// The last open issue of a Blocked component was resolved; offer In Progress
    OfferResume,
}

impl FollowUp {
    /// The status the follow-up would transition to.
    pub fn target_status(&self) -> ComponentStatus {
        match self {
            FollowUp::OfferCompletion => ComponentStatus::Completed,
            FollowUp::OfferResume => ComponentStatus::InProgress,
        }
    }

    /// Question put to the operator.
    pub fn question(&self, component: &str) -> String {
        match self {
            FollowUp::OfferCompletion => {
                format!("{} reached 100%. Mark it as Completed?", component)
            }
            FollowUp::OfferResume => {
                format!("All issues on {} are resolved. Move it back to In Progress?", component)
            }
        }
    }
}

/// Result of applying one update.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    /// The component after the update
    pub component: Component,

    /// Activity log action label
    pub action: String,

    /// Activity log details
    pub details: String,

    /// Unsatisfied dependencies when moving to In Progress
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blockers: Vec<Blocker>,

    /// Optional transition the caller may confirm
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<FollowUp>,

    /// Recoveries applied while updating (e.g. clamping)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Clamp a raw percentage into 0..=100.
pub fn clamp_percentage(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}

/// Parse a user-supplied percentage.
///
/// Integers parse as-is, decimals are truncated, anything else is treated as 0.
/// The warning describes the fallback when the input was not numeric.
pub fn parse_percentage(input: &str) -> (i64, Option<String>) {
    let trimmed = input.trim().trim_end_matches('%');
    if let Ok(n) = trimmed.parse::<i64>() {
        return (n, None);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() {
            return (f.trunc() as i64, None);
        }
    }
    (
        0,
        Some(format!("'{}' is not a number; treating progress as 0", input)),
    )
}

/// Holds every component record for the session.
#[derive(Debug, Clone, Default)]
pub struct ComponentTracker {
    components: BTreeMap<String, Component>,
}

impl ComponentLookup for ComponentTracker {
    fn status_of(&self, name: &str) -> Option<ComponentStatus> {
        self.components.get(name).map(|c| c.status)
    }

    fn progress_of(&self, name: &str) -> Option<u8> {
        self.components.get(name).map(|c| c.completion_percentage)
    }
}

impl ComponentTracker {
    /// Wrap loaded records, pulling any out-of-range progress back to 100.
    pub fn new(mut components: BTreeMap<String, Component>) -> Self {
        for component in components.values_mut() {
            if component.completion_percentage > 100 {
                tracing::warn!(
                    component = %component.name,
                    raw = component.completion_percentage,
                    "clamped stored progress"
                );
                component.completion_percentage = 100;
            }
        }
        Self { components }
    }

    /// Ensure every configured component has a record.
    ///
    /// Returns the names of the records created with default state.
    pub fn bootstrap(&mut self, names: &[String]) -> Vec<String> {
        let mut created = Vec::new();
        for name in names {
            if !self.components.contains_key(name) {
                self.components
                    .insert(name.clone(), Component::new(name.clone()));
                created.push(name.clone());
            }
        }
        created
    }

    pub fn get(&self, name: &str) -> Result<&Component> {
        self.components
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("Component not found: {}", name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// The persisted form: component name to record.
    pub fn records(&self) -> &BTreeMap<String, Component> {
        &self.components
    }

    /// Components in graph declaration order, followed by any tracked
    /// components the graph does not declare (in name order).
    pub fn ordered<'a>(&'a self, graph: &DependencyGraph) -> Vec<&'a Component> {
        let mut ordered: Vec<&Component> = graph
            .components()
            .iter()
            .filter_map(|name| self.components.get(name))
            .collect();
        ordered.extend(
            self.components
                .values()
                .filter(|c| !graph.contains(&c.name)),
        );
        ordered
    }

    /// Readiness of a component that exists in the tracker.
    pub fn readiness(&self, name: &str, graph: &DependencyGraph) -> Result<Readiness> {
        self.get(name)?;
        Ok(graph.readiness(name, self))
    }

    /// Apply one update.
    ///
    /// Validation happens before anything is changed, so a failed update
    /// leaves the record untouched. `last_updated` is refreshed on success.
    pub fn apply(
        &mut self,
        name: &str,
        update: ComponentUpdate,
        graph: &DependencyGraph,
    ) -> Result<UpdateOutcome> {
        let blockers = match update {
            ComponentUpdate::Status(ComponentStatus::InProgress) => {
                self.readiness(name, graph)?.blockers
            }
            _ => Vec::new(),
        };

        let component = self
            .components
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(format!("Component not found: {}", name)))?;

        let mut warnings = Vec::new();
        let mut follow_up = None;
        let action = update.action().to_string();

        let details = match update {
            ComponentUpdate::Status(status) => {
                let previous = component.status;
                component.status = status;
                format!("{} -> {}", previous, status)
            }
            ComponentUpdate::Phase(phase) => {
                let previous = component.phase;
                component.phase = phase;
                format!("{} -> {}", previous, phase)
            }
            ComponentUpdate::Progress(raw) => {
                let value = clamp_percentage(raw);
                if i64::from(value) != raw {
                    tracing::warn!(component = name, raw, clamped = value, "clamped progress");
                    warnings.push(format!("Progress {} is out of range; clamped to {}%", raw, value));
                }
                let previous = component.completion_percentage;
                component.completion_percentage = value;
                if value == 100 && component.status != ComponentStatus::Completed {
                    follow_up = Some(FollowUp::OfferCompletion);
                }
                format!("{}% -> {}%", previous, value)
            }
            ComponentUpdate::Note(content) => {
                component.notes.push(Note::new(content.clone()));
                content
            }
            ComponentUpdate::Issue(content) => {
                component.issues.push(Issue::new(content.clone()));
                content
            }
            ComponentUpdate::ResolveIssue(index) => {
                let len = component.issues.len();
                let issue = component
                    .issues
                    .get_mut(index)
                    .ok_or(Error::IndexOutOfRange { index, len })?;
                if issue.resolved {
                    return Err(Error::InvalidInput(format!(
                        "Issue {} is already resolved",
                        index
                    )));
                }
                issue.resolved = true;
                issue.resolved_at = Some(Utc::now());
                let content = issue.content.clone();
                if component.open_issue_count() == 0
                    && component.status == ComponentStatus::Blocked
                {
                    follow_up = Some(FollowUp::OfferResume);
                }
                format!("#{}: {}", index, content)
            }
        };

        component.last_updated = Utc::now();

        Ok(UpdateOutcome {
            component: component.clone(),
            action,
            details,
            blockers,
            follow_up,
            warnings,
        })
    }

    pub fn update_status(
        &mut self,
        name: &str,
        status: ComponentStatus,
        graph: &DependencyGraph,
    ) -> Result<UpdateOutcome> {
        self.apply(name, ComponentUpdate::Status(status), graph)
    }

    pub fn update_phase(
        &mut self,
        name: &str,
        phase: Phase,
        graph: &DependencyGraph,
    ) -> Result<UpdateOutcome> {
        self.apply(name, ComponentUpdate::Phase(phase), graph)
    }

    pub fn update_progress(
        &mut self,
        name: &str,
        percentage: i64,
        graph: &DependencyGraph,
    ) -> Result<UpdateOutcome> {
        self.apply(name, ComponentUpdate::Progress(percentage), graph)
    }

    pub fn add_note(
        &mut self,
        name: &str,
        text: &str,
        graph: &DependencyGraph,
    ) -> Result<UpdateOutcome> {
        self.apply(name, ComponentUpdate::Note(text.to_string()), graph)
    }

    pub fn add_issue(
        &mut self,
        name: &str,
        text: &str,
        graph: &DependencyGraph,
    ) -> Result<UpdateOutcome> {
        self.apply(name, ComponentUpdate::Issue(text.to_string()), graph)
    }

    pub fn resolve_issue(
        &mut self,
        name: &str,
        index: usize,
        graph: &DependencyGraph,
    ) -> Result<UpdateOutcome> {
        self.apply(name, ComponentUpdate::ResolveIssue(index), graph)
    }
}
