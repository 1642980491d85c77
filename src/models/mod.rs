//! Data models for Devtrack entities.
//!
//! This module defines the core data structures:
//! - `Component` - A trackable unit with status, phase, progress, notes and issues
//! - `Milestone` - A named grouping of components with aggregate progress
//! - `ComponentStatus`, `Phase`, `MilestoneStatus` - The closed status/phase sets
//!
//! Records serialize with the camelCase field names used by the persisted
//! state documents, and status/phase values serialize as their display labels.

pub mod graph;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Component status in the workflow.
///
/// The usual flow is `Not Started -> In Progress -> {Blocked, Review} -> Completed`,
/// with `Blocked -> In Progress` as the recovery transition. Any status may be set
/// directly; the flow is advisory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentStatus {
    #[default]
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    Blocked,
    Review,
    Completed,
}

impl ComponentStatus {
    /// Every status level, in workflow order.
    pub const ALL: [ComponentStatus; 5] = [
        ComponentStatus::NotStarted,
        ComponentStatus::InProgress,
        ComponentStatus::Blocked,
        ComponentStatus::Review,
        ComponentStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentStatus::NotStarted => "Not Started",
            ComponentStatus::InProgress => "In Progress",
            ComponentStatus::Blocked => "Blocked",
            ComponentStatus::Review => "Review",
            ComponentStatus::Completed => "Completed",
        }
    }

    /// Whether a dependency in this status lets its dependents proceed.
    pub fn is_satisfied(&self) -> bool {
        matches!(self, ComponentStatus::Completed | ComponentStatus::Review)
    }
}

impl fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "notstarted" => Ok(ComponentStatus::NotStarted),
            "inprogress" => Ok(ComponentStatus::InProgress),
            "blocked" => Ok(ComponentStatus::Blocked),
            "review" => Ok(ComponentStatus::Review),
            "completed" | "done" => Ok(ComponentStatus::Completed),
            _ => Err(Error::InvalidInput(format!(
                "Invalid status '{}' (expected one of: {})",
                s,
                join_labels(ComponentStatus::ALL.iter().map(|v| v.as_str()))
            ))),
        }
    }
}

/// Development phase. Independent of status and settable freely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Planning,
    Development,
    Testing,
    Deployment,
    Maintenance,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Planning,
        Phase::Development,
        Phase::Testing,
        Phase::Deployment,
        Phase::Maintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Planning => "Planning",
            Phase::Development => "Development",
            Phase::Testing => "Testing",
            Phase::Deployment => "Deployment",
            Phase::Maintenance => "Maintenance",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_label(s);
        Phase::ALL
            .into_iter()
            .find(|phase| phase.as_str().to_lowercase() == wanted)
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "Invalid phase '{}' (expected one of: {})",
                    s,
                    join_labels(Phase::ALL.iter().map(|v| v.as_str()))
                ))
            })
    }
}

/// Milestone status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MilestoneStatus {
    #[default]
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    Delayed,
    Completed,
    Cancelled,
}

impl MilestoneStatus {
    pub const ALL: [MilestoneStatus; 5] = [
        MilestoneStatus::NotStarted,
        MilestoneStatus::InProgress,
        MilestoneStatus::Delayed,
        MilestoneStatus::Completed,
        MilestoneStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MilestoneStatus::NotStarted => "Not Started",
            MilestoneStatus::InProgress => "In Progress",
            MilestoneStatus::Delayed => "Delayed",
            MilestoneStatus::Completed => "Completed",
            MilestoneStatus::Cancelled => "Cancelled",
        }
    }

    /// Completed and cancelled milestones are no longer worked towards.
    pub fn is_closed(&self) -> bool {
        matches!(self, MilestoneStatus::Completed | MilestoneStatus::Cancelled)
    }
}

impl fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MilestoneStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "notstarted" => Ok(MilestoneStatus::NotStarted),
            "inprogress" => Ok(MilestoneStatus::InProgress),
            "delayed" => Ok(MilestoneStatus::Delayed),
            "completed" | "done" => Ok(MilestoneStatus::Completed),
            "cancelled" | "canceled" => Ok(MilestoneStatus::Cancelled),
            _ => Err(Error::InvalidInput(format!(
                "Invalid milestone status '{}' (expected one of: {})",
                s,
                join_labels(MilestoneStatus::ALL.iter().map(|v| v.as_str()))
            ))),
        }
    }
}

/// Lowercase and strip separators so "In Progress", "in_progress" and
/// "in-progress" compare equal.
fn normalize_label(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn join_labels<'a>(labels: impl Iterator<Item = &'a str>) -> String {
    labels.collect::<Vec<_>>().join(", ")
}

/// A timestamped free-text note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub timestamp: DateTime<Utc>,
    pub content: String,
}

impl Note {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            content: content.into(),
        }
    }
}

/// A timestamped issue attached to a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub timestamp: DateTime<Utc>,
    pub content: String,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Issue {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            content: content.into(),
            resolved: false,
            resolved_at: None,
        }
    }
}

/// A trackable unit of the project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Unique name, drawn from the configured component set
    pub name: String,

    #[serde(default)]
    pub status: ComponentStatus,

    #[serde(default)]
    pub phase: Phase,

    /// Always within 0..=100
    #[serde(default)]
    pub completion_percentage: u8,

    pub last_updated: DateTime<Utc>,

    #[serde(default)]
    pub notes: Vec<Note>,

    #[serde(default)]
    pub issues: Vec<Issue>,
}

impl Component {
    /// Create a component with default state (Not Started, Planning, 0%).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ComponentStatus::default(),
            phase: Phase::default(),
            completion_percentage: 0,
            last_updated: Utc::now(),
            notes: Vec::new(),
            issues: Vec::new(),
        }
    }

    /// Unresolved issues paired with their index in `issues`.
    pub fn open_issues(&self) -> impl Iterator<Item = (usize, &Issue)> {
        self.issues.iter().enumerate().filter(|(_, i)| !i.resolved)
    }

    pub fn open_issue_count(&self) -> usize {
        self.open_issues().count()
    }
}

/// A delivery goal grouping several components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub name: String,

    #[serde(default)]
    pub status: MilestoneStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Member component names, order-preserving and duplicate-free
    #[serde(default)]
    pub components: Vec<String>,

    #[serde(default)]
    pub notes: Vec<Note>,
}

impl Milestone {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: MilestoneStatus::default(),
            description: None,
            created_at: Utc::now(),
            target_date: None,
            completed_at: None,
            components: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Add members in order, skipping names already present.
    pub fn add_members<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.components.contains(&name) {
                self.components.push(name);
            }
        }
    }
}

/// Parse an ISO `YYYY-MM-DD` target date.
///
/// Unparseable input falls back to no date; the returned warning describes the
/// fallback so the caller can report it.
pub fn parse_target_date(input: &str) -> (Option<NaiveDate>, Option<String>) {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return (None, None);
    }
    match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        Ok(date) => (Some(date), None),
        Err(_) => (
            None,
            Some(format!(
                "Could not parse target date '{}' (expected YYYY-MM-DD); leaving it unset",
                trimmed
            )),
        ),
    }
}
