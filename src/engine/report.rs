//! Diagnostic report bundle.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::{ComponentAnalysis, Engine, IssueReport, Summary};
use crate::action_log::LogEntry;
use crate::models::{Component, Milestone};
use crate::tracker::milestones::milestone_progress;
use crate::Result;

/// Build metadata embedded in every report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub version: &'static str,
    pub commit: Option<&'static str>,
    pub built_at: Option<&'static str>,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            commit: option_env!("DEVTRACK_GIT_COMMIT"),
            built_at: option_env!("DEVTRACK_BUILD_TIMESTAMP"),
        }
    }
}

/// A milestone together with its computed progress.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneView {
    #[serde(flatten)]
    pub milestone: Milestone,
    pub progress: u8,
}

/// Everything known about the project at one instant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticReport {
    pub generated_at: DateTime<Utc>,
    pub build: BuildInfo,
    pub summary: Summary,
    pub components: BTreeMap<String, Component>,
    pub milestones: Vec<MilestoneView>,
    pub dependency_analysis: Vec<ComponentAnalysis>,
    pub issues: IssueReport,
    pub critical_path: Vec<String>,
    pub recent_activity: Vec<LogEntry>,
}

impl Engine<'_> {
    /// Milestones in name order with their progress.
    pub fn milestone_views(&self) -> Vec<MilestoneView> {
        self.milestones
            .all()
            .map(|m| MilestoneView {
                milestone: m.clone(),
                progress: milestone_progress(m, self.components),
            })
            .collect()
    }

    /// Assemble a report. `recent_activity` is included as given.
    pub fn diagnostic_report(&self, recent_activity: Vec<LogEntry>) -> Result<DiagnosticReport> {
        Ok(DiagnosticReport {
            generated_at: Utc::now(),
            build: BuildInfo::current(),
            summary: self.summary(),
            components: self.components.records().clone(),
            milestones: self.milestone_views(),
            dependency_analysis: self.dependency_analysis(),
            issues: self.issues(),
            critical_path: super::critical_path(self.graph, self.components)?,
            recent_activity,
        })
    }
}
