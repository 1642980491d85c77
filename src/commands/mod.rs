//! Command implementations for the Devtrack CLI.
//!
//! This module contains the business logic for each CLI command. Every command
//! operates on a [`Workspace`]: configuration, dependency graph, storage and
//! the two trackers, loaded once per process. Commands are organized by area:
//! - `init` - Bootstrap state from configuration
//! - `status` - Project summary and component detail
//! - `log` - Component updates
//! - `dependencies` - Readiness analysis and DOT export
//! - `milestone` - Milestone management
//! - `plan` - Critical path and recommendations
//! - `diagnose` - Diagnostic report artifacts
//! - `activity` - Recent activity log entries

mod activity;
mod dependencies;
mod diagnose;
mod init;
mod log;
mod milestone;
mod plan;
mod status;

pub use activity::{ActivityResult, activity};
pub use dependencies::{DependenciesResult, dependencies};
pub use diagnose::{DiagnoseResult, diagnose};
pub use init::{InitResult, init};
pub use log::{FollowUpResult, LogRequest, LogResult, log_component};
pub use milestone::{
    MemberRow, MembershipChange, MilestoneChanged, MilestoneCompleted, MilestoneDetail,
    MilestoneEdit, MilestoneList, milestone_add, milestone_complete, milestone_components,
    milestone_list, milestone_note, milestone_show, milestone_update,
};
pub use plan::{PlanResult, plan};
pub use status::{ComponentDetail, ComponentRow, StatusResult, status};

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::action_log::{ActivityLog, LogEntry};
use crate::config::{self, LoadedConfig};
use crate::engine::Engine;
use crate::models::graph::DependencyGraph;
use crate::storage::Storage;
use crate::tracker::{ComponentTracker, MilestoneTracker};
use crate::Result;

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

/// Compact JSON for a command result.
pub(crate) fn json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
}

/// Everything a command needs, loaded once per process.
pub struct Workspace {
    pub repo_path: PathBuf,
    pub config: LoadedConfig,
    pub graph: DependencyGraph,
    pub storage: Storage,
    pub components: ComponentTracker,
    pub milestones: MilestoneTracker,

    /// Components created from configuration while opening
    pub created_components: Vec<String>,

    /// Default milestones created from configuration while opening
    pub created_milestones: Vec<String>,
}

impl Workspace {
    /// Open the workspace for a repository using the default data directory.
    pub fn open(repo_path: &Path) -> Result<Self> {
        let storage = Storage::open(repo_path)?;
        Self::load(repo_path, storage)
    }

    /// Open the workspace with state stored under `data_dir`.
    pub fn open_with_data_dir(repo_path: &Path, data_dir: &Path) -> Result<Self> {
        let storage = Storage::open_with_data_dir(repo_path, data_dir)?;
        Self::load(repo_path, storage)
    }

    /// Load configuration and state, then create any configured records that
    /// are missing. Newly created records are persisted and logged right away.
    fn load(repo_path: &Path, storage: Storage) -> Result<Self> {
        let config = config::load(repo_path)?;
        let graph = config.config.graph();

        let mut components = ComponentTracker::new(storage.load_components()?);
        let mut milestones = MilestoneTracker::new(storage.load_milestones()?);

        let names: Vec<String> = graph.components().to_vec();
        let created_components = components.bootstrap(&names);
        let created_milestones = milestones.bootstrap(&config.config.milestones);

        let mut workspace = Self {
            repo_path: repo_path.to_path_buf(),
            config,
            graph,
            storage,
            components,
            milestones,
            created_components,
            created_milestones,
        };

        if !workspace.created_components.is_empty() || !workspace.created_milestones.is_empty() {
            workspace.persist()?;
            for name in &workspace.created_components {
                workspace.record(name, "created", "component initialized from configuration");
            }
            for name in &workspace.created_milestones {
                workspace.record(name, "milestone-created", "milestone initialized from configuration");
            }
        }

        tracing::debug!(
            repo = %workspace.repo_path.display(),
            data = %workspace.storage.root().display(),
            components = workspace.components.len(),
            milestones = workspace.milestones.len(),
            "opened workspace"
        );
        Ok(workspace)
    }

    /// Read-only engine over the current state.
    pub fn engine(&self) -> Engine<'_> {
        Engine::new(&self.graph, &self.components, &self.milestones)
    }

    /// Write both state documents.
    pub fn persist(&mut self) -> Result<()> {
        self.storage.save_components(self.components.records())?;
        self.storage.save_milestones(self.milestones.records())?;
        Ok(())
    }

    pub fn activity_log(&self) -> ActivityLog {
        self.storage.activity_log()
    }

    /// Append an activity entry. Never fails.
    pub fn record(&self, target: &str, action: &str, details: &str) -> LogEntry {
        self.activity_log().record(target, action, details)
    }
}

/// Render `value` as a fixed-width bar for human output.
pub(crate) fn progress_bar(value: u8) -> String {
    const WIDTH: usize = 20;
    let filled = usize::from(value.min(100)) * WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(WIDTH - filled))
}

/// Render warnings as indented lines for human output.
pub(crate) fn push_warnings(lines: &mut Vec<String>, warnings: &[String]) {
    for warning in warnings {
        lines.push(format!("  warning: {}", warning));
    }
}
