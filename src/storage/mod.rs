//! Storage layer for Devtrack data.
//!
//! State lives outside the repository, under
//! `~/.local/share/devtrack/<repo-hash>/` (or `$DEVTRACK_DATA_DIR/<repo-hash>/`):
//!
//! - `components.json` - map of component name to Component record
//! - `milestones.json` - map of milestone name to Milestone record
//! - `logs/` - day-partitioned activity log (see [`crate::action_log`])
//! - `reports/` - timestamped diagnostic report artifacts
//! - `dependency-graph.dot` - dependency graph visualization
//!
//! State documents are rewritten whole after every mutation; writes go through a
//! temporary file in the same directory and are renamed into place.

use crate::action_log::ActivityLog;
use crate::models::{Component, Milestone};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Environment variable overriding the base data directory.
pub const DATA_DIR_ENV: &str = "DEVTRACK_DATA_DIR";

pub const COMPONENTS_FILE: &str = "components.json";
pub const MILESTONES_FILE: &str = "milestones.json";
pub const LOGS_DIR: &str = "logs";
pub const REPORTS_DIR: &str = "reports";
pub const GRAPH_FILE: &str = "dependency-graph.dot";

/// Storage manager for a single repository.
#[derive(Debug, Clone)]
pub struct Storage {
    /// Root directory for this repository's data
    pub root: PathBuf,
}

impl Storage {
    /// Open storage for the given repository, creating the directory if needed.
    pub fn open(repo_path: &Path) -> Result<Self> {
        let root = get_storage_dir(repo_path)?;
        Self::open_at(root)
    }

    /// Open storage under an explicit base data directory.
    pub fn open_with_data_dir(repo_path: &Path, data_dir: &Path) -> Result<Self> {
        let root = data_dir.join(repo_hash(repo_path)?);
        Self::open_at(root)
    }

    /// Open storage rooted exactly at `root`.
    pub fn open_at(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Whether component state has been persisted yet.
    pub fn exists(&self) -> bool {
        self.root.join(COMPONENTS_FILE).exists()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // === State documents ===

    /// Load all component records. A missing document loads as empty.
    pub fn load_components(&self) -> Result<BTreeMap<String, Component>> {
        self.load_document(COMPONENTS_FILE)
    }

    pub fn save_components(&self, components: &BTreeMap<String, Component>) -> Result<()> {
        self.write_json(&self.root.join(COMPONENTS_FILE), components)
    }

    /// Load all milestone records. A missing document loads as empty.
    pub fn load_milestones(&self) -> Result<BTreeMap<String, Milestone>> {
        self.load_document(MILESTONES_FILE)
    }

    pub fn save_milestones(&self, milestones: &BTreeMap<String, Milestone>) -> Result<()> {
        self.write_json(&self.root.join(MILESTONES_FILE), milestones)
    }

    fn load_document<T: DeserializeOwned + Default>(&self, file: &str) -> Result<T> {
        let path = self.root.join(file);
        if !path.exists() {
            return Ok(T::default());
        }

        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(T::default());
        }
        tracing::debug!(path = %path.display(), "loading state document");
        Ok(serde_json::from_str(&content)?)
    }

    // === Artifacts ===

    /// The activity log stored alongside this repository's state.
    pub fn activity_log(&self) -> ActivityLog {
        ActivityLog::new(self.root.join(LOGS_DIR))
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.root.join(REPORTS_DIR)
    }

    /// Write a diagnostic report named after its generation time.
    pub fn write_report<T: Serialize>(
        &self,
        generated_at: DateTime<Utc>,
        report: &T,
    ) -> Result<PathBuf> {
        let dir = self.reports_dir();
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!(
            "diagnostic-{}.json",
            generated_at.format("%Y%m%dT%H%M%S%.3fZ")
        ));
        self.write_json(&path, report)?;
        Ok(path)
    }

    /// Write the dependency graph visualization.
    pub fn write_graph(&self, dot: &str) -> Result<PathBuf> {
        let path = self.root.join(GRAPH_FILE);
        let mut file = NamedTempFile::new_in(&self.root)?;
        file.write_all(dot.as_bytes())?;
        file.persist(&path).map_err(|e| Error::Io(e.error))?;
        Ok(path)
    }

    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        let dir = path.parent().unwrap_or(&self.root);
        let mut file = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut file, value)?;
        writeln!(file)?;
        file.persist(path).map_err(|e| Error::Io(e.error))?;
        tracing::debug!(path = %path.display(), "persisted state document");
        Ok(())
    }
}

/// Get the storage directory for a repository.
///
/// Uses a hash of the repository path to create a unique directory under
/// `$DEVTRACK_DATA_DIR` or `~/.local/share/devtrack/`.
pub fn get_storage_dir(repo_path: &Path) -> Result<PathBuf> {
    Ok(base_data_dir()?.join(repo_hash(repo_path)?))
}

fn base_data_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let data_dir = dirs::data_dir()
        .ok_or_else(|| Error::Other("Could not determine data directory".to_string()))?;
    Ok(data_dir.join("devtrack"))
}

fn repo_hash(repo_path: &Path) -> Result<String> {
    let repo_canonical = repo_path
        .canonicalize()
        .map_err(|e| Error::Other(format!("Could not canonicalize repo path: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(repo_canonical.to_string_lossy().as_bytes());
    let hash_hex = format!("{:x}", hasher.finalize());
    Ok(hash_hex[..12].to_string())
}

/// Walk up from `start` looking for a directory containing `.git`.
pub fn find_git_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}
