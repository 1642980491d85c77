//! Activity logging for Devtrack mutations.
//!
//! Every accepted mutation appends one entry to a day-partitioned JSONL file
//! under `<data dir>/logs/activity-YYYY-MM-DD.jsonl`. Entries are write-once;
//! they are only read back for "recent activity" queries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::Result;

const LOG_FILE_PREFIX: &str = "activity-";
const LOG_FILE_SUFFIX: &str = ".jsonl";

/// Represents a single activity log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO 8601 timestamp when the mutation was applied
    pub timestamp: DateTime<Utc>,

    /// Component (or milestone) the mutation targeted
    pub component: String,

    /// Action label (e.g., "status", "progress", "milestone-complete")
    pub action: String,

    /// Free-text details
    pub details: String,
}

impl LogEntry {
    pub fn new(
        component: impl Into<String>,
        action: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            component: component.into(),
            action: action.into(),
            details: details.into(),
        }
    }
}

/// Append-only activity log rooted at a directory.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    dir: PathBuf,
}

impl ActivityLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the log file that holds entries for `day`.
    pub fn path_for(&self, day: NaiveDate) -> PathBuf {
        self.dir.join(format!(
            "{}{}{}",
            LOG_FILE_PREFIX,
            day.format("%Y-%m-%d"),
            LOG_FILE_SUFFIX
        ))
    }

    /// Append an entry to the file for the entry's day.
    pub fn append(&self, entry: &LogEntry) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let json = serde_json::to_string(entry)?;
        let path = self.path_for(entry.timestamp.date_naive());
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{}", json)?;

        tracing::debug!(path = %path.display(), action = %entry.action, "appended activity entry");
        Ok(())
    }

    /// Record a mutation.
    ///
    /// This never fails: state has already been persisted by the time an entry is
    /// recorded, so a log write failure is reported and otherwise ignored.
    pub fn record(&self, component: &str, action: &str, details: &str) -> LogEntry {
        let entry = LogEntry::new(component, action, details);
        if let Err(e) = self.append(&entry) {
            tracing::warn!(error = %e, "failed to write activity log entry");
            eprintln!("Warning: Failed to write activity log: {}", e);
        }
        entry
    }

    /// The most recent `limit` entries across all day files, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<LogEntry>> {
        self.recent_matching(limit, |_| true)
    }

    /// The most recent `limit` entries for one component, newest first.
    pub fn recent_for(&self, component: &str, limit: usize) -> Result<Vec<LogEntry>> {
        self.recent_matching(limit, |entry| entry.component == component)
    }

    fn recent_matching(
        &self,
        limit: usize,
        keep: impl Fn(&LogEntry) -> bool,
    ) -> Result<Vec<LogEntry>> {
        let mut collected = Vec::new();
        if limit == 0 {
            return Ok(collected);
        }

        // Day files sort lexically by date; walk newest first.
        for path in self.day_files()?.into_iter().rev() {
            let mut day_entries: Vec<LogEntry> = read_entries(&path)?
                .into_iter()
                .filter(|entry| keep(entry))
                .collect();
            day_entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            for entry in day_entries {
                collected.push(entry);
                if collected.len() == limit {
                    return Ok(collected);
                }
            }
        }

        Ok(collected)
    }

    fn day_files(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX) && n.ends_with(LOG_FILE_SUFFIX))
            })
            .collect();
        files.sort();
        Ok(files)
    }
}

/// Read every parseable entry of one day file, skipping malformed lines.
fn read_entries(path: &Path) -> Result<Vec<LogEntry>> {
    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<LogEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping malformed activity entry"),
        }
    }
    Ok(entries)
}
