use serde::Serialize;

use super::{Output, Workspace, json};
use crate::action_log::LogEntry;
use crate::Result;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResult {
    pub entries: Vec<LogEntry>,
}

impl Output for ActivityResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.entries.is_empty() {
            return "No activity recorded.".to_string();
        }
        self.entries
            .iter()
            .map(|e| {
                format!(
                    "{}  {:<20} {:<22} {}",
                    e.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    e.component,
                    e.action,
                    e.details
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The most recent activity entries, newest first, optionally for one target.
pub fn activity(ws: &Workspace, limit: usize, component: Option<&str>) -> Result<ActivityResult> {
    let log = ws.activity_log();
    let entries = match component {
        Some(name) => log.recent_for(name, limit)?,
        None => log.recent(limit)?,
    };
    Ok(ActivityResult { entries })
}
