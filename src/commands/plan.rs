use chrono::NaiveDate;
use serde::Serialize;

use super::{Output, Workspace, json};
use crate::engine::{Recommendations, critical_path};
use crate::Result;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResult {
    pub today: NaiveDate,
    pub critical_path: Vec<String>,
    pub recommendations: Recommendations,
}

impl Output for PlanResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = Vec::new();

        if self.critical_path.is_empty() {
            lines.push("Critical path: (no dependencies declared)".to_string());
        } else {
            lines.push(format!("Critical path: {}", self.critical_path.join(" -> ")));
        }

        let recs = &self.recommendations;
        lines.push(String::new());
        lines.push("Unblock:".to_string());
        if recs.blocked.is_empty() {
            lines.push("  nothing is blocked".to_string());
        }
        for item in &recs.blocked {
            lines.push(format!("  {} ({}%)", item.name, item.progress));
            for issue in &item.open_issues {
                lines.push(format!("    #{} {}", issue.index, issue.content));
            }
        }

        lines.push(String::new());
        lines.push("Ready to work on:".to_string());
        if recs.ready.is_empty() {
            lines.push("  nothing is ready".to_string());
        }
        for item in &recs.ready {
            let marker = if item.on_critical_path { "*" } else { " " };
            lines.push(format!(
                "  {} {} [{}, {}%]",
                marker, item.name, item.status, item.progress
            ));
        }

        lines.push(String::new());
        match &recs.next_milestone {
            Some(focus) => {
                lines.push(format!(
                    "Next milestone: {} (due {}, {}% complete)",
                    focus.name, focus.target_date, focus.progress
                ));
                for component in &focus.remaining {
                    lines.push(format!(
                        "  {} [{}, {}%]",
                        component.name, component.status, component.progress
                    ));
                }
            }
            None => lines.push("Next milestone: none upcoming".to_string()),
        }

        lines.join("\n")
    }
}

/// Critical path plus recommendations relative to `today`.
pub fn plan(ws: &Workspace, today: NaiveDate) -> Result<PlanResult> {
    let engine = ws.engine();
    let critical_path = critical_path(&ws.graph, &ws.components)?;
    let recommendations = engine.recommendations(&critical_path, today);
    Ok(PlanResult {
        today,
        critical_path,
        recommendations,
    })
}
