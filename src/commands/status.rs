use serde::Serialize;

use super::{Output, Workspace, json, progress_bar};
use crate::action_log::LogEntry;
use crate::engine::{MilestoneView, Summary};
use crate::models::graph::Blocker;
use crate::models::{Component, ComponentStatus, Phase};
use crate::Result;

/// Activity entries shown with a single component.
const COMPONENT_RECENT_ACTIVITY: usize = 5;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRow {
    pub name: String,
    pub status: ComponentStatus,
    pub phase: Phase,
    pub progress: u8,
    pub open_issues: usize,
    pub ready: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDetail {
    pub component: Component,
    pub dependencies: Vec<String>,
    pub dependents: Vec<String>,
    pub ready: bool,
    pub blockers: Vec<Blocker>,
    pub milestones: Vec<String>,
    pub recent_activity: Vec<LogEntry>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum StatusResult {
    Overview {
        summary: Summary,
        components: Vec<ComponentRow>,
        milestones: Vec<MilestoneView>,
    },
    Component(Box<ComponentDetail>),
}

impl Output for StatusResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        match self {
            StatusResult::Overview {
                summary,
                components,
                milestones,
            } => overview_human(summary, components, milestones),
            StatusResult::Component(detail) => detail_human(detail),
        }
    }
}

fn overview_human(
    summary: &Summary,
    components: &[ComponentRow],
    milestones: &[MilestoneView],
) -> String {
    let mut lines = Vec::new();

    match summary.overall_progress {
        Some(progress) => lines.push(format!(
            "Overall progress: {:.1}% {}",
            progress,
            progress_bar(progress.round() as u8)
        )),
        None => lines.push("Overall progress: no components tracked".to_string()),
    }

    let counts: Vec<String> = summary
        .status_counts
        .iter()
        .map(|c| format!("{}: {}", c.status, c.count))
        .collect();
    lines.push(counts.join(" | "));
    lines.push(format!(
        "Milestones completed: {}/{}",
        summary.completed_milestones, summary.total_milestones
    ));
    if summary.ready_for_production {
        lines.push("Ready for production.".to_string());
    }

    if !components.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "{:<20} {:<12} {:<12} {:>4}  {}",
            "COMPONENT", "STATUS", "PHASE", "DONE", "NOTES"
        ));
        for row in components {
            let mut flags = Vec::new();
            if row.open_issues > 0 {
                flags.push(format!("{} open issue(s)", row.open_issues));
            }
            if !row.ready {
                flags.push("waiting on dependencies".to_string());
            }
            lines.push(format!(
                "{:<20} {:<12} {:<12} {:>3}%  {}",
                row.name,
                row.status.as_str(),
                row.phase.as_str(),
                row.progress,
                flags.join(", ")
            ));
        }
    }

    if !milestones.is_empty() {
        lines.push(String::new());
        lines.push("Milestones:".to_string());
        for view in milestones {
            let target = view
                .milestone
                .target_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "no target date".to_string());
            lines.push(format!(
                "  {} [{}] {}% (due {})",
                view.milestone.name, view.milestone.status, view.progress, target
            ));
        }
    }

    lines.join("\n")
}

fn detail_human(detail: &ComponentDetail) -> String {
    let c = &detail.component;
    let mut lines = vec![
        format!("{} - {} ({})", c.name, c.status, c.phase),
        format!(
            "  Progress: {}% {}",
            c.completion_percentage,
            progress_bar(c.completion_percentage)
        ),
        format!("  Last updated: {}", c.last_updated.format("%Y-%m-%d %H:%M UTC")),
    ];

    if !detail.dependencies.is_empty() {
        lines.push(format!("  Depends on: {}", detail.dependencies.join(", ")));
    }
    if !detail.dependents.is_empty() {
        lines.push(format!("  Required by: {}", detail.dependents.join(", ")));
    }
    if detail.ready {
        lines.push("  Ready: yes".to_string());
    } else {
        let blockers: Vec<String> = detail
            .blockers
            .iter()
            .map(|b| format!("{} ({})", b.name, b.status))
            .collect();
        lines.push(format!("  Ready: no, waiting on {}", blockers.join(", ")));
    }
    if !detail.milestones.is_empty() {
        lines.push(format!("  Milestones: {}", detail.milestones.join(", ")));
    }

    if !c.issues.is_empty() {
        lines.push("  Issues:".to_string());
        for (index, issue) in c.issues.iter().enumerate() {
            let marker = if issue.resolved { "x" } else { " " };
            lines.push(format!("    [{}] #{} {}", marker, index, issue.content));
        }
    }

    if !c.notes.is_empty() {
        lines.push("  Notes:".to_string());
        for note in &c.notes {
            lines.push(format!(
                "    {}  {}",
                note.timestamp.format("%Y-%m-%d"),
                note.content
            ));
        }
    }

    if !detail.recent_activity.is_empty() {
        lines.push("  Recent activity:".to_string());
        for entry in &detail.recent_activity {
            lines.push(format!(
                "    {}  {:<14} {}",
                entry.timestamp.format("%Y-%m-%d %H:%M"),
                entry.action,
                entry.details
            ));
        }
    }

    lines.join("\n")
}

/// Project overview, or the full record of one component.
pub fn status(ws: &Workspace, component: Option<&str>) -> Result<StatusResult> {
    let engine = ws.engine();

    let Some(name) = component else {
        let components = engine
            .dependency_analysis()
            .into_iter()
            .map(|a| ComponentRow {
                open_issues: ws
                    .components
                    .get(&a.name)
                    .map(|c| c.open_issue_count())
                    .unwrap_or(0),
                name: a.name,
                status: a.status,
                phase: a.phase,
                progress: a.progress,
                ready: a.ready,
            })
            .collect();
        return Ok(StatusResult::Overview {
            summary: engine.summary(),
            components,
            milestones: engine.milestone_views(),
        });
    };

    let record = ws.components.get(name)?;
    let analysis = engine.analyze(record);
    let milestones = ws
        .milestones
        .all()
        .filter(|m| m.components.iter().any(|c| c == name))
        .map(|m| m.name.clone())
        .collect();

    Ok(StatusResult::Component(Box::new(ComponentDetail {
        component: record.clone(),
        dependencies: analysis.dependencies,
        dependents: analysis.dependents,
        ready: analysis.ready,
        blockers: analysis.blockers,
        milestones,
        recent_activity: ws
            .activity_log()
            .recent_for(name, COMPONENT_RECENT_ACTIVITY)?,
    })))
}
