use serde::Serialize;

use super::{Output, Workspace, json, progress_bar, push_warnings};
use crate::engine::MilestoneView;
use crate::models::{ComponentStatus, Milestone, MilestoneStatus, parse_target_date};
use crate::prompt::Prompter;
use crate::tracker::milestones::milestone_progress;
use crate::tracker::{MilestoneOutcome, MilestoneUpdate, NewMilestone};
use crate::{Error, Result};

fn view(ws: &Workspace, milestone: Milestone) -> MilestoneView {
    let progress = milestone_progress(&milestone, &ws.components);
    MilestoneView {
        milestone,
        progress,
    }
}

fn milestone_line(view: &MilestoneView) -> String {
    let target = view
        .milestone
        .target_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:<24} {:<12} {:>10} {:>4}% {}",
        view.milestone.name,
        view.milestone.status.as_str(),
        target,
        view.progress,
        progress_bar(view.progress)
    )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneList {
    pub milestones: Vec<MilestoneView>,
}

impl Output for MilestoneList {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.milestones.is_empty() {
            return "No milestones.".to_string();
        }
        self.milestones
            .iter()
            .map(milestone_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A member component as seen from its milestone.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRow {
    pub name: String,
    /// `None` when the member is no longer a tracked component
    pub status: Option<ComponentStatus>,
    pub progress: u8,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneDetail {
    #[serde(flatten)]
    pub view: MilestoneView,
    pub members: Vec<MemberRow>,
}

impl Output for MilestoneDetail {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let m = &self.view.milestone;
        let mut lines = vec![milestone_line(&self.view)];
        if let Some(ref description) = m.description {
            lines.push(format!("  {}", description));
        }
        if let Some(completed_at) = m.completed_at {
            lines.push(format!("  Completed {}", completed_at.format("%Y-%m-%d")));
        }
        if self.members.is_empty() {
            lines.push("  No components".to_string());
        } else {
            lines.push("  Components:".to_string());
            for member in &self.members {
                let status = member
                    .status
                    .map(|s| s.as_str())
                    .unwrap_or("untracked");
                lines.push(format!(
                    "    {:<20} {:<12} {:>3}%",
                    member.name, status, member.progress
                ));
            }
        }
        if !m.notes.is_empty() {
            lines.push("  Notes:".to_string());
            for note in &m.notes {
                lines.push(format!(
                    "    {}  {}",
                    note.timestamp.format("%Y-%m-%d"),
                    note.content
                ));
            }
        }
        lines.join("\n")
    }
}

/// Result of a milestone mutation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneChanged {
    pub milestone: MilestoneView,
    pub changes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Output for MilestoneChanged {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!("Milestone {}:", self.milestone.milestone.name)];
        for change in &self.changes {
            lines.push(format!("  {}", change));
        }
        lines.push(format!("  now {}% complete", self.milestone.progress));
        push_warnings(&mut lines, &self.warnings);
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneCompleted {
    pub milestone: MilestoneView,
    /// False when the operator declined to close an unfinished milestone
    pub completed: bool,
}

impl Output for MilestoneCompleted {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let name = &self.milestone.milestone.name;
        if self.completed {
            format!("Milestone {} marked Completed.", name)
        } else {
            format!(
                "Milestone {} left open at {}%.",
                name, self.milestone.progress
            )
        }
    }
}

/// Field edits for `milestone update`. Absent fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct MilestoneEdit {
    pub status: Option<MilestoneStatus>,
    /// Raw date text; empty clears the date
    pub target_date: Option<String>,
    /// Empty clears the description
    pub description: Option<String>,
}

/// Membership edit for `milestone components`.
#[derive(Debug, Clone)]
pub enum MembershipChange {
    Add(Vec<String>),
    Remove(Vec<String>),
    Replace(Vec<String>),
}

impl From<MembershipChange> for MilestoneUpdate {
    fn from(change: MembershipChange) -> Self {
        match change {
            MembershipChange::Add(names) => MilestoneUpdate::AddComponents(names),
            MembershipChange::Remove(names) => MilestoneUpdate::RemoveComponents(names),
            MembershipChange::Replace(names) => MilestoneUpdate::ReplaceComponents(names),
        }
    }
}

/// Persist, log and wrap a single milestone outcome.
fn finish(
    ws: &mut Workspace,
    outcomes: Vec<MilestoneOutcome>,
    warnings: Vec<String>,
) -> Result<MilestoneChanged> {
    ws.persist()?;
    for outcome in &outcomes {
        ws.record(&outcome.milestone.name, &outcome.action, &outcome.details);
    }

    let changes = outcomes.iter().map(|o| o.details.clone()).collect();
    let milestone = outcomes
        .into_iter()
        .last()
        .map(|o| o.milestone)
        .ok_or_else(|| Error::InvalidInput("no milestone changes requested".to_string()))?;

    Ok(MilestoneChanged {
        milestone: view(ws, milestone),
        changes,
        warnings,
    })
}

pub fn milestone_list(ws: &Workspace) -> Result<MilestoneList> {
    Ok(MilestoneList {
        milestones: ws.engine().milestone_views(),
    })
}

pub fn milestone_show(ws: &Workspace, name: &str) -> Result<MilestoneDetail> {
    let milestone = ws.milestones.get(name)?.clone();
    let members = milestone
        .components
        .iter()
        .map(|member| {
            let record = ws.components.get(member).ok();
            MemberRow {
                name: member.clone(),
                status: record.map(|c| c.status),
                progress: record.map_or(0, |c| c.completion_percentage),
            }
        })
        .collect();
    Ok(MilestoneDetail {
        view: view(ws, milestone),
        members,
    })
}

/// Create a milestone. An unparseable target date is dropped with a warning.
pub fn milestone_add(
    ws: &mut Workspace,
    name: &str,
    target_date: Option<&str>,
    description: Option<String>,
    components: Vec<String>,
) -> Result<MilestoneChanged> {
    let (target_date, warning) = target_date.map(parse_target_date).unwrap_or((None, None));
    if let Some(ref warning) = warning {
        tracing::warn!(milestone = name, "{}", warning);
    }

    let milestone = ws
        .milestones
        .create(
            NewMilestone {
                name: name.to_string(),
                target_date,
                description: description.filter(|d| !d.trim().is_empty()),
                components,
            },
            &ws.components,
        )?
        .clone();

    let details = if milestone.components.is_empty() {
        "created".to_string()
    } else {
        format!("created with {}", milestone.components.join(", "))
    };
    let outcome = MilestoneOutcome {
        milestone,
        action: "milestone-created".to_string(),
        details,
    };
    finish(ws, vec![outcome], warning.into_iter().collect())
}

/// Apply field edits. All edits are recorded as separate activity entries.
///
/// Completion goes through [`milestone_complete`] so its progress check applies.
pub fn milestone_update(ws: &mut Workspace, name: &str, edit: MilestoneEdit) -> Result<MilestoneChanged> {
    ws.milestones.get(name)?;

    let mut updates = Vec::new();
    let mut warnings = Vec::new();
    if let Some(status) = edit.status {
        if status == MilestoneStatus::Completed {
            return Err(Error::InvalidInput(format!(
                "use 'milestone complete {}' to complete a milestone",
                name
            )));
        }
        updates.push(MilestoneUpdate::Status(status));
    }
    if let Some(raw) = edit.target_date {
        let (date, warning) = parse_target_date(&raw);
        if let Some(warning) = warning {
            tracing::warn!(milestone = name, "{}", warning);
            warnings.push(warning);
        }
        updates.push(MilestoneUpdate::TargetDate(date));
    }
    if let Some(description) = edit.description {
        let description = Some(description).filter(|d| !d.trim().is_empty());
        updates.push(MilestoneUpdate::Description(description));
    }
    if updates.is_empty() {
        return Err(Error::InvalidInput(
            "nothing to update (use --status, --target-date or --description)".to_string(),
        ));
    }

    let mut outcomes = Vec::new();
    for update in updates {
        outcomes.push(ws.milestones.apply(name, update, &ws.components)?);
    }
    finish(ws, outcomes, warnings)
}

pub fn milestone_components(
    ws: &mut Workspace,
    name: &str,
    change: MembershipChange,
) -> Result<MilestoneChanged> {
    let outcome = ws.milestones.apply(name, change.into(), &ws.components)?;
    finish(ws, vec![outcome], Vec::new())
}

pub fn milestone_note(ws: &mut Workspace, name: &str, text: &str) -> Result<MilestoneChanged> {
    let outcome = ws.milestones.add_note(name, text, &ws.components)?;
    finish(ws, vec![outcome], Vec::new())
}

/// Mark a milestone Completed.
///
/// Below 100% progress the operator is asked first; declining changes nothing.
pub fn milestone_complete(
    ws: &mut Workspace,
    name: &str,
    prompter: &mut dyn Prompter,
) -> Result<MilestoneCompleted> {
    let progress = ws.milestones.calculate_progress(name, &ws.components)?;
    if progress < 100 {
        let question = format!(
            "Milestone {} is only {}% complete. Mark it Completed anyway?",
            name, progress
        );
        if !prompter.confirm(&question)? {
            return Ok(MilestoneCompleted {
                milestone: view(ws, ws.milestones.get(name)?.clone()),
                completed: false,
            });
        }
    }

    let outcome = ws.milestones.complete(name, &ws.components)?;
    let changed = finish(ws, vec![outcome], Vec::new())?;
    Ok(MilestoneCompleted {
        milestone: changed.milestone,
        completed: true,
    })
}
