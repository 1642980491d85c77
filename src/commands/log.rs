use serde::Serialize;

use super::{Output, Workspace, json, push_warnings};
use crate::models::graph::Blocker;
use crate::models::{Component, ComponentStatus};
use crate::prompt::Prompter;
use crate::tracker::components::parse_percentage;
use crate::tracker::{ComponentUpdate, FollowUp};
use crate::Result;

/// One requested component update, as given on the command line.
#[derive(Debug, Clone)]
pub enum LogRequest {
    Status(ComponentStatus),
    Phase(crate::models::Phase),
    /// Raw progress text; parsed leniently
    Progress(String),
    Note(String),
    Issue(String),
    Resolve(usize),
}

impl LogRequest {
    /// Convert to a tracker update, returning any parse warning.
    fn into_update(self) -> (ComponentUpdate, Option<String>) {
        match self {
            LogRequest::Status(status) => (ComponentUpdate::Status(status), None),
            LogRequest::Phase(phase) => (ComponentUpdate::Phase(phase), None),
            LogRequest::Progress(raw) => {
                let (value, warning) = parse_percentage(&raw);
                if let Some(ref warning) = warning {
                    tracing::warn!(input = %raw, "{}", warning);
                }
                (ComponentUpdate::Progress(value), warning)
            }
            LogRequest::Note(text) => (ComponentUpdate::Note(text), None),
            LogRequest::Issue(text) => (ComponentUpdate::Issue(text), None),
            LogRequest::Resolve(index) => (ComponentUpdate::ResolveIssue(index), None),
        }
    }
}

/// A follow-up transition that was offered after the update.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpResult {
    pub offer: FollowUp,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogResult {
    pub component: Component,
    /// False when the operator declined to start a blocked component
    pub applied: bool,
    pub action: String,
    pub details: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blockers: Vec<Blocker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<FollowUpResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Output for LogResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        if !self.applied {
            let blockers: Vec<String> = self
                .blockers
                .iter()
                .map(|b| format!("{} ({})", b.name, b.status))
                .collect();
            lines.push(format!(
                "Not started: {} is waiting on {}",
                self.component.name,
                blockers.join(", ")
            ));
            return lines.join("\n");
        }

        lines.push(format!(
            "Updated {} {}: {}",
            self.component.name, self.action, self.details
        ));
        if !self.blockers.is_empty() {
            let blockers: Vec<String> = self
                .blockers
                .iter()
                .map(|b| format!("{} ({})", b.name, b.status))
                .collect();
            lines.push(format!("  Started despite unmet dependencies: {}", blockers.join(", ")));
        }
        if let Some(ref follow_up) = self.follow_up {
            match (&follow_up.details, follow_up.accepted) {
                (Some(details), true) => lines.push(format!("  Status: {}", details)),
                _ => lines.push(format!(
                    "  Status left at {} (not changed to {})",
                    self.component.status,
                    follow_up.offer.target_status()
                )),
            }
        }
        push_warnings(&mut lines, &self.warnings);
        lines.join("\n")
    }
}

/// Apply one update to a component.
///
/// Moving a component to In Progress while it has unmet dependencies asks the
/// operator first; declining leaves the record and the activity log untouched.
/// When the update offers a follow-up transition (completion at 100%, resume
/// after the last issue is resolved) the operator is asked whether to apply it.
pub fn log_component(
    ws: &mut Workspace,
    name: &str,
    request: LogRequest,
    prompter: &mut dyn Prompter,
) -> Result<LogResult> {
    let current = ws.components.get(name)?.clone();
    let (update, parse_warning) = request.into_update();

    if update == ComponentUpdate::Status(ComponentStatus::InProgress) {
        let readiness = ws.components.readiness(name, &ws.graph)?;
        if !readiness.ready {
            let list: Vec<String> = readiness
                .blockers
                .iter()
                .map(|b| format!("{} ({})", b.name, b.status))
                .collect();
            let question = format!(
                "{} depends on unfinished components: {}. Start it anyway?",
                name,
                list.join(", ")
            );
            if !prompter.confirm(&question)? {
                tracing::debug!(component = name, "start declined");
                return Ok(LogResult {
                    component: current,
                    applied: false,
                    action: update.action().to_string(),
                    details: String::new(),
                    blockers: readiness.blockers,
                    follow_up: None,
                    warnings: Vec::new(),
                });
            }
        }
    }

    let mut outcome = ws.components.apply(name, update, &ws.graph)?;
    ws.persist()?;
    ws.record(name, &outcome.action, &outcome.details);

    let mut warnings: Vec<String> = parse_warning.into_iter().collect();
    warnings.append(&mut outcome.warnings);

    let follow_up = match outcome.follow_up {
        Some(offer) => {
            let accepted = prompter.confirm(&offer.question(name))?;
            let details = if accepted {
                let next = ws
                    .components
                    .update_status(name, offer.target_status(), &ws.graph)?;
                ws.persist()?;
                ws.record(name, &next.action, &next.details);
                outcome.component = next.component;
                Some(next.details)
            } else {
                None
            };
            Some(FollowUpResult {
                offer,
                accepted,
                details,
            })
        }
        None => None,
    };

    Ok(LogResult {
        component: outcome.component,
        applied: true,
        action: outcome.action,
        details: outcome.details,
        blockers: outcome.blockers,
        follow_up,
        warnings,
    })
}
