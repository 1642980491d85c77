use serde::Serialize;
use std::path::PathBuf;

use super::{Output, Workspace, json};
use crate::engine::DiagnosticReport;
use crate::Result;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnoseResult {
    pub report_file: PathBuf,
    pub report: DiagnosticReport,
}

impl Output for DiagnoseResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let report = &self.report;
        let summary = &report.summary;
        let mut lines = vec![format!(
            "Diagnostic report generated {}",
            report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )];

        match summary.overall_progress {
            Some(progress) => lines.push(format!(
                "  {} components, {:.1}% overall",
                summary.total_components, progress
            )),
            None => lines.push("  no components tracked".to_string()),
        }
        lines.push(format!(
            "  {} blocked, {} open issue(s), {} resolved",
            summary.blocked_components.len(),
            report.issues.open.len(),
            report.issues.resolved.len()
        ));
        lines.push(format!(
            "  milestones: {}/{} completed",
            summary.completed_milestones, summary.total_milestones
        ));
        if !report.critical_path.is_empty() {
            lines.push(format!("  critical path: {}", report.critical_path.join(" -> ")));
        }
        lines.push(format!(
            "  {} recent activity entries included",
            report.recent_activity.len()
        ));
        lines.push(format!("Report written to {}", self.report_file.display()));
        lines.join("\n")
    }
}

/// Build a diagnostic report and save it under `reports/`.
///
/// `recent` overrides the configured number of activity entries to bundle.
pub fn diagnose(ws: &Workspace, recent: Option<usize>) -> Result<DiagnoseResult> {
    let limit = recent.unwrap_or(ws.config.config.recent_activity);
    let recent_activity = ws.activity_log().recent(limit)?;

    let report = ws.engine().diagnostic_report(recent_activity)?;
    let report_file = ws.storage.write_report(report.generated_at, &report)?;
    tracing::debug!(path = %report_file.display(), "wrote diagnostic report");

    Ok(DiagnoseResult {
        report_file,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnv;

    #[test]
    fn test_diagnose_writes_report_artifact() {
        let env = TestEnv::new();
        let ws = env.workspace();
        let result = diagnose(&ws, None).unwrap();

        assert!(result.report_file.exists());
        assert!(result.report_file.starts_with(ws.storage.reports_dir()));
        let name = result.report_file.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("diagnostic-"));
        assert!(name.ends_with(".json"));

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&result.report_file).unwrap()).unwrap();
        assert_eq!(written["summary"]["totalComponents"], 9);
        assert_eq!(written["recentActivity"].as_array().unwrap().len(), 10);
    }

    #[test]
    fn test_diagnose_respects_recent_override() {
        let env = TestEnv::new();
        let ws = env.workspace();
        let result = diagnose(&ws, Some(3)).unwrap();
        assert_eq!(result.report.recent_activity.len(), 3);
    }
}
