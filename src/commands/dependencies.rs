use serde::Serialize;
use std::path::PathBuf;

use super::{Output, Workspace, json};
use crate::engine::{ComponentAnalysis, dot};
use crate::Result;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependenciesResult {
    pub components: Vec<ComponentAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_file: Option<PathBuf>,
}

impl Output for DependenciesResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        for analysis in &self.components {
            let state = if analysis.ready { "ready" } else { "waiting" };
            lines.push(format!(
                "{} [{}, {}%] {}",
                analysis.name, analysis.status, analysis.progress, state
            ));
            if analysis.dependencies.is_empty() {
                lines.push("  depends on: (nothing)".to_string());
            } else {
                lines.push(format!("  depends on: {}", analysis.dependencies.join(", ")));
            }
            if !analysis.dependents.is_empty() {
                lines.push(format!("  required by: {}", analysis.dependents.join(", ")));
            }
            for blocker in &analysis.blockers {
                lines.push(format!("  blocked by: {} ({})", blocker.name, blocker.status));
            }
        }
        if let Some(ref path) = self.graph_file {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push(format!("Dependency graph written to {}", path.display()));
        }
        lines.join("\n")
    }
}

/// Dependency analysis for every component, or for one.
///
/// With `export_dot`, the whole graph is also written as Graphviz DOT.
pub fn dependencies(
    ws: &Workspace,
    component: Option<&str>,
    export_dot: bool,
) -> Result<DependenciesResult> {
    let engine = ws.engine();
    let components = match component {
        Some(name) => vec![engine.analyze(ws.components.get(name)?)],
        None => engine.dependency_analysis(),
    };

    let graph_file = if export_dot {
        let path = ws.storage.write_graph(&dot::render(&ws.graph, &ws.components))?;
        tracing::debug!(path = %path.display(), "wrote dependency graph");
        Some(path)
    } else {
        None
    };

    Ok(DependenciesResult {
        components,
        graph_file,
    })
}
