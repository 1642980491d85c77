use serde::Serialize;
use std::path::PathBuf;

use super::{Output, Workspace, json};
use crate::config::{CONFIG_FILE_NAME, ConfigSource};
use crate::{Error, Result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitResult {
    pub storage_dir: PathBuf,
    pub config_source: ConfigSource,
    pub components_created: Vec<String>,
    pub milestones_created: Vec<String>,
    pub total_components: usize,
    pub total_milestones: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_written: Option<PathBuf>,
}

impl Output for InitResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        if self.components_created.is_empty() && self.milestones_created.is_empty() {
            lines.push("Devtrack already initialized; nothing to create.".to_string());
        } else {
            lines.push("Initialized devtrack.".to_string());
        }
        lines.push(format!("  Storage: {}", self.storage_dir.display()));
        lines.push(format!("  Configuration: {}", self.config_source));
        if !self.components_created.is_empty() {
            lines.push(format!(
                "  Created {} component(s): {}",
                self.components_created.len(),
                self.components_created.join(", ")
            ));
        }
        if !self.milestones_created.is_empty() {
            lines.push(format!(
                "  Created {} milestone(s): {}",
                self.milestones_created.len(),
                self.milestones_created.join(", ")
            ));
        }
        lines.push(format!(
            "  Tracking {} components and {} milestones",
            self.total_components, self.total_milestones
        ));
        if let Some(path) = &self.config_written {
            lines.push(format!("  Wrote configuration to {}", path.display()));
        }
        lines.join("\n")
    }
}

/// Report what opening the workspace bootstrapped.
///
/// Opening is what creates missing records, so running `init` again is a no-op.
/// With `write_config`, the active configuration is written to the repository
/// as `devtrack.kdl`; an existing file is never overwritten.
pub fn init(ws: &Workspace, write_config: bool) -> Result<InitResult> {
    let config_written = if write_config {
        let path = ws.repo_path.join(CONFIG_FILE_NAME);
        if path.exists() {
            return Err(Error::AlreadyExists(format!(
                "Configuration file already exists: {}",
                path.display()
            )));
        }
        std::fs::write(&path, ws.config.config.to_kdl().to_string())?;
        Some(path)
    } else {
        None
    };

    Ok(InitResult {
        storage_dir: ws.storage.root().to_path_buf(),
        config_source: ws.config.source.clone(),
        components_created: ws.created_components.clone(),
        milestones_created: ws.created_milestones.clone(),
        total_components: ws.components.len(),
        total_milestones: ws.milestones.len(),
        config_written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::test_utils::TestEnv;

    #[test]
    fn test_init_reports_created_records() {
        let env = TestEnv::new();
        let result = init(&env.workspace(), false).unwrap();
        assert_eq!(result.components_created.len(), 9);
        assert_eq!(result.milestones_created.len(), 4);
        assert!(result.config_written.is_none());
    }

    #[test]
    fn test_init_is_idempotent() {
        let env = TestEnv::new();
        init(&env.workspace(), false).unwrap();
        let again = init(&env.workspace(), false).unwrap();
        assert!(again.components_created.is_empty());
        assert!(again.milestones_created.is_empty());
        assert_eq!(again.total_components, 9);
        assert!(again.to_human().contains("already initialized"));
    }

    #[test]
    fn test_init_writes_loadable_config() {
        let env = TestEnv::new();
        let result = init(&env.workspace(), true).unwrap();
        let path = result.config_written.unwrap();
        assert!(path.exists());

        let loaded = config::load(env.path()).unwrap();
        assert_eq!(loaded.config, config::ProjectConfig::builtin());

        let err = init(&env.workspace(), true).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
    }
}
