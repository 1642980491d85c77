//! Project configuration for Devtrack.
//!
//! The configuration is read once at startup from `<repo>/devtrack.kdl` and is
//! never mutated afterwards. When the file is absent the built-in project
//! layout ([`ProjectConfig::builtin`]) is used.
//!
//! Contains:
//! - `component` - the closed set of component names and their dependencies
//! - `milestone` - default milestones with their component associations
//! - `report-recent-activity` - activity entries bundled into reports
//!
//! Status levels and phases are closed enums in [`crate::models`].

pub mod schema;

pub use schema::{ComponentConfig, MilestoneConfig, ProjectConfig};

use kdl::KdlDocument;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Name of the project configuration file at the repository root.
pub const CONFIG_FILE_NAME: &str = "devtrack.kdl";

/// Where the active configuration came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "lowercase")]
pub enum ConfigSource {
    /// Loaded from a `devtrack.kdl` file
    File(PathBuf),
    /// Built-in defaults
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Default => write!(f, "built-in defaults"),
        }
    }
}

/// A validated configuration with its source.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ProjectConfig,
    pub source: ConfigSource,
}

/// Load and validate the configuration for a repository.
pub fn load(repo_path: &Path) -> Result<LoadedConfig> {
    let path = repo_path.join(CONFIG_FILE_NAME);
    if !path.exists() {
        let config = ProjectConfig::builtin();
        config.validate()?;
        return Ok(LoadedConfig {
            config,
            source: ConfigSource::Default,
        });
    }

    let config = load_from_file(&path)?;
    tracing::debug!(path = %path.display(), components = config.components.len(), "loaded project configuration");
    Ok(LoadedConfig {
        config,
        source: ConfigSource::File(path),
    })
}

/// Parse and validate a configuration file.
pub fn load_from_file(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;

    let doc: KdlDocument = content
        .parse()
        .map_err(|e| Error::Config(format!("Failed to parse KDL in {}: {}", path.display(), e)))?;

    let config = ProjectConfig::from_kdl(&doc)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_without_file() {
        let temp = TempDir::new().unwrap();
        let loaded = load(temp.path()).unwrap();
        assert_eq!(loaded.source, ConfigSource::Default);
        assert_eq!(loaded.config, ProjectConfig::builtin());
    }

    #[test]
    fn test_load_from_repo_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "component \"core\"\ncomponent \"cli\" {\n    depends-on \"core\"\n}\n",
        )
        .unwrap();

        let loaded = load(temp.path()).unwrap();
        assert!(matches!(loaded.source, ConfigSource::File(_)));
        assert_eq!(loaded.config.component_names(), vec!["core", "cli"]);
        assert!(loaded.config.milestones.is_empty());
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "component {{{").unwrap();
        let err = load(temp.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("Failed to parse KDL"));
    }

    #[test]
    fn test_load_rejects_invalid_config() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "component \"a\" {\n    depends-on \"a\"\n}\n",
        )
        .unwrap();
        assert!(matches!(
            load(temp.path()),
            Err(Error::CyclicDependency(_))
        ));
    }
}
