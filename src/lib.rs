//! Devtrack - A development progress tracker for multi-component projects.
//!
//! This library provides the core functionality for the `devtrack` CLI tool,
//! including component and milestone tracking, dependency analysis, critical
//! path derivation and diagnostic reporting.

pub mod action_log;
pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod models;
pub mod prompt;
pub mod storage;
pub mod tracker;

/// Test utilities for isolated test environments.
#[cfg(test)]
pub(crate) mod test_utils {
    use std::path::Path;
    use tempfile::TempDir;

    use crate::commands::Workspace;

    /// Test environment with an isolated repository and data directory.
    pub struct TestEnv {
        /// Simulated repository directory
        pub repo_dir: TempDir,
        /// Isolated data storage directory
        pub data_dir: TempDir,
    }

    impl TestEnv {
        pub fn new() -> Self {
            Self {
                repo_dir: TempDir::new().unwrap(),
                data_dir: TempDir::new().unwrap(),
            }
        }

        /// Create an environment whose repository carries the given `devtrack.kdl`.
        pub fn with_config(kdl: &str) -> Self {
            let env = Self::new();
            std::fs::write(env.path().join(crate::config::CONFIG_FILE_NAME), kdl).unwrap();
            env
        }

        pub fn path(&self) -> &Path {
            self.repo_dir.path()
        }

        pub fn data_path(&self) -> &Path {
            self.data_dir.path()
        }

        /// Open a workspace against the isolated directories.
        pub fn workspace(&self) -> Workspace {
            Workspace::open_with_data_dir(self.path(), self.data_path()).unwrap()
        }
    }

    impl Default for TestEnv {
        fn default() -> Self {
            Self::new()
        }
    }
}

/// Library-level error type for Devtrack operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Issue index {index} is out of range ({len} issues recorded)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Cyclic dependency: {}", .0.join(" -> "))]
    CyclicDependency(Vec<String>),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Devtrack operations.
pub type Result<T> = std::result::Result<T, Error>;
