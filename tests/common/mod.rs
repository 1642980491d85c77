//! Common test utilities for devtrack integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't pollute
//! the user's `~/.local/share/devtrack/` directory.

#![allow(dead_code)]

use assert_cmd::Command;
pub use tempfile::TempDir;

/// A test environment with isolated data storage.
///
/// Each `TestEnv` creates two temporary directories:
/// - `repo_dir`: Acts as the repository root
/// - `data_dir`: Holds devtrack's data (via `DEVTRACK_DATA_DIR` env var)
///
/// The `devtrack()` method returns a `Command` that sets `DEVTRACK_DATA_DIR`
/// per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub repo_dir: TempDir,
    pub data_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with isolated directories.
    pub fn new() -> Self {
        Self {
            repo_dir: TempDir::new().unwrap(),
            data_dir: TempDir::new().unwrap(),
        }
    }

    /// Create a test environment whose repository carries `devtrack.kdl`.
    pub fn with_config(kdl: &str) -> Self {
        let env = Self::new();
        std::fs::write(env.path().join("devtrack.kdl"), kdl).unwrap();
        env
    }

    /// Create a new test environment and initialize devtrack.
    pub fn init() -> Self {
        let env = Self::new();
        env.devtrack().arg("init").assert().success();
        env
    }

    /// Get a Command for the devtrack binary with isolated data directory.
    ///
    /// Prompts never block: stdin is empty unless a test writes to it.
    pub fn devtrack(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_devtrack"));
        cmd.current_dir(self.repo_dir.path());
        cmd.env("DEVTRACK_DATA_DIR", self.data_dir.path());
        cmd.env_remove("DEVTRACK_REPO");
        cmd.env_remove("DEVTRACK_LOG");
        cmd
    }

    /// Get the path to the repo directory.
    pub fn path(&self) -> &std::path::Path {
        self.repo_dir.path()
    }

    /// Get the path to the data directory.
    pub fn data_path(&self) -> &std::path::Path {
        self.data_dir.path()
    }

    /// Run a command and parse its JSON stdout.
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.devtrack().args(args).output().unwrap();
        assert!(
            output.status.success(),
            "devtrack {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
