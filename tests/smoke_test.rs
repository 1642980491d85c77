//! Smoke tests for the Devtrack CLI.
//!
//! These tests verify basic CLI functionality:
//! - `devtrack --version` outputs version info
//! - `devtrack --help` outputs help text
//! - `devtrack status` outputs valid JSON

mod common;

use assert_cmd::Command;
use common::TestEnv;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the devtrack binary.
fn devtrack() -> Command {
    Command::new(env!("CARGO_BIN_EXE_devtrack"))
}

#[test]
fn test_version_flag() {
    devtrack()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("devtrack"))
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_help_flag() {
    devtrack()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("Options:"));
}

#[test]
fn test_no_subcommand_is_an_error() {
    devtrack().assert().failure();
}

#[test]
fn test_status_outputs_json() {
    let env = TestEnv::new();
    env.devtrack()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("{"))
        .stdout(predicate::str::contains("\"summary\""));
}

#[test]
fn test_human_readable_flag() {
    let env = TestEnv::new();
    env.devtrack()
        .args(["-H", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Overall progress"));
}

#[test]
fn test_missing_repo_path_fails() {
    let env = TestEnv::new();
    env.devtrack()
        .args(["-C", "/definitely/not/here", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_repo_flag_targets_other_directory() {
    let env = TestEnv::new();
    let other = TempDir::new().unwrap();
    std::fs::write(other.path().join("devtrack.kdl"), "component \"solo\"\n").unwrap();

    env.devtrack()
        .arg("-C")
        .arg(other.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"solo\""));
}
