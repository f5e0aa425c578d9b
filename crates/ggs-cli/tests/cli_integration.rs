//! CLI Integration Tests
//!
//! These tests run the `ggs` binary and check argument handling, help output
//! and the config subcommands. None of them touch Bluetooth.
//!
//! ```
//! cargo test --package ggs-cli --test cli_integration
//! ```

use std::path::Path;
use std::process::{Command, Output};

/// Run ggs with a clean environment and return output
fn run_ggs(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ggs"))
        .args(args)
        .env_remove("GGS_DEVICE")
        .env_remove("GGS_NAME")
        .env_remove("NO_COLOR")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run ggs binary")
}

fn run_with_config(config: &Path, args: &[&str]) -> Output {
    let config = config.to_str().expect("utf-8 temp path");
    let mut full = vec!["--config", config];
    full.extend_from_slice(args);
    run_ggs(&full)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_command() {
    let output = run_ggs(&["--help"]);

    assert!(output.status.success(), "Help should succeed");

    let stdout = stdout(&output);
    for cmd in ["control", "console", "listen", "scan", "config", "completions"] {
        assert!(stdout.contains(cmd), "Help should list {} command", cmd);
    }
}

#[test]
fn test_version_command() {
    let output = run_ggs(&["--version"]);

    assert!(output.status.success(), "Version should succeed");
    assert!(stdout(&output).contains("ggs"), "Version should contain ggs");
}

#[test]
fn test_subcommand_help() {
    for cmd in ["control", "console", "listen", "scan", "config"] {
        let output = run_ggs(&[cmd, "--help"]);

        assert!(output.status.success(), "{} --help should succeed", cmd);
        assert!(!stdout(&output).is_empty(), "{} --help should produce output", cmd);
    }
}

#[test]
fn test_control_help_lists_flags() {
    let stdout = stdout(&run_ggs(&["control", "--help"]));
    for flag in [
        "--address",
        "--name",
        "--on",
        "--level",
        "--status-only",
        "--pull-status-after",
        "--wait",
    ] {
        assert!(stdout.contains(flag), "control --help should list {}", flag);
    }
}

// =============================================================================
// Argument Validation
// =============================================================================

#[test]
fn test_control_rejects_invalid_on() {
    let output = run_ggs(&["control", "--on", "2"]);
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(2), "clap usage errors exit with 2");
}

#[test]
fn test_control_rejects_negative_wait() {
    let output = run_ggs(&["control", "--level", "10", "--wait=-1"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("wait"));
}

#[test]
fn test_control_rejects_non_numeric_level() {
    let output = run_ggs(&["control", "--level", "bright"]);
    assert!(!output.status.success());
}

#[test]
fn test_verbose_and_quiet_conflict() {
    let output = run_ggs(&["--verbose", "--quiet", "scan"]);
    assert!(!output.status.success());
}

#[test]
fn test_unknown_subcommand() {
    let output = run_ggs(&["dance"]);
    assert!(!output.status.success());
}

// =============================================================================
// Config Subcommand
// =============================================================================

#[test]
fn test_config_path_uses_override() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let output = run_with_config(&path, &["config", "path"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), path.display().to_string());
}

#[test]
fn test_config_init_and_show() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ggs").join("config.toml");

    let output = run_with_config(&path, &["config", "init"]);
    assert!(output.status.success(), "init failed: {}", stderr(&output));
    assert!(path.exists());

    let output = run_with_config(&path, &["config", "show"]);
    assert!(output.status.success());
    let shown = stdout(&output);
    assert!(shown.contains("name = \"SF-GGS-CB\""));
    assert!(shown.contains("scan_timeout = 8"));
    assert!(shown.contains("connect_timeout = 20"));
}

#[test]
fn test_config_init_refuses_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "device = \"90:E5:B1:B7:86:E6\"\n").unwrap();

    let output = run_with_config(&path, &["config", "init"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("--force"));

    let output = run_with_config(&path, &["config", "init", "--force"]);
    assert!(output.status.success());
}

#[test]
fn test_config_show_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "device = \"90:E5:B1:B7:86:E6\"\nwait = 4.5\n").unwrap();

    let shown = stdout(&run_with_config(&path, &["config", "show"]));
    assert!(shown.contains("device = \"90:E5:B1:B7:86:E6\""));
    assert!(shown.contains("wait = 4.5"));
}

// =============================================================================
// Completions
// =============================================================================

#[test]
fn test_completions_bash() {
    let output = run_ggs(&["completions", "bash"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("ggs"));
}
