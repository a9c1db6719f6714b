//! Basic CLI tests: argument parsing and local-only commands.
//!
//! Tests invoke the binary via cargo run; nothing here touches the
//! network.

use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "tickbridge-cli", "--"])
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn help_lists_subcommands() {
    let (stdout, _stderr, code) = run_cli(&["--help"]);
    assert_eq!(code, 0);
    for subcommand in ["auth", "watch", "task", "project", "agenda", "config"] {
        assert!(
            stdout.contains(subcommand),
            "help should mention '{subcommand}'"
        );
    }
}

#[test]
fn version_flag_works() {
    let (stdout, _stderr, code) = run_cli(&["--version"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("tickbridge"));
}

#[test]
fn task_create_requires_project_id() {
    let (_stdout, stderr, code) = run_cli(&["task", "create", "Orphan task"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("project-id") || stderr.contains("required"));
}

#[test]
fn watch_rejects_unknown_flags() {
    let (_stdout, stderr, code) = run_cli(&["watch", "--webhooks"]);
    assert_ne!(code, 0);
    assert!(!stderr.is_empty());
}

#[test]
fn config_path_prints_location() {
    let (stdout, _stderr, code) = run_cli(&["config", "path"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("config.toml"));
}

#[test]
fn config_set_rejects_unknown_key() {
    let (_stdout, stderr, code) = run_cli(&["config", "set", "webhook_url", "x"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown configuration key"));
}
