//! Basic CLI E2E tests.
//!
//! Each test runs the built binary with HOME pointed at a fresh temporary
//! directory, so config and local data never touch the real profile.

use std::process::Command;
use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &TempDir, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_momentum"))
        .args(args)
        .env("HOME", home.path())
        .env_remove("MOMENTUM_ENV")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(home: &TempDir, args: &[&str]) -> serde_json::Value {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_config_set_and_get() {
    let home = TempDir::new().unwrap();
    let (_, _, code) = run_cli(&home, &["config", "set", "remote.project_id", "demo-project"]);
    assert_eq!(code, 0);

    let (stdout, _, code) = run_cli(&home, &["config", "get", "remote.project_id"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "demo-project");

    let config = run_json(&home, &["config", "list"]);
    assert_eq!(config["remote"]["database"], "(default)");
}

#[test]
fn test_config_unknown_key_fails() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&home, &["config", "get", "remote.nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_planner_add_list_remove() {
    let home = TempDir::new().unwrap();
    assert_eq!(run_cli(&home, &["planner", "add", "mon", "Run"]).2, 0);
    assert_eq!(run_cli(&home, &["planner", "add", "Monday", "Read"]).2, 0);

    let planned = run_json(&home, &["planner", "list", "monday", "--json"]);
    assert_eq!(planned["Monday"], serde_json::json!(["Run", "Read"]));

    let (stdout, _, code) = run_cli(&home, &["planner", "remove", "monday", "1"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Removed 'Run'"));

    let planned = run_json(&home, &["planner", "list", "--json"]);
    assert_eq!(planned["Monday"], serde_json::json!(["Read"]));
    assert_eq!(planned["Sunday"], serde_json::json!([]));
}

#[test]
fn test_planner_rejects_unknown_day() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&home, &["planner", "add", "someday", "Run"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown day"));
}

fn habit_rows(snapshot: &serde_json::Value) -> Vec<(String, bool)> {
    snapshot["habits"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| (h["name"].as_str().unwrap().to_string(), h["is_completed"].as_bool().unwrap()))
        .collect()
}

#[test]
fn test_offline_habit_add() {
    let home = TempDir::new().unwrap();
    let snapshot = run_json(&home, &["habit", "add", "  Stretch ", "--offline", "--json"]);
    assert_eq!(habit_rows(&snapshot), [("Stretch".to_string(), false)]);
    assert!(snapshot["last_error"].is_null());
}

#[test]
fn test_offline_habits_persist_between_runs() {
    let home = TempDir::new().unwrap();
    run_json(&home, &["habit", "add", "Run", "--offline", "--json"]);
    run_json(&home, &["habit", "add", "Read", "--offline", "--json"]);

    let listed = run_json(&home, &["habit", "list", "--offline", "--json"]);
    assert_eq!(
        habit_rows(&listed),
        [("Run".to_string(), false), ("Read".to_string(), false)]
    );

    run_json(&home, &["habit", "toggle", "1", "--offline", "--json"]);
    let listed = run_json(&home, &["habit", "list", "--offline", "--json"]);
    assert_eq!(
        habit_rows(&listed),
        [("Read".to_string(), false), ("Run".to_string(), true)]
    );
    assert_eq!(listed["completed_count"], 1);

    run_json(&home, &["habit", "delete", "2", "--offline", "--json"]);
    let listed = run_json(&home, &["habit", "list", "--offline", "--json"]);
    assert_eq!(habit_rows(&listed), [("Read".to_string(), false)]);
    assert!(listed["last_error"].is_null());
}

#[test]
fn test_logout_leaves_habit_commands_signed_out() {
    let home = TempDir::new().unwrap();
    assert_eq!(run_cli(&home, &["auth", "login", "--user-id", "u1"]).2, 0);
    let (stdout, _, code) = run_cli(&home, &["auth", "status"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("signed in as u1"));

    let (stdout, _, code) = run_cli(&home, &["auth", "logout"]);
    assert_eq!(code, 0, "logout failed");
    assert!(stdout.contains("Signed out"));

    let (stdout, _, _) = run_cli(&home, &["auth", "status"]);
    assert!(stdout.contains("not signed in"));
    let (_, stderr, code) = run_cli(&home, &["habit", "list"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("not signed in"));
}

#[test]
fn test_habit_requires_session_unless_offline() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&home, &["habit", "list"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("not signed in"));
}

#[test]
fn test_streak_show_json() {
    let home = TempDir::new().unwrap();
    let streak = run_json(&home, &["streak", "show", "--json"]);
    assert_eq!(streak["count"], 0);
    assert_eq!(streak["days"].as_object().unwrap().len(), 7);
}
