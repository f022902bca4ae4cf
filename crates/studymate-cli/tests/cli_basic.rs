//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary home directory.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use serde_json::Value;
use tempfile::TempDir;

fn command(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_studymate"));
    cmd.env("HOME", home)
        .env("STUDYMATE_LOG", "off")
        .env_remove("STUDYMATE_ENV")
        .env_remove("GEMINI_API_KEY");
    cmd
}

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = command(home)
        .args(args)
        .output()
        .expect("Failed to execute CLI command");
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

fn run_ok(home: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    stdout
}

#[test]
fn test_config_get_set() {
    let home = TempDir::new().unwrap();
    assert_eq!(run_ok(home.path(), &["config", "get", "timer.study_minutes"]).trim(), "25");
    run_ok(home.path(), &["config", "set", "ai.question_count", "8"]);
    assert_eq!(run_ok(home.path(), &["config", "get", "ai.question_count"]).trim(), "8");

    let (_, stderr, code) = run_cli(home.path(), &["config", "get", "nope.key"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_config_rejects_out_of_range_timer() {
    let home = TempDir::new().unwrap();
    let (_, _, code) = run_cli(home.path(), &["config", "set", "timer.study_minutes", "90"]);
    assert_eq!(code, 1);
    assert_eq!(run_ok(home.path(), &["config", "get", "timer.study_minutes"]).trim(), "25");
}

#[test]
fn test_subject_create_list_and_note() {
    let home = TempDir::new().unwrap();
    let id = run_ok(home.path(), &["subject", "create", "Algebra", "--emoji", "📐"]);
    let id = id.trim();
    assert!(!id.is_empty());

    run_ok(home.path(), &["subject", "add-note", "1", "matrices"]);

    let list: Value = serde_json::from_str(&run_ok(home.path(), &["subject", "list", "--json"])).unwrap();
    let subjects = list.as_array().unwrap();
    assert_eq!(subjects.len(), 1);
    assert_eq!(subjects[0]["id"], id);
    assert_eq!(subjects[0]["name"], "Algebra");
    assert_eq!(subjects[0]["notes"][0], "matrices");

    let text = run_ok(home.path(), &["subject", "list"]);
    assert!(text.contains("📐 Algebra"));
}

#[test]
fn test_subject_create_requires_name() {
    let home = TempDir::new().unwrap();
    let (_, _, code) = run_cli(home.path(), &["subject", "create", "   "]);
    assert_eq!(code, 1);
    assert!(run_ok(home.path(), &["subject", "list"]).contains("no subjects yet"));
}

#[test]
fn test_share_round_trip_with_conflict() {
    let home = TempDir::new().unwrap();
    run_ok(home.path(), &["subject", "create", "Physics", "--emoji", "🔭"]);
    run_ok(home.path(), &["subject", "add-note", "1", "F = ma"]);
    let payload = run_ok(home.path(), &["share", "export", "1"]);
    let parsed: Value = serde_json::from_str(payload.trim()).unwrap();
    assert_eq!(parsed["nombre"], "Physics");
    assert_eq!(parsed["notas"][0], "F = ma");

    let (_, stderr, code) = run_cli(home.path(), &["share", "import", payload.trim()]);
    assert_eq!(code, 1);
    assert!(stderr.contains("--overwrite"));

    let out = run_ok(home.path(), &["share", "import", "--discard", payload.trim()]);
    assert!(out.contains("discarded"));

    let out = run_ok(home.path(), &["share", "import", "--overwrite", payload.trim()]);
    assert!(out.contains("replaced"));

    let list: Value = serde_json::from_str(&run_ok(home.path(), &["subject", "list", "--json"])).unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[test]
fn test_share_import_from_stdin() {
    let home = TempDir::new().unwrap();
    let mut child = command(home.path())
        .args(["share", "import"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(r#"{"nombre":"Chemistry","emoji":"🧪","notas":["moles"]}"#.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("imported"));

    let list = run_ok(home.path(), &["subject", "list"]);
    assert!(list.contains("🧪 Chemistry"));
}

#[test]
fn test_share_import_rejects_bad_payload() {
    let home = TempDir::new().unwrap();
    let (_, _, code) = run_cli(home.path(), &["share", "import", r#"{"emoji":"x"}"#]);
    assert_eq!(code, 1);
    let (_, _, code) = run_cli(home.path(), &["share", "import", "not json"]);
    assert_eq!(code, 1);
}

#[test]
fn test_timer_durations_persist() {
    let home = TempDir::new().unwrap();
    let adjusted: Value = serde_json::from_str(&run_ok(home.path(), &["timer", "study", "30"])).unwrap();
    assert_eq!(adjusted["type"], "durations_adjusted");
    assert_eq!(adjusted["seconds_remaining"], 1800);

    let status: Value = serde_json::from_str(&run_ok(home.path(), &["timer", "status"])).unwrap();
    assert_eq!(status["type"], "state_snapshot");
    assert_eq!(status["phase"], "study");
    assert_eq!(status["running"], false);
    assert_eq!(status["study_minutes"], 30);
    assert_eq!(status["clock"], "30:00");
}

#[test]
fn test_timer_start_points_at_run() {
    let home = TempDir::new().unwrap();
    let (stdout, stderr, code) = run_cli(home.path(), &["timer", "start"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("timer_started"));
    assert!(stderr.contains("timer run"));

    let (stdout, stderr, code) = run_cli(home.path(), &["timer", "study", "10"]);
    assert_eq!(code, 0);
    assert!(stderr.contains("timer pause"));
    let status: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(status["study_minutes"], 25);

    run_ok(home.path(), &["timer", "pause"]);
    let adjusted: Value = serde_json::from_str(&run_ok(home.path(), &["timer", "study", "10"])).unwrap();
    assert_eq!(adjusted["study_minutes"], 10);
}

#[test]
fn test_streak_starts_at_one() {
    let home = TempDir::new().unwrap();
    assert!(run_ok(home.path(), &["streak"]).contains("1 day in a row"));
    assert!(run_ok(home.path(), &["streak"]).contains("1 day in a row"));
}

#[test]
fn test_calendar_add_list_remove() {
    let home = TempDir::new().unwrap();
    let out = run_ok(
        home.path(),
        &["calendar", "add", "Exam", "--description", "chapter 3", "--due", "2030-05-01 10:30"],
    );
    assert!(out.contains("2030-05-01"));

    let tasks: Value =
        serde_json::from_str(&run_ok(home.path(), &["calendar", "list", "--day", "2030-05-01", "--json"])).unwrap();
    let tasks = tasks.as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["title"], "Exam");
    assert_eq!(tasks[0]["description"], "chapter 3");
    let id = tasks[0]["id"].as_str().unwrap();

    run_ok(home.path(), &["calendar", "remove", id, "2030-05-01"]);
    assert!(run_ok(home.path(), &["calendar", "list"]).contains("no tasks"));
}

#[test]
fn test_quiz_without_key_fails() {
    let home = TempDir::new().unwrap();
    run_ok(home.path(), &["subject", "create", "History"]);
    let (_, stderr, code) = run_cli(home.path(), &["quiz", "1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("GEMINI_API_KEY"));
}

#[test]
fn test_profile_set_and_show() {
    let home = TempDir::new().unwrap();
    assert!(run_ok(home.path(), &["profile", "show"]).contains("no profile yet"));
    run_ok(home.path(), &["profile", "set", "--name", "Ana", "--age", "21"]);
    let profile: Value = serde_json::from_str(&run_ok(home.path(), &["profile", "show"])).unwrap();
    assert_eq!(profile["name"], "Ana");
    assert_eq!(profile["age"], 21);

    let (_, _, code) = run_cli(home.path(), &["profile", "set", "--name", "Ana", "--age", "old"]);
    assert_eq!(code, 1);
}

#[test]
fn test_music_list_and_idle_pause() {
    let home = TempDir::new().unwrap();
    let list = run_ok(home.path(), &["music", "list"]);
    assert_eq!(list.lines().count(), 4);
    assert!(list.contains("Ocean Waves"));
    assert!(run_ok(home.path(), &["music", "pause"]).contains("nothing to do"));
}
