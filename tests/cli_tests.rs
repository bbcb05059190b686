#![cfg(feature = "cli_api")]

use assert_cmd::Command;
use predicates::str::contains as str_contains;
use tempfile::NamedTempFile;

#[allow(deprecated)]
fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.env_remove("COMMESSE_CONFIG")
        .env_remove("COMMESSE_DOCUMENT")
        .env_remove("COMMESSE_UPSERT_POLICY");
    cmd.write_stdin(script.to_string()).assert()
}

#[test]
fn cli_add_normalises_start_and_prints_table() {
    run_cli("add A A1 R1 5 2025-01-01 Impianto pali\nquit\n")
        .success()
        .stdout(str_contains("Activity A1 added in project A."))
        .stdout(str_contains("Impianto pali"))
        .stdout(str_contains("2025-01-02"))
        .stdout(str_contains("2025-01-09"));
}

#[test]
fn cli_resolve_prints_log() {
    run_cli("add A A1 R1 5 2025-01-02 Sopralluogo\nadd B B1 R1 3 2025-01-06 Montaggio\nresolve\nquit\n")
        .success()
        .stdout(str_contains(
            "Resource 'R1': moved activity 'B1' of project 'B' from 07/01 to 10/01",
        ));
}

#[test]
fn cli_rejects_zero_duration() {
    run_cli("add A A1 R1 0 2025-01-02 x\nquit\n")
        .success()
        .stdout(str_contains("duration must be between 1 and 60 working days"));
}

#[test]
fn cli_survives_oversized_duration() {
    run_cli("add A A1 R1 100000000 2025-01-02 x\nprojects\nquit\n")
        .success()
        .stdout(str_contains("duration must be between 1 and 60 working days"))
        .stdout(str_contains("No projects."));
}

#[test]
fn cli_timeline_shows_resolved_bars() {
    run_cli("add A A1 R1 5 2025-01-02 Sopralluogo\nadd B B1 R1 3 2025-01-06 Montaggio\ntimeline B\nquit\n")
        .success()
        .stdout(str_contains("2025-01-10"));
}

#[test]
fn cli_reject_policy_reports_duplicate() {
    run_cli("policy reject_duplicate\nadd A A1 R1 1 2025-01-02 x\nadd A A1 R1 2 2025-01-02 y\nquit\n")
        .success()
        .stdout(str_contains("Upsert policy set to reject_duplicate."))
        .stdout(str_contains("activity 'A1' already exists in project 'A'"));
}

#[test]
fn cli_delete_missing_activity_reports_not_found() {
    run_cli("add A A1 R1 1 2025-01-02 x\ndelete A A2\ndelete A A1\nprojects\nquit\n")
        .success()
        .stdout(str_contains("activity 'A2' not found in project 'A'"))
        .stdout(str_contains("Deleted activity A1 from project A."))
        .stdout(str_contains("No projects."));
}

#[test]
fn cli_workday_reports_next_working_day() {
    run_cli("workday 2025-01-06\nquit\n")
        .success()
        .stdout(str_contains("next working day is 2025-01-07"));
}

#[test]
fn cli_save_and_load_json_round_trip() {
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().replace('\\', "\\\\");
    let script = format!(
        "add A A1 R1 2 2025-03-03 Persisted\nsave json {}\nadd A A2 R1 1 2025-03-10 Temp\nload json {}\nquit\n",
        path, path
    );
    let assert = run_cli(&script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("Schedule loaded from"));
    let after_reload = output
        .split("Schedule loaded from")
        .last()
        .unwrap_or_default();
    assert!(after_reload.contains("Persisted"));
    assert!(
        !after_reload.contains("Temp"),
        "temporary activity should not appear after reload:\n{}",
        after_reload
    );
}

#[test]
fn cli_load_of_malformed_file_keeps_schedule() {
    let tmp = NamedTempFile::new().expect("create temp file");
    std::fs::write(tmp.path(), "{\"A\": {\"A1\": {\"nome\": \"x\"}}}").unwrap();
    let path = tmp.path().to_string_lossy().to_string();
    let script = format!("add B B1 R1 1 2025-03-03 Kept\nload json {path}\nlist\nquit\n");
    run_cli(&script)
        .success()
        .stdout(str_contains("Error loading schedule: malformed document"))
        .stdout(str_contains("Kept"));
}
