use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

#[allow(deprecated)]
fn get_flightscout_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("flightscout")
}

fn run_cmd() -> Command {
    let mut cmd = Command::new(get_flightscout_bin());
    cmd.arg("run")
        .env_remove("FLIGHTSCOUT_MAILTO")
        .env_remove("FLIGHTSCOUT_CHROME")
        .env_remove("FLIGHTSCOUT_OUTPUT_DIR");
    cmd
}

#[test]
fn test_run_command_help() {
    let mut cmd = Command::new(get_flightscout_bin());
    cmd.arg("run").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Scrape fares and write the archive and report"))
        .stdout(predicate::str::contains("--plan"))
        .stdout(predicate::str::contains("--source"))
        .stdout(predicate::str::contains("--mailto"))
        .stdout(predicate::str::contains("--debug"));
}

#[test]
fn test_run_without_searches_fails() {
    run_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to search"));
}

#[test]
fn test_run_rejects_bad_airport_code() {
    run_cmd()
        .args(["--source", "bing", "--origin", "san francisco", "--destination", "phl"])
        .args(["--date", "2026-12-21"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("three-letter airport code"));
}

#[test]
fn test_run_rejects_invalid_plan() {
    let dir = tempfile::tempdir().unwrap();
    let plan = dir.path().join("plan.json");
    std::fs::write(&plan, r#"{ "searches": [ { "source": "aa" } ] }"#).unwrap();

    run_cmd()
        .arg("--plan")
        .arg(&plan)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid plan"));
}

#[test]
fn test_run_plan_conflicts_with_source_flags() {
    run_cmd()
        .args(["--plan", "plan.json", "--source", "bing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_run_fails_when_chrome_missing() {
    let dir = tempfile::tempdir().unwrap();

    run_cmd()
        .args(["--source", "delta", "--origin", "sfo", "--destination", "phl"])
        .args(["--date", "2026-12-21", "--chrome", "/nonexistent/chrome"])
        .arg("--output-dir")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Chrome not found"));

    // nothing is archived for a run that never started
    assert!(!dir.path().join("runs").exists());
}
