use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn test_help_lists_subcommands() {
    let mut cmd = Command::cargo_bin("skinlens").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("index"))
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("search"));
}

#[test]
fn test_search_without_index_fails_with_hint() {
    let dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("skinlens").unwrap();
    cmd.current_dir(dir.path())
        .args(["search", "sodium"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No index found"));
}

#[test]
fn test_stats_without_index_fails_with_hint() {
    let dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("skinlens").unwrap();
    cmd.current_dir(dir.path())
        .arg("stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No index found"));
}
