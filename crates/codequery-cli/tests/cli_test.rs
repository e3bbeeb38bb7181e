//! CLI smoke tests

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn codequery() -> Command {
    Command::cargo_bin("codequery").unwrap()
}

#[test]
fn test_help_lists_commands() {
    codequery()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("fetch"))
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("repl"));
}

#[test]
fn test_fetch_local_then_ls() {
    let source = TempDir::new().unwrap();
    fs::create_dir(source.path().join("src")).unwrap();
    fs::write(source.path().join("src/main.py"), "print('hi')\n").unwrap();
    fs::write(source.path().join("README.md"), "# readme\n").unwrap();

    let snapshot = TempDir::new().unwrap();
    let snapshot_dir = snapshot.path().join("codebase");

    codequery()
        .env("CODEQUERY_SNAPSHOT_DIR", &snapshot_dir)
        .args(["fetch", source.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Fetched 2 files"));

    codequery()
        .env("CODEQUERY_SNAPSHOT_DIR", &snapshot_dir)
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("src/main.py"))
        .stdout(predicate::str::contains("README.md"));

    codequery()
        .env("CODEQUERY_SNAPSHOT_DIR", &snapshot_dir)
        .args(["ls", "src/"])
        .assert()
        .success()
        .stdout(predicate::str::contains("src/main.py"))
        .stdout(predicate::str::contains("README.md").not());
}

#[test]
fn test_ls_without_snapshot_fails() {
    let empty = TempDir::new().unwrap();
    codequery()
        .env("CODEQUERY_SNAPSHOT_DIR", empty.path().join("missing"))
        .arg("ls")
        .assert()
        .failure();
}

#[test]
fn test_fetch_rejects_bad_source() {
    let snapshot = TempDir::new().unwrap();
    codequery()
        .env("CODEQUERY_SNAPSHOT_DIR", snapshot.path().join("codebase"))
        .args(["fetch", "/definitely/not/a/dir"])
        .assert()
        .failure();
}

#[test]
fn test_ask_requires_question() {
    let snapshot = TempDir::new().unwrap();
    codequery()
        .env("CODEQUERY_SNAPSHOT_DIR", snapshot.path().join("codebase"))
        .args(["ask", "  "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no question provided"));
}
