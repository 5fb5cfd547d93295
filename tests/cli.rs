use assert_cmd::Command;
use predicates::prelude::*;

fn spellmark() -> Command {
    Command::cargo_bin("spellmark").unwrap()
}

#[test]
fn test_help_lists_options() {
    spellmark()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--fix"))
        .stdout(predicate::str::contains("--language"));
}

#[test]
fn test_no_files_is_an_error() {
    spellmark()
        .assert()
        .failure()
        .stderr(predicate::str::contains("No files specified"));
}

#[test]
fn test_unknown_format_rejected() {
    spellmark()
        .args(["--format", "yaml", "somefile.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown format"));
}

#[test]
fn test_interactive_requires_fix() {
    spellmark()
        .args(["--interactive", "somefile.txt"])
        .assert()
        .failure();
}

#[test]
fn test_completion_generation() {
    spellmark()
        .args(["--completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("spellmark"));
}
