//! CLI surface tests

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_commands() {
    Command::cargo_bin("prstack")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("push"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("checkout"))
        .stdout(predicate::str::contains("setup"));
}

#[test]
fn push_help_shows_reconciliation_flags() {
    Command::cargo_bin("prstack")
        .unwrap()
        .args(["push", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--next-only"))
        .stdout(predicate::str::contains("--trunk"))
        .stdout(predicate::str::contains("--only-update"));
}

#[test]
fn checkout_help_shows_stack_selection_flags() {
    Command::cargo_bin("prstack")
        .unwrap()
        .args(["checkout", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--author"))
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--branch-prefix"));
}

#[test]
fn fails_cleanly_outside_a_repository() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("prstack")
        .unwrap()
        .args(["push", "--dry-run"])
        .current_dir(dir.path())
        .assert()
        .failure();
}

/// Repository on branch `topic` where trunk and tip sit on the same commit,
/// so the stack range is empty.
fn repo_with_empty_range() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let git = |args: &[&str]| {
        let status = std::process::Command::new("git")
            .args(args)
            .current_dir(dir.path())
            .status()
            .unwrap();
        assert!(status.success(), "git {args:?} failed");
    };
    git(&["init", "--quiet"]);
    git(&["config", "user.name", "Alice"]);
    git(&["config", "user.email", "alice@example.com"]);
    git(&["config", "core.logAllRefUpdates", "always"]);
    git(&["commit", "--allow-empty", "--quiet", "-m", "init"]);
    git(&["checkout", "--quiet", "-b", "topic"]);
    git(&["remote", "add", "origin", "https://github.com/alice/project.git"]);
    git(&["update-ref", "refs/remotes/origin/main", "HEAD"]);
    dir
}

#[test]
fn push_with_empty_range_is_a_clean_noop() {
    let dir = repo_with_empty_range();
    Command::cargo_bin("prstack")
        .unwrap()
        .args([
            "push",
            "--skip-rebase",
            "--trunk",
            "origin/main",
            "--branch-prefix",
            "stack/alice",
        ])
        .env("GITHUB_TOKEN", "unused")
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to do"));
}

#[test]
fn list_with_empty_range_reports_no_commits() {
    let dir = repo_with_empty_range();
    Command::cargo_bin("prstack")
        .unwrap()
        .args([
            "list",
            "--trunk",
            "origin/main",
            "--branch-prefix",
            "stack/alice",
        ])
        .env("GITHUB_TOKEN", "unused")
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("no commits in stack"));
}

#[test]
fn setup_installs_hook_in_fresh_repository() {
    let dir = tempfile::tempdir().unwrap();
    std::process::Command::new("git")
        .args(["init", "--quiet"])
        .current_dir(dir.path())
        .status()
        .unwrap();

    Command::cargo_bin("prstack")
        .unwrap()
        .arg("setup")
        .current_dir(dir.path())
        .assert()
        .success();

    let hook = dir.path().join(".git").join("hooks").join("commit-msg");
    assert!(hook.exists());

    Command::cargo_bin("prstack")
        .unwrap()
        .args(["setup", "--check"])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("up to date"));
}
