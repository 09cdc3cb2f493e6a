// tests/git_cli_test.rs
use std::path::Path;
use std::process::Command;

use git_flow::git::{Backend, GitCli};
use git_flow::FlowError;
use tempfile::TempDir;

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "Test User")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "Test User")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .output()
        .expect("Failed to execute git");
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn commit(dir: &Path, message: &str) -> String {
    git(dir, &["commit", "--allow-empty", "-m", message]);
    git(dir, &["rev-parse", "HEAD"])
}

/// A bare remote plus a clone with `develop` pushed and `feature/work`
/// checked out, so `develop` can be moved without touching the worktree.
struct Remote {
    root: TempDir,
}

impl Remote {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        git(root.path(), &["init", "--bare", "origin.git"]);
        git(root.path(), &["clone", "origin.git", "local"]);

        let local = root.path().join("local");
        git(&local, &["checkout", "-b", "develop"]);
        commit(&local, "chore: initial commit");
        git(&local, &["push", "origin", "develop"]);
        git(&local, &["checkout", "-b", "feature/work"]);
        Remote { root }
    }

    fn local(&self) -> std::path::PathBuf {
        self.root.path().join("local")
    }

    fn backend(&self) -> GitCli {
        GitCli::new("origin").in_dir(self.local())
    }

    /// Push a commit to `develop` from a second clone
    fn advance_remote_develop(&self, message: &str) -> String {
        git(self.root.path(), &["clone", "--branch", "develop", "origin.git", "other"]);
        let other = self.root.path().join("other");
        let head = commit(&other, message);
        git(&other, &["push", "origin", "develop"]);
        head
    }
}

#[test]
fn test_fetch_keeps_local_branch_that_is_ahead() {
    let remote = Remote::new();
    let local = remote.local();
    git(&local, &["checkout", "develop"]);
    let ahead = commit(&local, "feat: not pushed yet");
    git(&local, &["checkout", "feature/work"]);

    remote.backend().fetch_branch("develop").unwrap();

    assert_eq!(git(&local, &["rev-parse", "develop"]), ahead);
}

#[test]
fn test_fetch_fast_forwards_local_branch_that_is_behind() {
    let remote = Remote::new();
    let pushed = remote.advance_remote_develop("fix: pushed elsewhere");

    remote.backend().fetch_branch("develop").unwrap();

    let local = remote.local();
    assert_eq!(git(&local, &["rev-parse", "develop"]), pushed);
    assert_eq!(git(&local, &["rev-parse", "origin/develop"]), pushed);
}

#[test]
fn test_fetch_leaves_diverged_branch_for_the_merge() {
    let remote = Remote::new();
    let pushed = remote.advance_remote_develop("fix: pushed elsewhere");
    let local = remote.local();
    git(&local, &["checkout", "develop"]);
    let mine = commit(&local, "feat: local work");
    git(&local, &["checkout", "feature/work"]);

    remote.backend().fetch_branch("develop").unwrap();

    assert_eq!(git(&local, &["rev-parse", "develop"]), mine);
    assert_eq!(git(&local, &["rev-parse", "origin/develop"]), pushed);
}

#[test]
fn test_fetch_branch_missing_on_remote_is_not_an_error() {
    let remote = Remote::new();
    remote.backend().fetch_branch("feature/work").unwrap();
}

#[test]
fn test_fetch_from_unreachable_remote_is_a_network_error() {
    let remote = Remote::new();
    let local = remote.local();
    let gone = remote.root.path().join("gone.git");
    git(&local, &["remote", "set-url", "origin", gone.to_str().unwrap()]);

    let result = remote.backend().fetch_branch("develop");
    assert!(matches!(result, Err(FlowError::Network(_))), "{:?}", result);
}

#[test]
fn test_has_merged_survives_branch_deletion() {
    let remote = Remote::new();
    let local = remote.local();
    commit(&local, "feat: work");
    git(&local, &["checkout", "develop"]);
    git(&local, &["merge", "--no-ff", "--no-edit", "feature/work"]);
    git(&local, &["branch", "-d", "feature/work"]);

    let backend = remote.backend();
    assert!(backend.has_merged("feature/work", "develop").unwrap());
    assert!(!backend.has_merged("feature/never", "develop").unwrap());
}
