//! Git repositories holding template trees.

use std::path::Path;
use std::process::Command;

/// Commit everything under `path`, initialising a repository on `main` first
/// if there is none.
///
/// Realism level: **REAL WITH HISTORY**, built with the `git` CLI.
///
/// # Panics
/// Panics if any git operation fails.
pub fn commit_all(path: &Path, message: &str) {
    let fresh = !path.join(".git").exists();
    if fresh {
        run(path, &["init"]);
        run(path, &["config", "user.email", "test@test.com"]);
        run(path, &["config", "user.name", "Test User"]);
        run(path, &["config", "commit.gpgsign", "false"]);
    }
    run(path, &["add", "-A"]);
    run(path, &["commit", "--allow-empty", "-m", message]);
    if fresh {
        // Best-effort: older git versions may not support renaming here
        let _ = Command::new("git")
            .args(["branch", "-M", "main"])
            .current_dir(path)
            .output();
    }
}

/// Create and switch to `branch` in the repository at `path`.
///
/// # Panics
/// Panics if the git command fails.
pub fn checkout_new_branch(path: &Path, branch: &str) {
    run(path, &["checkout", "-b", branch]);
}

/// Tag the current commit with a lightweight tag `name`.
///
/// # Panics
/// Panics if the git command fails.
pub fn tag(path: &Path, name: &str) {
    run(path, &["tag", name]);
}

/// Switch to an existing `branch`.
///
/// # Panics
/// Panics if the git command fails.
pub fn checkout(path: &Path, branch: &str) {
    run(path, &["checkout", branch]);
}

fn run(path: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(path)
        .output()
        .unwrap_or_else(|e| panic!("git fixture: failed to run `git {args:?}`: {e}"));
    if !output.status.success() {
        panic!(
            "git fixture: `git {args:?}` failed:\n{}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
}
