//! Throwaway repositories driven through the `git` binary, shared by backend tests.

use std::{fs, path::Path, process::Command};
use tempfile::TempDir;

/// Runs `git` with `args` in `dir`, panicking on failure, and returns its trimmed standard output.
pub(crate) fn run_git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Isolates the repository at `dir` from the operator's identity, signing and hook settings.
pub(crate) fn configure(dir: &Path, author: &str) {
    let hooks = dir.join(".git").join("hooks");
    let hooks = hooks.to_string_lossy();
    let email = format!("{author}@example.com");
    for (key, value) in [
        ("user.name", author),
        ("user.email", email.as_str()),
        ("commit.gpgsign", "false"),
        ("core.hooksPath", hooks.as_ref()),
        ("pull.rebase", "false"),
    ] {
        run_git(dir, &["config", key, value]);
    }
}

/// Writes `files` into `dir` and commits them as the configured author.
pub(crate) fn commit_files(dir: &Path, files: &[(&str, &str)], message: &str) -> String {
    for (name, content) in files {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        run_git(dir, &["add", name]);
    }
    run_git(dir, &["commit", "-m", message]);
    run_git(dir, &["rev-parse", "HEAD"])
}

/// A bare `origin` with a working clone whose `main` tracks it.
pub(crate) struct Upstream {
    pub(crate) bare: TempDir,
    pub(crate) work: TempDir,
}

impl Upstream {
    /// Seeds `origin/main` with `files`, committed from the working clone as `author`.
    pub(crate) fn new(files: &[(&str, &str)], author: &str) -> Self {
        let bare = tempfile::tempdir().unwrap();
        run_git(bare.path(), &["init", "--bare", "--initial-branch=main"]);

        let work = tempfile::tempdir().unwrap();
        run_git(work.path(), &["init", "--initial-branch=main"]);
        configure(work.path(), author);
        commit_files(work.path(), files, "initial");

        let url = bare.path().to_string_lossy();
        run_git(work.path(), &["remote", "add", "origin", url.as_ref()]);
        run_git(work.path(), &["push", "origin", "main"]);

        Self { bare, work }
    }

    /// Lands a commit on `origin/main` from a second clone, leaving the working clone behind.
    /// Returns the new commit's hash.
    pub(crate) fn land(&self, files: &[(&str, &str)], author: &str, message: &str) -> String {
        let other = tempfile::tempdir().unwrap();
        let url = self.bare.path().to_string_lossy();
        run_git(other.path(), &["clone", url.as_ref(), "."]);
        configure(other.path(), author);
        let hash = commit_files(other.path(), files, message);
        run_git(other.path(), &["push", "origin", "main"]);
        hash
    }

    /// The full message of the tip of `branch` on the remote.
    pub(crate) fn remote_message(&self, branch: &str) -> String {
        let rev = format!("refs/heads/{branch}");
        run_git(self.bare.path(), &["log", "-1", "--format=%B", rev.as_str()])
    }

    /// The contents of `path` at the tip of `branch` on the remote.
    pub(crate) fn remote_file(&self, branch: &str, path: &str) -> String {
        let spec = format!("refs/heads/{branch}:{path}");
        run_git(self.bare.path(), &["show", spec.as_str()])
    }
}

/// Installs a `pre-commit` hook in `dir` that rejects the first commit and accepts later ones.
/// Returns the marker file the hook leaves behind once it has rejected a commit.
#[cfg(unix)]
pub(crate) fn reject_first_commit(dir: &Path) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let hooks = dir.join(".git").join("hooks");
    let marker = dir.join(".git").join("rejected-once");
    fs::create_dir_all(&hooks).unwrap();

    let hook = hooks.join("pre-commit");
    fs::write(
        &hook,
        format!(
            "#!/bin/sh\n\
             if [ ! -f '{marker}' ]; then\n\
             \ttouch '{marker}'\n\
             \techo 'rejected by pre-commit' >&2\n\
             \texit 1\n\
             fi\n",
            marker = marker.display()
        ),
    )
    .unwrap();
    fs::set_permissions(&hook, fs::Permissions::from_mode(0o755)).unwrap();
    marker
}
