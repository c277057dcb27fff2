//! In-memory [VersionControl] that records every call, for exercising a deploy without a repository.

use super::{CommitMessage, CommitRecord, VersionControl};
use crate::errors::{DeployError, DeployResult};
use std::{
    cell::{Cell, RefCell},
    collections::HashSet,
    path::{Path, PathBuf},
};

#[derive(Default)]
pub(crate) struct MemoryRepository {
    /// Main line history, newest first.
    pub(crate) history: Vec<CommitRecord>,
    /// Number of upcoming `commit` calls that fail as a rejecting hook would.
    pub(crate) failing_commits: Cell<usize>,
    /// Operations performed, in order.
    pub(crate) calls: RefCell<Vec<String>>,
    pub(crate) branches: RefCell<HashSet<String>>,
    pub(crate) staged: RefCell<Vec<PathBuf>>,
    pub(crate) committed: RefCell<Vec<CommitMessage>>,
    pub(crate) pushed: RefCell<Vec<(String, String)>>,
}

impl MemoryRepository {
    pub(crate) fn with_history(history: Vec<CommitRecord>) -> Self {
        Self {
            history,
            ..Default::default()
        }
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl VersionControl for MemoryRepository {
    fn sync(&self, branch: &str, remote: &str) -> DeployResult<()> {
        self.record(format!("sync {} {}", branch, remote));
        Ok(())
    }

    fn recent_commits(&self, branch: &str, limit: usize) -> DeployResult<Vec<CommitRecord>> {
        self.record(format!("log {} {}", branch, limit));
        Ok(self.history.iter().take(limit).cloned().collect())
    }

    fn create_branch(&self, name: &str) -> DeployResult<()> {
        self.record(format!("branch {}", name));
        if !self.branches.borrow_mut().insert(name.to_string()) {
            return Err(git2::Error::from_str("a branch with that name already exists").into());
        }
        Ok(())
    }

    fn stage(&self, path: &Path) -> DeployResult<()> {
        self.record(format!("add {}", path.display()));
        self.staged.borrow_mut().push(path.to_path_buf());
        Ok(())
    }

    fn commit(&self, message: &CommitMessage) -> DeployResult<()> {
        self.record(format!("commit {}", message.summary));
        let failing = self.failing_commits.get();
        if failing > 0 {
            self.failing_commits.set(failing - 1);
            return Err(DeployError::GitCommand {
                command: "commit".to_string(),
                stderr: "pre-commit hook failed".to_string(),
            });
        }
        self.committed.borrow_mut().push(message.clone());
        Ok(())
    }

    fn push(&self, remote: &str, branch: &str) -> DeployResult<()> {
        self.record(format!("push {} {}", remote, branch));
        self.pushed
            .borrow_mut()
            .push((remote.to_string(), branch.to_string()));
        Ok(())
    }
}
