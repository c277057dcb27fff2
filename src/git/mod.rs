//! Version control operations used to cut a deploy branch.

use crate::errors::DeployResult;
use std::{fmt, path::Path};

mod repository;
pub use repository::GitRepository;

#[cfg(test)]
pub(crate) mod fixture;
#[cfg(test)]
pub(crate) mod memory;

/// A commit on the main line, as needed to match it against a pull request.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct CommitRecord {
    /// The full hex object id.
    pub hash: String,
    /// The first line of the commit message.
    pub summary: String,
    /// The author's recorded name.
    pub author_name: String,
    /// Paths changed relative to the first parent, in diff order.
    pub changed_files: Vec<String>,
}

/// A commit message made of a summary line and a body paragraph.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CommitMessage {
    pub summary: String,
    pub body: String,
}

impl fmt::Display for CommitMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n\n{}", self.summary, self.body)
    }
}

/// The version control backend driven by a deploy.
pub trait VersionControl {
    /// Checks out `branch` and pulls it from `remote`.
    fn sync(&self, branch: &str, remote: &str) -> DeployResult<()>;

    /// Returns up to `limit` commits reachable from `branch`, newest first.
    fn recent_commits(&self, branch: &str, limit: usize) -> DeployResult<Vec<CommitRecord>>;

    /// Creates a new local branch at `HEAD` and checks it out. Fails if the branch exists.
    fn create_branch(&self, name: &str) -> DeployResult<()>;

    /// Stages the file at `path`.
    fn stage(&self, path: &Path) -> DeployResult<()>;

    /// Commits the staged changes.
    fn commit(&self, message: &CommitMessage) -> DeployResult<()>;

    /// Pushes `branch` to `remote`.
    fn push(&self, remote: &str, branch: &str) -> DeployResult<()>;
}
