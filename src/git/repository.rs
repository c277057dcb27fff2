//! [VersionControl] backed by a local `git` repository.

use super::{CommitMessage, CommitRecord, VersionControl};
use crate::errors::{DeployError, DeployResult};
use git2::{build::CheckoutBuilder, BranchType, Commit, ErrorCode, Repository, Sort};
use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::Command,
};
use tracing::debug;

/// Extension trait for the [Repository] type to expose helper functions used while cutting a deploy.
pub trait RepositoryExt {
    /// Checks out a local branch with the given `branch_name`.
    ///
    /// ## Takes
    /// - `branch_name` - The name of the branch to checkout.
    ///
    /// ## Returns
    /// - `Result<()>` - The result of the operation.
    fn checkout_branch(&self, branch_name: &str) -> Result<(), git2::Error>;

    /// Creates the local branch `branch_name` from `<remote>/<branch_name>`, tracking it, unless
    /// the local branch already exists.
    fn ensure_local_branch(&self, branch_name: &str, remote: &str) -> Result<(), git2::Error>;

    /// Returns the paths changed by `commit` relative to its first parent. Root commits are
    /// compared against the empty tree.
    fn changed_files(&self, commit: &Commit<'_>) -> Result<Vec<String>, git2::Error>;

    /// Assembles the [CommitRecord] for `commit`.
    fn commit_record(&self, commit: &Commit<'_>) -> Result<CommitRecord, git2::Error>;
}

impl RepositoryExt for Repository {
    fn checkout_branch(&self, branch_name: &str) -> Result<(), git2::Error> {
        let ref_name = format!("refs/heads/{}", branch_name);
        let target = self.revparse_single(ref_name.as_str())?;
        self.checkout_tree(&target, Some(CheckoutBuilder::new().safe()))?;
        self.set_head(ref_name.as_str())
    }

    fn ensure_local_branch(&self, branch_name: &str, remote: &str) -> Result<(), git2::Error> {
        match self.find_branch(branch_name, BranchType::Local) {
            Ok(_) => return Ok(()),
            Err(e) if e.code() == ErrorCode::NotFound => {}
            Err(e) => return Err(e),
        }

        let upstream = format!("{}/{}", remote, branch_name);
        let commit = self
            .find_branch(upstream.as_str(), BranchType::Remote)?
            .get()
            .peel_to_commit()?;
        let mut branch = self.branch(branch_name, &commit, false)?;
        branch.set_upstream(Some(upstream.as_str()))?;
        debug!(branch = branch_name, %upstream, "created local branch from remote");
        Ok(())
    }

    fn changed_files(&self, commit: &Commit<'_>) -> Result<Vec<String>, git2::Error> {
        let tree = commit.tree()?;
        let parent_tree = commit.parents().next().map(|p| p.tree()).transpose()?;
        let diff = self.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;

        let files = diff
            .deltas()
            .filter_map(|delta| delta.new_file().path().or_else(|| delta.old_file().path()))
            .map(|path| path.to_string_lossy().into_owned())
            .collect();
        Ok(files)
    }

    fn commit_record(&self, commit: &Commit<'_>) -> Result<CommitRecord, git2::Error> {
        Ok(CommitRecord {
            hash: commit.id().to_string(),
            summary: commit.summary().unwrap_or_default().to_string(),
            author_name: commit.author().name().unwrap_or_default().to_string(),
            changed_files: self.changed_files(commit)?,
        })
    }
}

/// A local repository with a working directory.
///
/// Checkout, history and branch creation go through `libgit2`. Pull, stage, commit and push run the
/// `git` binary so that the operator's credential helpers and commit hooks apply.
pub struct GitRepository {
    repository: Repository,
    workdir: PathBuf,
}

impl GitRepository {
    /// Opens the repository at `path`.
    pub fn open(path: &Path) -> DeployResult<Self> {
        let repository = Repository::open(path)?;
        let workdir = repository
            .workdir()
            .ok_or_else(|| git2::Error::from_str("repository has no working directory"))?
            .to_path_buf();
        Ok(Self {
            repository,
            workdir,
        })
    }

    /// Runs `git` with `args` in the working directory, returning its standard output.
    fn git<I, S>(&self, args: I) -> DeployResult<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args = args
            .into_iter()
            .map(|a| a.as_ref().to_os_string())
            .collect::<Vec<OsString>>();
        let command = args
            .iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");
        debug!(%command, "running git");

        let output = Command::new("git")
            .args(&args)
            .current_dir(&self.workdir)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let stderr = if stderr.is_empty() {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            } else {
                stderr
            };
            return Err(DeployError::GitCommand { command, stderr });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl VersionControl for GitRepository {
    fn sync(&self, branch: &str, remote: &str) -> DeployResult<()> {
        self.repository.ensure_local_branch(branch, remote)?;
        self.repository.checkout_branch(branch)?;
        self.git(["pull", remote, branch])?;
        Ok(())
    }

    fn recent_commits(&self, branch: &str, limit: usize) -> DeployResult<Vec<CommitRecord>> {
        let mut revwalk = self.repository.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;
        revwalk.push_ref(format!("refs/heads/{}", branch).as_str())?;

        revwalk
            .take(limit)
            .map(|oid| -> DeployResult<CommitRecord> {
                let commit = self.repository.find_commit(oid?)?;
                Ok(self.repository.commit_record(&commit)?)
            })
            .collect()
    }

    fn create_branch(&self, name: &str) -> DeployResult<()> {
        let head_commit = self.repository.head()?.peel_to_commit()?;
        self.repository.branch(name, &head_commit, false)?;
        self.repository.checkout_branch(name)?;
        Ok(())
    }

    fn stage(&self, path: &Path) -> DeployResult<()> {
        self.git([OsStr::new("add"), path.as_os_str()])?;
        Ok(())
    }

    fn commit(&self, message: &CommitMessage) -> DeployResult<()> {
        debug!(%message, "committing");
        self.git([
            "commit",
            "-m",
            message.summary.as_str(),
            "-m",
            message.body.as_str(),
        ])?;
        Ok(())
    }

    fn push(&self, remote: &str, branch: &str) -> DeployResult<()> {
        self.git(["push", remote, branch])?;
        Ok(())
    }
}
