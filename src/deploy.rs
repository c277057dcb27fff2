//! Cutting a deploy branch for a merged pull request.

use crate::{
    config::DeployConfig,
    constants::HISTORY_WINDOW,
    errors::{DeployError, DeployResult},
    git::{CommitMessage, VersionControl},
    locate::locate_commit,
    manifest::DeployManifest,
    prompt::Confirm,
    scope::validate_scope,
};
use std::{fmt, path::Path};
use tracing::{debug, error, info, warn};

/// Progress of a deploy. Each stage is entered only after the previous one completed.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DeployStage {
    Init,
    Synced,
    CommitLocated,
    ScopeValidated,
    ManifestUpdated,
    Committed,
    Pushed,
}

impl fmt::Display for DeployStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Synced => "synced",
            Self::CommitLocated => "commit located",
            Self::ScopeValidated => "scope validated",
            Self::ManifestUpdated => "manifest updated",
            Self::Committed => "committed",
            Self::Pushed => "pushed",
        };
        f.write_str(name)
    }
}

/// How a deploy that did not fail ended.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DeployOutcome {
    /// The deploy branch was committed and pushed.
    Pushed { branch: String, commit_hash: String },
    /// The operator declined an out-of-scope change. Nothing was modified.
    Aborted,
}

/// Builds the message of the deploy commit pinning `commit_hash`.
pub fn deploy_commit_message(config: &DeployConfig, commit_hash: &str) -> CommitMessage {
    CommitMessage {
        summary: format!("Deploy PR for PR#{}", config.pr_id),
        body: format!(
            "Deploy #{} with Commit hash: [{hash}]({}/{hash})\nAuthor: {}",
            config.pr_id,
            config.commit_url.trim_end_matches('/'),
            config.pr_author,
            hash = commit_hash,
        ),
    }
}

/// Drives a single deploy against a [VersionControl] backend, asking `confirm` whenever the
/// located commit looks suspicious.
pub struct Deployer<'a, V: ?Sized, C: ?Sized> {
    config: &'a DeployConfig,
    vcs: &'a V,
    confirm: &'a mut C,
    stage: DeployStage,
}

impl<'a, V, C> Deployer<'a, V, C>
where
    V: VersionControl + ?Sized,
    C: Confirm + ?Sized,
{
    pub fn new(config: &'a DeployConfig, vcs: &'a V, confirm: &'a mut C) -> Self {
        Self {
            config,
            vcs,
            confirm,
            stage: DeployStage::Init,
        }
    }

    /// The last stage the deploy completed.
    pub fn stage(&self) -> DeployStage {
        self.stage
    }

    /// Runs the deploy to completion.
    ///
    /// ## Returns
    /// - `Ok(DeployOutcome::Pushed { .. })` - The deploy branch was pushed.
    /// - `Ok(DeployOutcome::Aborted)` - The operator declined an out-of-scope change.
    /// - `Err(_)` - A precondition failed or the backend errored. Nothing is rolled back.
    pub fn run(&mut self) -> DeployResult<DeployOutcome> {
        self.run_stages().inspect_err(|e| {
            error!(stage = %self.stage, "Deploy failed: {}", e);
        })
    }

    fn advance(&mut self, stage: DeployStage) {
        debug!(from = %self.stage, to = %stage, "deploy stage");
        self.stage = stage;
    }

    fn run_stages(&mut self) -> DeployResult<DeployOutcome> {
        let config = self.config;

        // Fail before touching the repository if there is no manifest to update.
        let manifest_path = config.ensure_manifest()?;

        self.vcs.sync(&config.main_branch, &config.remote)?;
        info!(
            "Checked out `{}` and pulled from `{}`",
            config.main_branch, config.remote
        );
        self.advance(DeployStage::Synced);

        let commits = self
            .vcs
            .recent_commits(&config.main_branch, HISTORY_WINDOW)?;
        let commit = locate_commit(
            &commits,
            config.pr_id,
            &config.pr_author,
            &mut *self.confirm,
        )?
        .cloned()
        .ok_or_else(|| DeployError::CommitNotFound {
            pr_id: config.pr_id,
            branch: config.main_branch.clone(),
            window: HISTORY_WINDOW,
        })?;
        self.advance(DeployStage::CommitLocated);

        if !validate_scope(&commit.changed_files, &config.dag_name, &mut *self.confirm)? {
            error!("User aborted");
            return Ok(DeployOutcome::Aborted);
        }
        self.advance(DeployStage::ScopeValidated);

        let branch = config.deploy_branch();
        self.vcs.create_branch(&branch)?;
        info!("Created branch {} and checked out", branch);

        let mut manifest = DeployManifest::load(&manifest_path)?;
        if manifest.dag_commit(&config.dag_name) == Some(commit.hash.as_str()) {
            warn!("DAG {} is already pinned to {}", config.dag_name, commit.hash);
        }
        let previous = manifest.set_dag_commit(&config.dag_name, &commit.hash)?;
        manifest.write()?;
        info!(
            ?previous,
            "Updated {} with commit hash \"{}\" for DAG: {}",
            manifest_path.display(),
            commit.hash,
            config.dag_name
        );
        self.advance(DeployStage::ManifestUpdated);

        let message = deploy_commit_message(config, &commit.hash);
        self.commit_with_retry(&manifest_path, &message)?;
        info!("Committed changes to deploy file");
        self.advance(DeployStage::Committed);

        self.vcs.push(&config.remote, &branch)?;
        info!("Pushed changes to remote branch \"{}\"", branch);
        self.advance(DeployStage::Pushed);

        Ok(DeployOutcome::Pushed {
            branch,
            commit_hash: commit.hash,
        })
    }

    /// Stages and commits `path`, trying once more if `git` rejects the first attempt.
    fn commit_with_retry(&self, path: &Path, message: &CommitMessage) -> DeployResult<()> {
        match self.stage_and_commit(path, message) {
            Err(DeployError::GitCommand { command, stderr }) => {
                warn!(%command, %stderr, "Possibly pre-commit hook failed, retrying commit");
                self.stage_and_commit(path, message)
            }
            result => result,
        }
    }

    fn stage_and_commit(&self, path: &Path, message: &CommitMessage) -> DeployResult<()> {
        self.vcs.stage(path)?;
        self.vcs.commit(message)
    }
}
