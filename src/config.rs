//! Configuration for a deploy, merged from an optional config file and command-line flags.

use crate::{
    constants::{DEFAULT_COMMIT_URL, DEFAULT_MAIN_BRANCH, DEFAULT_REMOTE, DEPLOY_BRANCH_PREFIX},
    errors::{DeployError, DeployResult},
    manifest::DeployManifest,
};
use clap::{error::ErrorKind, Args, ValueEnum};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

/// The environment a deploy targets. Selects the manifest that is updated.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployScope {
    Test,
    Prod,
}

impl DeployScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Prod => "prod",
        }
    }
}

impl fmt::Display for DeployScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Command-line flags for a deploy.
///
/// Every flag may instead be supplied by the config file; a flag given on the command line wins.
#[derive(Debug, Default, Clone, Eq, PartialEq, Args)]
pub struct DeployArgs {
    /// JSON (or `.toml`) file supplying values for any of the flags below.
    #[arg(long = "config_file", alias = "config-file", env = "DEPLOY_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,
    /// Number of the pull request to deploy.
    #[arg(long = "pr_id", alias = "pr-id")]
    pub pr_id: Option<u64>,
    /// Name of the pull request's author, as recorded on its merge commit.
    #[arg(long = "pr_author", alias = "pr-author")]
    pub pr_author: Option<String>,
    /// Environment to deploy to.
    #[arg(long = "pr_deploy_scope", alias = "pr-deploy-scope", value_enum)]
    pub pr_deploy_scope: Option<DeployScope>,
    /// Name of the DAG changed by the pull request.
    #[arg(long = "pr_dag_name", alias = "pr-dag-name")]
    pub pr_dag_name: Option<String>,
    /// Path to the repository holding the DAGs and deploy manifests.
    #[arg(long = "repo_path", alias = "repo-path")]
    pub repo_path: Option<PathBuf>,
    /// Main line branch [default: main]
    #[arg(long = "main_branch", alias = "main-branch")]
    pub main_branch: Option<String>,
    /// Remote to pull from and push to [default: origin]
    #[arg(long)]
    pub remote: Option<String>,
    /// Web base for commit links in the deploy commit message.
    #[arg(long = "commit_url", alias = "commit-url")]
    pub commit_url: Option<String>,
}

impl DeployArgs {
    /// Merges the flags over `file`, failing if a required value is found in neither.
    ///
    /// ## Returns
    /// - `Ok(DeployConfig)` - The resolved configuration.
    /// - `Err(_)` - A [clap::Error] of kind [ErrorKind::MissingRequiredArgument] naming every
    ///   missing flag.
    pub fn resolve(self, file: ConfigFile) -> Result<DeployConfig, clap::Error> {
        let pr_id = self.pr_id.or(file.pr_id);
        let pr_author = self.pr_author.or(file.pr_author);
        let pr_deploy_scope = self.pr_deploy_scope.or(file.pr_deploy_scope);
        let pr_dag_name = self.pr_dag_name.or(file.pr_dag_name);
        let repo_path = self.repo_path.or(file.repo_path);

        match (pr_id, pr_author, pr_deploy_scope, pr_dag_name, repo_path) {
            (Some(pr_id), Some(pr_author), Some(scope), Some(dag_name), Some(repo_path)) => {
                Ok(DeployConfig {
                    pr_id,
                    pr_author,
                    scope,
                    dag_name,
                    repo_path,
                    main_branch: self
                        .main_branch
                        .or(file.main_branch)
                        .unwrap_or_else(|| DEFAULT_MAIN_BRANCH.to_string()),
                    remote: self
                        .remote
                        .or(file.remote)
                        .unwrap_or_else(|| DEFAULT_REMOTE.to_string()),
                    commit_url: self
                        .commit_url
                        .or(file.commit_url)
                        .unwrap_or_else(|| DEFAULT_COMMIT_URL.to_string()),
                })
            }
            (pr_id, pr_author, scope, dag_name, repo_path) => {
                let missing = [
                    ("--pr_id <PR_ID>", pr_id.is_none()),
                    ("--pr_author <PR_AUTHOR>", pr_author.is_none()),
                    ("--pr_deploy_scope <PR_DEPLOY_SCOPE>", scope.is_none()),
                    ("--pr_dag_name <PR_DAG_NAME>", dag_name.is_none()),
                    ("--repo_path <REPO_PATH>", repo_path.is_none()),
                ]
                .into_iter()
                .filter_map(|(flag, missing)| missing.then(|| format!("  {}\n", flag)))
                .collect::<String>();

                Err(clap::Error::raw(
                    ErrorKind::MissingRequiredArgument,
                    format!("the following required arguments were not provided:\n{}", missing),
                ))
            }
        }
    }
}

/// The contents of a config file. Every field is optional; unknown keys are ignored.
#[derive(Debug, Default, Clone, Eq, PartialEq, Deserialize)]
pub struct ConfigFile {
    #[serde(default, deserialize_with = "deserialize_pr_id")]
    pub pr_id: Option<u64>,
    pub pr_author: Option<String>,
    pub pr_deploy_scope: Option<DeployScope>,
    pub pr_dag_name: Option<String>,
    pub repo_path: Option<PathBuf>,
    pub main_branch: Option<String>,
    pub remote: Option<String>,
    pub commit_url: Option<String>,
}

impl ConfigFile {
    /// Loads the config file at `path`, if one is given and exists.
    ///
    /// A missing file is not an error: every required value must then come from the command line.
    pub fn discover(path: Option<&Path>) -> DeployResult<Self> {
        match path {
            Some(path) if path.is_file() => {
                info!("Using config file for defaults: {}", path.display());
                Self::load(path)
            }
            _ => {
                warn!("Config file not found or not specified, will need all arguments from command line");
                Ok(Self::default())
            }
        }
    }

    /// Parses the config file at `path`. Files with a `.toml` extension are read as TOML, all
    /// others as JSON.
    pub fn load(path: &Path) -> DeployResult<Self> {
        let invalid = |reason: String| DeployError::ConfigFile {
            path: path.to_path_buf(),
            reason,
        };

        let contents = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&contents).map_err(|e| invalid(e.to_string()))
        } else {
            serde_json::from_str(&contents).map_err(|e| invalid(e.to_string()))
        }
    }
}

/// Accepts the pull request number either as a number or as a numeric string.
fn deserialize_pr_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PrId {
        Number(u64),
        Text(String),
    }

    match Option::<PrId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(PrId::Number(n)) => Ok(Some(n)),
        Some(PrId::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid pr_id `{}`", s))),
    }
}

/// Fully resolved configuration for a single deploy.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DeployConfig {
    pub pr_id: u64,
    pub pr_author: String,
    pub scope: DeployScope,
    pub dag_name: String,
    pub repo_path: PathBuf,
    pub main_branch: String,
    pub remote: String,
    pub commit_url: String,
}

impl DeployConfig {
    /// The branch that carries the deploy commit.
    pub fn deploy_branch(&self) -> String {
        format!("{}{}", DEPLOY_BRANCH_PREFIX, self.pr_id)
    }

    /// The manifest updated by this deploy.
    pub fn manifest_path(&self) -> PathBuf {
        DeployManifest::path_for(&self.repo_path, self.scope)
    }

    /// Returns [Self::manifest_path], or [DeployError::DeployFileNotFound] if it is not a file.
    pub fn ensure_manifest(&self) -> DeployResult<PathBuf> {
        let path = self.manifest_path();
        if !path.is_file() {
            return Err(DeployError::DeployFileNotFound(path));
        }
        Ok(path)
    }
}
