//! Errors that can occur while preparing a deploy.

use nu_ansi_term::Color;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeployError {
    /// The deploy manifest for the selected scope does not exist.
    #[error("Deploy file not found: `{}`", Color::Blue.paint(.0.display().to_string()))]
    DeployFileNotFound(PathBuf),
    /// No commit for the pull request within the searched history window.
    #[error(
        "Commit not found: no commit for PR #{pr_id} in the last {window} commits of `{}`.",
        Color::Blue.paint(.branch)
    )]
    CommitNotFound {
        pr_id: u64,
        branch: String,
        window: usize,
    },
    /// The deploy manifest does not have the expected shape.
    #[error("Malformed deploy file `{}`: {reason}", .path.display())]
    MalformedManifest { path: PathBuf, reason: String },
    /// The configuration file could not be read or parsed.
    #[error("Invalid config file `{}`: {reason}", .path.display())]
    ConfigFile { path: PathBuf, reason: String },
    /// A `git` subprocess exited unsuccessfully.
    #[error("`git {command}` failed: {stderr}")]
    GitCommand { command: String, stderr: String },
    /// A [git2::Error] occurred.
    #[error("libgit2 error: {}", .0)]
    Git2Error(#[from] git2::Error),
    /// An [inquire::InquireError] occurred.
    #[error("inquire error: {}", .0)]
    InquireError(#[from] inquire::InquireError),
    /// An [std::io::Error] occurred.
    #[error("io error: {}", .0)]
    Io(#[from] std::io::Error),
    /// A [serde_json::Error] occurred.
    #[error("json error: {}", .0)]
    Json(#[from] serde_json::Error),
}

pub type DeployResult<T> = Result<T, DeployError>;
