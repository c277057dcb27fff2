//! Constants for the `deploy-commit` application.

/// The main line that deploy branches are cut from.
pub(crate) const DEFAULT_MAIN_BRANCH: &str = "main";

/// The remote that the main line is pulled from and deploy branches are pushed to.
pub(crate) const DEFAULT_REMOTE: &str = "origin";

/// Web base for commit pages, linked from the deploy commit body.
pub(crate) const DEFAULT_COMMIT_URL: &str = "https://github.com/moloco/airflow/commit";

/// Number of main line commits searched for the pull request's merge commit.
pub(crate) const HISTORY_WINDOW: usize = 10;

/// Directory holding one subdirectory per DAG.
pub(crate) const DAGS_DIR: &str = "dags";

/// Prefix of the branch created for a deploy.
pub(crate) const DEPLOY_BRANCH_PREFIX: &str = "deploy-";

/// Indentation used when rewriting a deploy manifest.
pub(crate) const MANIFEST_INDENT: &[u8] = b"    ";
