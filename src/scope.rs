//! Checking that a pull request only touched its own DAG directory.

use crate::{constants::DAGS_DIR, errors::DeployResult, prompt::Confirm};
use itertools::Itertools;
use tracing::{debug, warn};

/// Returns `true` iff `path` lives under `dags/<dag_name>`.
pub fn in_dag_dir(path: &str, dag_name: &str) -> bool {
    path.strip_prefix(DAGS_DIR)
        .and_then(|rest| rest.strip_prefix('/'))
        .and_then(|rest| rest.split('/').next())
        .is_some_and(|segment| segment == dag_name)
}

/// Checks that every path in `changed_files` lives under `dags/<dag_name>`.
///
/// Each path outside of it is put to `confirm`. The check fails as soon as one of them is declined.
///
/// ## Returns
/// - `Ok(true)` - All paths are in scope, or every out-of-scope path was accepted.
/// - `Ok(false)` - An out-of-scope path was declined.
pub fn validate_scope<S, C>(changed_files: &[S], dag_name: &str, confirm: &mut C) -> DeployResult<bool>
where
    S: AsRef<str>,
    C: Confirm + ?Sized,
{
    let out_of_scope = changed_files
        .iter()
        .map(AsRef::<str>::as_ref)
        .filter(|path| !in_dag_dir(path, dag_name))
        .collect::<Vec<_>>();

    if out_of_scope.is_empty() {
        debug!("all {} changed files are in {}/{}", changed_files.len(), DAGS_DIR, dag_name);
        return Ok(true);
    }
    warn!(
        "files outside of {}/{}: {}",
        DAGS_DIR,
        dag_name,
        out_of_scope.iter().join(", ")
    );

    for path in out_of_scope {
        let question = format!("File {} is not in {}/{} directory", path, DAGS_DIR, dag_name);
        if !confirm.confirm(&question)? {
            return Ok(false);
        }
    }

    Ok(true)
}
