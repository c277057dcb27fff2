//! The per-scope deploy manifest, pinning each DAG to a commit.

use crate::{
    config::DeployScope,
    constants::MANIFEST_INDENT,
    errors::{DeployError, DeployResult},
};
use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Map, Serializer, Value};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// A deploy manifest, `{"version": {"dags": {<dag>: <commit hash>, ...}}, ...}`.
///
/// Keys outside of `version.dags` are carried through untouched, in their original order.
#[derive(Debug, Clone, PartialEq)]
pub struct DeployManifest {
    path: PathBuf,
    document: Value,
}

impl DeployManifest {
    /// Returns the path of the manifest for `scope` within the repository at `repo_path`.
    pub fn path_for(repo_path: &Path, scope: DeployScope) -> PathBuf {
        repo_path.join(format!("deploy_{}.json", scope))
    }

    /// Reads and parses the manifest at `path`.
    pub fn load(path: &Path) -> DeployResult<Self> {
        if !path.is_file() {
            return Err(DeployError::DeployFileNotFound(path.to_path_buf()));
        }
        let document = serde_json::from_str(&fs::read_to_string(path)?)?;
        Ok(Self {
            path: path.to_path_buf(),
            document,
        })
    }

    /// The path the manifest was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the commit hash recorded for `dag_name`, if any.
    pub fn dag_commit(&self, dag_name: &str) -> Option<&str> {
        self.document
            .get("version")?
            .get("dags")?
            .get(dag_name)?
            .as_str()
    }

    /// Records `commit_hash` as the deployed commit for `dag_name`.
    ///
    /// ## Returns
    /// - `Ok(Some(previous))` - The value that was replaced.
    /// - `Ok(None)` - The DAG was not recorded before.
    /// - `Err(_)` - The manifest has no `version.dags` object.
    pub fn set_dag_commit(&mut self, dag_name: &str, commit_hash: &str) -> DeployResult<Option<Value>> {
        let dags = self.dags_mut()?;
        Ok(dags.insert(dag_name.to_string(), Value::String(commit_hash.to_string())))
    }

    fn dags_mut(&mut self) -> DeployResult<&mut Map<String, Value>> {
        let path = &self.path;
        let malformed = |reason: &str| DeployError::MalformedManifest {
            path: path.clone(),
            reason: reason.to_string(),
        };
        self.document
            .get_mut("version")
            .ok_or_else(|| malformed("missing `version`"))?
            .get_mut("dags")
            .ok_or_else(|| malformed("missing `version.dags`"))?
            .as_object_mut()
            .ok_or_else(|| malformed("`version.dags` is not an object"))
    }

    /// Serializes the manifest with four-space indentation and no trailing newline.
    pub fn to_pretty_vec(&self) -> DeployResult<Vec<u8>> {
        let mut buf = Vec::new();
        let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(MANIFEST_INDENT));
        self.document.serialize(&mut ser)?;
        Ok(buf)
    }

    /// Replaces the manifest file on disk with the current document.
    pub fn write(&self) -> DeployResult<()> {
        let contents = self.to_pretty_vec()?;
        fs::remove_file(&self.path)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}
