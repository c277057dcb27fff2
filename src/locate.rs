//! Locating the main line commit that merged a pull request.

use crate::{errors::DeployResult, git::CommitRecord, prompt::Confirm};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

/// Matches the `(#1234)` pull request reference appended to squash-merge summaries.
static PR_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(#(\d+)\)").expect("valid regex"));

/// Returns `true` iff the first `(#<digits>)` token in `message` names `pr_id`.
///
/// The digits are compared as text, so `(#042)` does not name PR 42.
pub fn references_pr(message: &str, pr_id: u64) -> bool {
    PR_TOKEN
        .captures(message)
        .and_then(|c| c.get(1))
        .is_some_and(|m| m.as_str() == pr_id.to_string())
}

/// Finds the first commit in `commits` whose summary references `pr_id`.
///
/// A referencing commit authored by someone other than `author_name` is only returned if `confirm`
/// accepts it; otherwise the search moves on to the next commit.
///
/// ## Returns
/// - `Ok(Some(commit))` - The commit that merged the pull request.
/// - `Ok(None)` - No accepted commit references the pull request.
pub fn locate_commit<'c, C: Confirm + ?Sized>(
    commits: &'c [CommitRecord],
    pr_id: u64,
    author_name: &str,
    confirm: &mut C,
) -> DeployResult<Option<&'c CommitRecord>> {
    for commit in commits {
        if !references_pr(&commit.summary, pr_id) {
            continue;
        }

        if commit.author_name == author_name {
            info!(hash = %commit.hash, "found commit for PR #{}", pr_id);
            return Ok(Some(commit));
        }

        debug!(
            hash = %commit.hash,
            author = %commit.author_name,
            "commit for PR #{} has an unexpected author", pr_id
        );
        let question = format!("Commit {} is not authored by {}", commit.hash, author_name);
        if confirm.confirm(&question)? {
            info!(hash = %commit.hash, "accepted commit for PR #{}", pr_id);
            return Ok(Some(commit));
        }
    }

    Ok(None)
}
