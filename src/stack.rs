//! Stack extraction
//!
//! Reads the ordered commit range between the trunk fork point and the branch
//! tip and turns it into [`StackEntry`] values keyed by the `Change-Id:`
//! trailer. Extraction is read-only; a commit without a trailer is an error,
//! never repaired here.

use crate::config::StackContext;
use crate::error::{Error, Result};
use crate::git::Git;
use crate::types::{ChangeId, StackEntry};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Matcher for the identity trailer injected by the commit-msg hook
pub fn change_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Change-Id: (I[0-9a-f]{40})").expect("hardcoded regex is valid")
    })
}

/// Whether `branch` looks like a branch prstack itself generated
#[must_use]
pub fn is_generated_branch(branch: &str, branch_prefix: &str) -> bool {
    static TAIL: OnceLock<Regex> = OnceLock::new();
    let tail = TAIL.get_or_init(|| Regex::new(r"I[0-9a-f]{40}$").expect("hardcoded regex is valid"));
    branch.starts_with(branch_prefix) && tail.is_match(branch)
}

/// Raw commit data before identity extraction
#[derive(Debug, Clone)]
pub struct RawCommit {
    /// Commit sha
    pub sha: String,
    /// Subject line
    pub subject: String,
    /// Message body, trailers included
    pub body: String,
}

/// Extract the last `Change-Id:` trailer from a commit body
#[must_use]
pub fn parse_change_id(body: &str) -> Option<ChangeId> {
    change_id_re()
        .captures_iter(body)
        .last()
        .map(|c| ChangeId::new(&c[1]))
}

/// Build the ordered stack from raw commits, oldest first.
///
/// Fails with [`Error::MissingChangeId`] on the first untagged commit and
/// [`Error::DuplicateChangeId`] when two commits share an identifier. A commit
/// that lost its trailer mid-stack is indistinguishable from one that never
/// had it and gets the same hard error; the stale remote unit is left alone
/// for the operator to sort out.
pub fn entries_from_commits(commits: Vec<RawCommit>) -> Result<Vec<StackEntry>> {
    if commits.is_empty() {
        return Err(Error::EmptyStack);
    }

    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(commits.len());

    for commit in commits {
        let change_id = parse_change_id(&commit.body).ok_or(Error::MissingChangeId {
            commit: commit.sha.clone(),
        })?;
        if !seen.insert(change_id.clone()) {
            return Err(Error::DuplicateChangeId(change_id.to_string()));
        }
        entries.push(StackEntry {
            change_id,
            commit_sha: commit.sha,
            title: commit.subject,
            body: commit.body,
        });
    }

    Ok(entries)
}

/// Read the stack between the trunk fork point and `HEAD`
pub async fn read_stack(git: &Git, ctx: &StackContext) -> Result<Vec<StackEntry>> {
    let base = git.fork_point(&ctx.remote, &ctx.trunk_branch).await?;
    let shas = git.rev_list(&base, "HEAD").await?;

    let mut commits = Vec::with_capacity(shas.len());
    for sha in shas {
        let subject = git.commit_subject(&sha).await?;
        let body = git.commit_body(&sha).await?;
        commits.push(RawCommit {
            sha,
            subject,
            body,
        });
    }

    entries_from_commits(commits)
}
