//! Core types for prstack

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The stable identifier embedded in a commit message trailer.
///
/// Assigned once by the commit-msg hook and never regenerated, it survives
/// rebases and message edits and is the sole key used to match a local commit
/// to its remote pull request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeId(String);

impl ChangeId {
    /// Wrap an already-validated identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One local commit of the stack, oldest first (index 0 = closest to trunk)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackEntry {
    /// Stable identifier recovered from the `Change-Id:` trailer
    pub change_id: ChangeId,
    /// Commit sha; stands in for the commit's tree/content state
    pub commit_sha: String,
    /// Commit subject, used verbatim as the pull request title
    pub title: String,
    /// Commit body (trailers included), source of the pull request body
    pub body: String,
}

impl StackEntry {
    /// Abbreviated sha for display
    #[must_use]
    pub fn short_sha(&self) -> &str {
        &self.commit_sha[..self.commit_sha.len().min(7)]
    }
}

/// Lifecycle state of a remote pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PullState {
    /// Open for review
    Open,
    /// Closed without merging
    Closed,
    /// Merged; immutable, kept only as chain-base history
    Merged,
}

/// A pull request / merge request as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR/MR number
    pub number: u64,
    /// Web URL
    pub html_url: String,
    /// Head branch name
    pub head_ref: String,
    /// Sha the head branch currently points at
    pub head_sha: String,
    /// Base branch name
    pub base_ref: String,
    /// Title
    pub title: String,
    /// Body text
    pub body: String,
    /// Lifecycle state
    pub state: PullState,
    /// Draft marking
    pub draft: bool,
    /// Last update timestamp, used to de-duplicate host listings
    pub updated_at: Option<DateTime<Utc>>,
}

/// A previously created branch+pull-request pair discovered on the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUnit {
    /// Stable identifier recovered from the branch name
    pub change_id: ChangeId,
    /// The pull request backing this unit
    pub pull: PullRequest,
}

impl RemoteUnit {
    /// The unit's head branch name
    #[must_use]
    pub fn branch(&self) -> &str {
        &self.pull.head_ref
    }

    /// Whether this unit can still be mutated
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.pull.state == PullState::Open
    }
}

/// A git remote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitRemote {
    /// Remote name (e.g. "origin")
    pub name: String,
    /// Remote URL
    pub url: String,
}

/// Detected host type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostKind {
    /// GitHub or GitHub Enterprise
    GitHub,
    /// GitLab or self-hosted GitLab
    GitLab,
}

/// Remote host configuration
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Host type
    pub kind: HostKind,
    /// Repository owner (user or organization, nested groups on GitLab)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Custom host (None for github.com/gitlab.com)
    pub host: Option<String>,
}
