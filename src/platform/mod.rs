//! Remote host services for GitHub and GitLab
//!
//! The reconciliation engine only ever talks to the host through the
//! [`RemoteHost`] trait, so the planner and executor are independent of any
//! concrete API. The trait's surface is exactly the set of mutations the plan
//! can contain, plus the listing call the inspector needs.

mod detection;
mod factory;
mod github;
mod gitlab;

pub use detection::{detect_host, parse_repo_info};
pub use factory::create_host;
pub use github::GitHubHost;
pub use gitlab::GitLabHost;

use crate::error::Result;
use crate::types::{HostConfig, PullRequest};
use async_trait::async_trait;

/// Fields of a pull request to create
#[derive(Debug, Clone)]
pub struct CreatePull<'a> {
    /// Head branch (already pushed)
    pub head: &'a str,
    /// Base branch
    pub base: &'a str,
    /// Title
    pub title: &'a str,
    /// Body
    pub body: &'a str,
    /// Create as draft
    pub draft: bool,
}

/// A comment on a pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullComment {
    /// Comment ID
    pub id: u64,
    /// Comment body text
    pub body: String,
}

/// Remote host operations used by the reconciliation engine
#[async_trait]
pub trait RemoteHost: Send + Sync {
    /// Login of the authenticated user
    async fn current_user(&self) -> Result<String>;

    /// Every pull request, in any state, whose head branch starts with
    /// `head_prefix`. Implementations must follow pagination to exhaustion.
    async fn list_stack_pulls(&self, head_prefix: &str) -> Result<Vec<PullRequest>>;

    /// Create a pull request
    async fn create_pull(&self, req: &CreatePull<'_>) -> Result<PullRequest>;

    /// Change the base branch of an open pull request, head untouched
    async fn update_pull_base(&self, number: u64, base: &str) -> Result<PullRequest>;

    /// Replace title and body of an open pull request
    async fn update_pull_message(
        &self,
        number: u64,
        title: &str,
        body: &str,
    ) -> Result<PullRequest>;

    /// Close a pull request without merging
    async fn close_pull(&self, number: u64) -> Result<()>;

    /// Delete a remote branch
    async fn delete_branch(&self, branch: &str) -> Result<()>;

    /// List comments on a pull request
    async fn list_comments(&self, number: u64) -> Result<Vec<PullComment>>;

    /// Create a comment on a pull request
    async fn create_comment(&self, number: u64, body: &str) -> Result<()>;

    /// Update an existing comment
    async fn update_comment(&self, number: u64, comment_id: u64, body: &str) -> Result<()>;

    /// The host configuration
    fn config(&self) -> &HostConfig;
}
