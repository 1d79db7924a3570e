//! Authentication for GitHub and GitLab
//!
//! Supports CLI-based auth (gh, glab) and environment variables.

mod github;
mod gitlab;

pub use github::{get_github_auth, GitHubAuthConfig};
pub use gitlab::{get_gitlab_auth, GitLabAuthConfig};

/// Source of an authentication token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// Token from a CLI tool (gh or glab)
    Cli,
    /// Token from an environment variable
    EnvVar,
}
