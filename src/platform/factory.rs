//! Host service construction
//!
//! Resolves authentication and builds the concrete client for a detected
//! host configuration.

use crate::auth::{get_github_auth, get_gitlab_auth};
use crate::error::Result;
use crate::platform::{GitHubHost, GitLabHost, RemoteHost};
use crate::types::{HostConfig, HostKind};

/// Create a host service for the given configuration
pub async fn create_host(config: &HostConfig) -> Result<Box<dyn RemoteHost>> {
    match config.kind {
        HostKind::GitHub => {
            let auth = get_github_auth().await?;
            Ok(Box::new(GitHubHost::new(
                &auth.token,
                config.owner.clone(),
                config.repo.clone(),
                config.host.clone(),
            )?))
        }
        HostKind::GitLab => {
            let auth = get_gitlab_auth(config.host.as_deref()).await?;
            Ok(Box::new(GitLabHost::new(
                auth.token.clone(),
                config.owner.clone(),
                config.repo.clone(),
                Some(auth.host),
            )))
        }
    }
}
