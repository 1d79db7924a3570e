//! Shared resolution for stack commands
//!
//! Every stack command needs the same things resolved before it can talk to
//! anything: the repository, the trunk, the host client and the branch
//! prefix. The checks live here so `push` and `list` reject the same
//! misconfigurations the same way.

use prstack::error::{Error, Result};
use prstack::git::{parse_trunk, Git};
use prstack::platform::{create_host, parse_repo_info, RemoteHost};
use prstack::stack::is_generated_branch;
use std::path::Path;

/// Repository, trunk and host resolved for the current branch's stack.
pub struct StackSetup {
    /// The local repository
    pub git: Git,
    /// Name of the checked-out branch
    pub current: String,
    /// Remote the trunk lives on
    pub trunk_remote: String,
    /// Trunk branch name on the remote
    pub trunk_branch: String,
    /// Client for the detected host
    pub host: Box<dyn RemoteHost>,
    /// Prefix for generated stack branches
    pub branch_prefix: String,
}

impl StackSetup {
    /// Prefix shared by every generated branch of this stack.
    pub fn stack_prefix(&self) -> String {
        format!("{}/{}", self.branch_prefix, self.current)
    }

    /// Trunk as the operator writes it, `remote/branch`.
    pub fn trunk(&self) -> String {
        format!("{}/{}", self.trunk_remote, self.trunk_branch)
    }
}

/// Resolve the stack rooted at the repository containing `path`.
pub async fn resolve_stack(
    path: &Path,
    trunk: Option<&str>,
    branch_prefix: Option<String>,
) -> Result<StackSetup> {
    let git = Git::open(path).await?;

    let current = git.current_branch().await?;
    if current == "HEAD" {
        return Err(Error::Parse(
            "HEAD is detached; check out the branch that carries your stack".to_string(),
        ));
    }

    let trunk = match trunk {
        Some(trunk) => trunk.to_string(),
        None => git.tracked_trunk().await?,
    };
    let (trunk_remote, trunk_branch) = parse_trunk(&trunk)?;
    if trunk_branch == current {
        return Err(Error::TrunkIsCurrentBranch(current));
    }

    let remotes = git.remotes().await?;
    if remotes.is_empty() {
        return Err(Error::NoSupportedRemotes);
    }
    let remote = remotes
        .iter()
        .find(|r| r.name == trunk_remote)
        .ok_or_else(|| Error::RemoteNotFound(trunk_remote.clone()))?;
    let host_config = parse_repo_info(&remote.url)?;
    let host = create_host(&host_config).await?;

    let branch_prefix = resolve_branch_prefix(&git, branch_prefix, host.as_ref()).await?;
    if is_generated_branch(&current, &branch_prefix) {
        return Err(Error::GeneratedBranch(current));
    }

    Ok(StackSetup {
        git,
        current,
        trunk_remote,
        trunk_branch,
        host,
        branch_prefix,
    })
}

/// Branch prefix from the flag, repository config, or the authenticated user.
pub async fn resolve_branch_prefix(
    git: &Git,
    flag: Option<String>,
    host: &dyn RemoteHost,
) -> Result<String> {
    match flag {
        Some(prefix) => Ok(prefix),
        None => match git.config_get("prstack.branch-prefix").await? {
            Some(prefix) => Ok(prefix),
            None => Ok(format!("stack/{}", host.current_user().await?)),
        },
    }
}
