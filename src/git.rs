//! Async wrapper around the `git` CLI
//!
//! prstack never rewrites history itself; every version-control operation is
//! delegated to the git binary and surfaced verbatim on failure. Rebase
//! conflicts in particular abort the run before any remote mutation happens.

use crate::error::{Error, Result};
use crate::types::GitRemote;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// Pushes commit content to remote branches.
///
/// The plan executor depends on this trait rather than on [`Git`] directly so
/// tests can execute full plans against an in-memory fake.
#[async_trait]
pub trait BranchPusher: Send + Sync {
    /// Force-push `sha` to `refs/heads/{branch}` on `remote`
    async fn force_push(&self, remote: &str, sha: &str, branch: &str) -> Result<()>;
}

/// Handle on a local git repository
#[derive(Debug, Clone)]
pub struct Git {
    root: PathBuf,
}

impl Git {
    /// Open the repository containing `path`
    pub async fn open(path: &Path) -> Result<Self> {
        let out = run_git(path, &["rev-parse", "--show-toplevel"]).await?;
        Ok(Self {
            root: PathBuf::from(out),
        })
    }

    /// Run a git subcommand in the repository, returning trimmed stdout
    pub async fn run(&self, args: &[&str]) -> Result<String> {
        run_git(&self.root, args).await
    }

    /// Name of the currently checked-out branch
    pub async fn current_branch(&self) -> Result<String> {
        self.run(&["rev-parse", "--abbrev-ref", "HEAD"]).await
    }

    /// Read a config key, `None` when unset
    pub async fn config_get(&self, key: &str) -> Result<Option<String>> {
        match self.run(&["config", "--get", key]).await {
            Ok(value) if value.is_empty() => Ok(None),
            Ok(value) => Ok(Some(value)),
            Err(Error::Git { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// All configured remotes with their fetch URLs
    pub async fn remotes(&self) -> Result<Vec<GitRemote>> {
        let names = self.run(&["remote"]).await?;
        let mut remotes = Vec::new();
        for name in names.lines().filter(|l| !l.is_empty()) {
            let url = self.run(&["remote", "get-url", name]).await?;
            remotes.push(GitRemote {
                name: name.to_string(),
                url,
            });
        }
        Ok(remotes)
    }

    /// `remote/branch` the current branch tracks, from branch config
    pub async fn tracked_trunk(&self) -> Result<String> {
        let branch = self.current_branch().await?;
        let merge = self
            .config_get(&format!("branch.{branch}.merge"))
            .await?
            .ok_or_else(|| {
                Error::Parse(format!(
                    "branch `{branch}` has no upstream; set one with \
                     `git branch {branch} --set-upstream-to=<remote>/<branch>` \
                     or pass --trunk"
                ))
            })?;
        let remote = self
            .config_get(&format!("branch.{branch}.remote"))
            .await?
            .ok_or_else(|| Error::Parse(format!("branch `{branch}` has no remote configured")))?;
        let target = merge.strip_prefix("refs/heads/").unwrap_or(&merge);
        Ok(format!("{remote}/{target}"))
    }

    /// Rebase the current branch on `remote/branch`; conflicts are fatal
    pub async fn pull_rebase(&self, remote: &str, branch: &str) -> Result<()> {
        self.run(&["pull", "--rebase", remote, branch]).await?;
        Ok(())
    }

    /// Fork point between the current branch and `remote/branch`
    pub async fn fork_point(&self, remote: &str, branch: &str) -> Result<String> {
        let upstream = format!("{remote}/{branch}");
        let sha = self.run(&["merge-base", "--fork-point", &upstream]).await?;
        if sha.is_empty() {
            return Err(Error::Parse(format!(
                "no common commit between `{upstream}` and the current branch"
            )));
        }
        Ok(sha)
    }

    /// Commit shas of `base..tip`, oldest first
    pub async fn rev_list(&self, base: &str, tip: &str) -> Result<Vec<String>> {
        let range = format!("{base}..{tip}");
        let out = self.run(&["log", "--reverse", "--format=%H", &range]).await?;
        Ok(out
            .lines()
            .filter(|l| !l.is_empty())
            .map(ToString::to_string)
            .collect())
    }

    /// Subject line of a commit
    pub async fn commit_subject(&self, sha: &str) -> Result<String> {
        self.run(&["log", "-1", "--format=%s", sha]).await
    }

    /// Body of a commit, trailers included
    pub async fn commit_body(&self, sha: &str) -> Result<String> {
        self.run(&["log", "-1", "--format=%b", sha]).await
    }

    /// Fetch a single branch from a remote
    pub async fn fetch(&self, remote: &str, branch: &str) -> Result<()> {
        self.run(&["fetch", remote, branch]).await?;
        Ok(())
    }

    /// Create and check out `branch` at `start_point`
    pub async fn checkout_new(&self, branch: &str, start_point: &str) -> Result<()> {
        self.run(&["checkout", "-b", branch, start_point]).await?;
        Ok(())
    }

    /// Point the current branch's upstream at `upstream`
    pub async fn set_upstream(&self, upstream: &str) -> Result<()> {
        let flag = format!("--set-upstream-to={upstream}");
        self.run(&["branch", &flag]).await?;
        Ok(())
    }

    /// Path of the repository's hooks directory
    pub async fn hooks_dir(&self) -> Result<PathBuf> {
        let path = self.run(&["rev-parse", "--git-path", "hooks"]).await?;
        let path = PathBuf::from(path);
        if path.is_absolute() {
            Ok(path)
        } else {
            Ok(self.root.join(path))
        }
    }
}

#[async_trait]
impl BranchPusher for Git {
    async fn force_push(&self, remote: &str, sha: &str, branch: &str) -> Result<()> {
        let refspec = format!("{sha}:refs/heads/{branch}");
        self.run(&["push", "--force", remote, &refspec]).await?;
        Ok(())
    }
}

async fn run_git(dir: &Path, args: &[&str]) -> Result<String> {
    debug!(?args, "running git");
    let command = format!("git {}", args.join(" "));
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .await
        .map_err(|e| Error::Git {
            command: command.clone(),
            output: e.to_string(),
        })?;

    if !output.status.success() {
        let mut combined = String::from_utf8_lossy(&output.stderr).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stdout));
        return Err(Error::Git {
            command,
            output: combined.trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Split a `remote/branch` trunk value into its two parts
pub fn parse_trunk(trunk: &str) -> Result<(String, String)> {
    match trunk.split_once('/') {
        Some((remote, branch)) if !remote.is_empty() && !branch.is_empty() => {
            Ok((remote.to_string(), branch.to_string()))
        }
        _ => Err(Error::InvalidTrunk(trunk.to_string())),
    }
}
