//! Host detection from git remote URLs

use crate::error::{Error, Result};
use crate::types::{HostConfig, HostKind};
use regex::Regex;
use std::env;
use std::sync::OnceLock;

/// Detect the host kind (GitHub or GitLab) from a remote URL
#[must_use]
pub fn detect_host(url: &str) -> Option<HostKind> {
    let gh_host = env::var("GH_HOST").ok();
    let gitlab_host = env::var("GITLAB_HOST").ok();

    let hostname = extract_hostname(url)?;

    if hostname == "github.com"
        || hostname.ends_with(".github.com")
        || gh_host.as_ref().is_some_and(|h| hostname == *h)
    {
        return Some(HostKind::GitHub);
    }

    if hostname == "gitlab.com"
        || hostname.ends_with(".gitlab.com")
        || gitlab_host.as_ref().is_some_and(|h| hostname == *h)
    {
        return Some(HostKind::GitLab);
    }

    None
}

/// Parse owner/repo (and self-hosted hostname) from a remote URL
pub fn parse_repo_info(url: &str) -> Result<HostConfig> {
    let kind = detect_host(url).ok_or(Error::NoSupportedRemotes)?;
    let hostname = extract_hostname(url);

    // SSH format: git@host:owner/repo.git
    // HTTPS format: https://host/owner/repo.git
    static RE_SSH: OnceLock<Regex> = OnceLock::new();
    static RE_HTTPS: OnceLock<Regex> = OnceLock::new();
    let re_ssh = RE_SSH
        .get_or_init(|| Regex::new(r"git@[^:]+:(.+?)(?:\.git)?$").expect("hardcoded regex is valid"));
    let re_https = RE_HTTPS.get_or_init(|| {
        Regex::new(r"https?://[^/]+/(.+?)(?:\.git)?$").expect("hardcoded regex is valid")
    });

    let path = re_ssh
        .captures(url)
        .or_else(|| re_https.captures(url))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| Error::Parse(format!("cannot parse remote URL: {url}")))?;

    // GitLab supports nested groups, so everything before the last segment
    // is the owner
    let (owner, repo) = path
        .rsplit_once('/')
        .ok_or_else(|| Error::Parse(format!("invalid repo path: {path}")))?;

    let default_host = match kind {
        HostKind::GitHub => "github.com",
        HostKind::GitLab => "gitlab.com",
    };
    let host = hostname.filter(|h| h != default_host);

    Ok(HostConfig {
        kind,
        owner: owner.to_string(),
        repo: repo.to_string(),
        host,
    })
}

fn extract_hostname(url: &str) -> Option<String> {
    if url.starts_with("git@") {
        return url
            .strip_prefix("git@")
            .and_then(|s| s.split(':').next())
            .map(ToString::to_string);
    }

    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(ToString::to_string))
}
