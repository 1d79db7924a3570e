//! commit-msg hook installation
//!
//! Every commit in a stack must carry a `Change-Id:` trailer, assigned once
//! at commit time. The hook appends one to any message that lacks it; amends
//! and rebases keep the existing trailer because `git commit` re-runs the
//! hook with the old message intact.

use crate::error::{Error, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// The managed commit-msg hook script.
pub const COMMIT_MSG_HOOK: &str = r#"#!/bin/sh
# Installed by prstack. Appends a Change-Id trailer to new commit messages.

case "$(sed -e '/^#/d' "$1")" in
*"Change-Id: I"*) exit 0 ;;
esac

random=$(od -vN 20 -An -tx1 /dev/urandom | tr -d ' \n')
git interpret-trailers --if-exists doNothing \
    --trailer "Change-Id: I${random}" --in-place "$1"
"#;

/// State of the commit-msg hook in a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStatus {
    /// No commit-msg hook exists.
    Missing,
    /// The managed hook is installed and current.
    Installed,
    /// A managed hook from an older release is installed.
    Outdated,
    /// A commit-msg hook not managed by this tool exists.
    Foreign,
}

/// What [`install_hook`] actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The hook was written.
    Installed,
    /// The current hook was already up to date.
    UpToDate,
    /// A foreign hook was left in place; pass `force` to replace it.
    KeptForeign,
}

fn io_err(what: &str, path: &Path, err: std::io::Error) -> Error {
    Error::Hook(format!("{what} {}: {err}", path.display()))
}

/// Inspect the commit-msg hook under `hooks_dir`.
pub fn hook_status(hooks_dir: &Path) -> Result<HookStatus> {
    let path = hooks_dir.join("commit-msg");
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(HookStatus::Missing),
        Err(err) => return Err(io_err("cannot read", &path, err)),
    };
    if content == COMMIT_MSG_HOOK {
        Ok(HookStatus::Installed)
    } else if content.contains("Installed by prstack") {
        Ok(HookStatus::Outdated)
    } else {
        Ok(HookStatus::Foreign)
    }
}

/// Install or refresh the commit-msg hook.
///
/// Foreign hooks are never overwritten unless `force` is set; managed hooks
/// from older releases are refreshed unconditionally.
pub fn install_hook(hooks_dir: &Path, force: bool) -> Result<InstallOutcome> {
    match hook_status(hooks_dir)? {
        HookStatus::Installed => return Ok(InstallOutcome::UpToDate),
        HookStatus::Foreign if !force => return Ok(InstallOutcome::KeptForeign),
        HookStatus::Missing | HookStatus::Outdated | HookStatus::Foreign => {}
    }

    fs::create_dir_all(hooks_dir).map_err(|e| io_err("cannot create", hooks_dir, e))?;
    let path = hooks_dir.join("commit-msg");
    fs::write(&path, COMMIT_MSG_HOOK).map_err(|e| io_err("cannot write", &path, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .map_err(|e| io_err("cannot chmod", &path, e))?;
    }

    Ok(InstallOutcome::Installed)
}
