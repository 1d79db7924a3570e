//! Setup command, installs the commit-msg hook

use crate::cli::style::{check, Stylize};
use anstream::println;
use prstack::error::Result;
use prstack::git::Git;
use prstack::setup::{hook_status, install_hook, HookStatus, InstallOutcome};
use std::path::Path;

/// Install or check the commit-msg hook of the repository at `path`.
pub async fn run_setup(path: &Path, force: bool, check_only: bool) -> Result<()> {
    let git = Git::open(path).await?;
    let hooks_dir = git.hooks_dir().await?;

    if check_only {
        match hook_status(&hooks_dir)? {
            HookStatus::Missing => println!("commit-msg hook is {}", "not installed".warn()),
            HookStatus::Installed => println!("{} commit-msg hook is up to date", check()),
            HookStatus::Outdated => {
                println!("commit-msg hook is {}", "outdated".warn());
            }
            HookStatus::Foreign => {
                println!(
                    "a {} commit-msg hook is installed; use --force to replace it",
                    "foreign".warn()
                );
            }
        }
        return Ok(());
    }

    match install_hook(&hooks_dir, force)? {
        InstallOutcome::Installed => {
            println!("{} installed commit-msg hook", check());
            println!(
                "  {}",
                "new commits will get a Change-Id trailer automatically".muted()
            );
        }
        InstallOutcome::UpToDate => println!("{} commit-msg hook already up to date", check()),
        InstallOutcome::KeptForeign => {
            println!(
                "kept existing commit-msg hook; re-run with {} to replace it",
                "--force".accent()
            );
        }
    }
    Ok(())
}
