//! Checkout command, recreate a pushed stack as a local branch
//!
//! Walks the open pull requests of a stack from their base chain and checks
//! out the topmost head. Useful for picking up a stack pushed from another
//! machine or by another author.

use crate::cli::context::resolve_branch_prefix;
use crate::cli::style::{arrow, bullet, check, hyperlink_url, Stream, Stylize};
use anstream::println;
use clap::Args;
use prstack::config::StackContext;
use prstack::error::{Error, Result};
use prstack::git::{parse_trunk, Git};
use prstack::platform::{create_host, parse_repo_info};
use prstack::reconcile::{chain_open_units, inspect_remote};
use std::path::Path;

/// Arguments for `prstack checkout`
#[derive(Args, Debug)]
pub struct CheckoutArgs {
    /// Source branch of the stack, also the local branch to create
    pub branch: String,

    /// Trunk as `remote/branch`; defaults to the current branch's upstream
    #[arg(short = 't', long)]
    pub trunk: Option<String>,

    /// Prefix for generated stack branches
    #[arg(long)]
    pub branch_prefix: Option<String>,

    /// Stack owner, when checking out someone else's stack
    #[arg(long)]
    pub author: Option<String>,

    /// Show the stack without creating the branch
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

/// Check out the pushed stack of `branch` from its pull requests.
pub async fn run_checkout(path: &Path, args: CheckoutArgs) -> Result<()> {
    let git = Git::open(path).await?;

    let trunk = match &args.trunk {
        Some(trunk) => trunk.clone(),
        None => git.tracked_trunk().await?,
    };
    let (trunk_remote, trunk_branch) = parse_trunk(&trunk)?;

    let remotes = git.remotes().await?;
    if remotes.is_empty() {
        return Err(Error::NoSupportedRemotes);
    }
    let remote = remotes
        .iter()
        .find(|r| r.name == trunk_remote)
        .ok_or_else(|| Error::RemoteNotFound(trunk_remote.clone()))?;
    let host = create_host(&parse_repo_info(&remote.url)?).await?;

    let branch_prefix = match (args.branch_prefix, args.author) {
        (Some(prefix), _) => prefix,
        (None, Some(author)) => format!("stack/{author}"),
        (None, None) => resolve_branch_prefix(&git, None, host.as_ref()).await?,
    };

    let ctx = StackContext::new(
        trunk_remote.clone(),
        trunk_branch,
        format!("{branch_prefix}/{}", args.branch),
    );
    let units = inspect_remote(host.as_ref(), &ctx).await?;
    let chain = chain_open_units(units, &ctx.stack_prefix)?;

    let (Some(bottom), Some(top)) = (chain.first(), chain.last()) else {
        println!(
            "no stacked pull requests found for {}",
            ctx.stack_prefix.accent()
        );
        return Ok(());
    };

    println!("{}:", "Stacked pull requests".emphasis());
    for unit in &chain {
        println!(
            "  {} {} {} {}",
            bullet(),
            format!("#{}", unit.pull.number).accent(),
            unit.pull.title,
            hyperlink_url(Stream::Stdout, &unit.pull.html_url).muted()
        );
        println!(
            "    {}",
            format!("{} -> {}", unit.pull.base_ref, unit.pull.head_ref).muted()
        );
    }

    if args.dry_run {
        return Ok(());
    }

    println!("{} fetching {}", arrow(), top.pull.head_ref.accent());
    git.fetch(&trunk_remote, &top.pull.head_ref).await?;
    git.checkout_new(&args.branch, &format!("{trunk_remote}/{}", top.pull.head_ref))
        .await?;
    git.set_upstream(&format!("{trunk_remote}/{}", bottom.pull.base_ref))
        .await?;
    println!("{} checked out {}", check(), args.branch.accent());
    Ok(())
}
