//! List command, a read-only view of the stack
//!
//! Shows each local commit with the state of its pull request. Nothing here
//! mutates the repository or the host.

use crate::cli::context::resolve_stack;
use crate::cli::style::{bullet, hyperlink_url, Stream, Stylize};
use anstream::println;
use clap::Args;
use prstack::config::StackContext;
use prstack::error::{Error, Result};
use prstack::reconcile::inspect_remote;
use prstack::stack::read_stack;
use prstack::types::{PullState, RemoteUnit};
use std::collections::HashMap;
use std::path::Path;

/// Arguments for `prstack list`
#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Trunk as `remote/branch`; defaults to the current branch's upstream
    #[arg(short = 't', long)]
    pub trunk: Option<String>,

    /// Prefix for generated stack branches
    #[arg(long)]
    pub branch_prefix: Option<String>,
}

fn status(unit: Option<&RemoteUnit>) -> String {
    match unit {
        None => format!("{}", "[no pull request]".muted()),
        Some(unit) if unit.pull.state == PullState::Merged => {
            format!("{}", "[merged]".success())
        }
        Some(unit) if unit.pull.draft => format!("{}", "[draft]".muted()),
        Some(_) => format!("{}", "[open]".accent()),
    }
}

/// Show the current branch's stack and its pull requests.
pub async fn run_list(path: &Path, args: ListArgs) -> Result<()> {
    let setup = resolve_stack(path, args.trunk.as_deref(), args.branch_prefix).await?;
    let ctx = StackContext::new(
        setup.trunk_remote.clone(),
        setup.trunk_branch.clone(),
        setup.stack_prefix(),
    );

    let (entries, units) = tokio::join!(
        read_stack(&setup.git, &ctx),
        inspect_remote(setup.host.as_ref(), &ctx)
    );
    let entries = match entries {
        Ok(entries) => entries,
        Err(Error::EmptyStack) => {
            println!("{}", "no commits in stack".muted());
            return Ok(());
        }
        Err(err) => return Err(err),
    };
    let units = units?;

    // An open unit shadows a merged one carrying the same id.
    let mut by_id: HashMap<&str, &RemoteUnit> = HashMap::new();
    for unit in &units {
        match by_id.get(unit.change_id.as_str()) {
            Some(kept) if kept.pull.state == PullState::Open => {}
            _ => {
                by_id.insert(unit.change_id.as_str(), unit);
            }
        }
    }

    println!(
        "{} on {} targeting {}:",
        "Stack".emphasis(),
        setup.current.accent(),
        setup.trunk().accent()
    );
    for entry in &entries {
        let unit = by_id.get(entry.change_id.as_str()).copied();
        if let Some(unit) = unit {
            println!(
                "  {} {} {} {} ({})",
                bullet(),
                status(Some(unit)),
                format!("#{}", unit.pull.number).accent(),
                entry.title,
                entry.short_sha().muted()
            );
            println!(
                "    {}",
                hyperlink_url(Stream::Stdout, &unit.pull.html_url).muted()
            );
        } else {
            println!(
                "  {} {} {} ({})",
                bullet(),
                status(None),
                entry.title,
                entry.short_sha().muted()
            );
        }
    }
    Ok(())
}
