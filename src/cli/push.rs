//! Push command, one full reconciliation pass

use crate::cli::context::resolve_stack;
use crate::cli::report;
use crate::cli::style::{arrow, check, spinner_style, Stylize};
use anstream::{eprintln, println};
use clap::Args;
use indicatif::ProgressBar;
use prstack::config::StackContext;
use prstack::error::{Error, Result};
use prstack::reconcile::{
    build_plan, execute_plan, inspect_remote, ExecuteProgress, Phase,
};
use prstack::stack::read_stack;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Arguments for `prstack push`
#[derive(Args, Debug, Default)]
pub struct PushArgs {
    /// Show the plan without mutating anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Stop after the first not-yet-merged entry
    #[arg(short = 'x', long)]
    pub next_only: bool,

    /// Create new pull requests as drafts
    #[arg(short = 'd', long)]
    pub draft: bool,

    /// Trunk as `remote/branch`; defaults to the current branch's upstream
    #[arg(short = 't', long)]
    pub trunk: Option<String>,

    /// Prefix for generated stack branches
    #[arg(long)]
    pub branch_prefix: Option<String>,

    /// Never create pull requests, only update existing ones
    #[arg(short = 'u', long)]
    pub only_update: bool,

    /// Do not rebase onto the trunk before pushing
    #[arg(short = 'R', long)]
    pub skip_rebase: bool,

    /// Leave titles and bodies of existing pull requests untouched
    #[arg(short = 'k', long)]
    pub keep_title_body: bool,

    /// Keep the branch when closing an orphaned pull request
    #[arg(long)]
    pub no_delete_branch: bool,
}

/// Progress sink that prints styled lines per op.
struct CliProgress;

impl ExecuteProgress for CliProgress {
    fn on_phase(&self, phase: Phase) {
        match phase {
            Phase::Inspect => println!("{}...", "Inspecting remote stack".emphasis()),
            Phase::Execute => println!("{}...", "Updating pull requests".emphasis()),
            Phase::Close => println!("{}...", "Closing orphaned pull requests".emphasis()),
            Phase::Comment => println!("{}...", "Refreshing stack comments".emphasis()),
        }
    }

    fn on_op(&self, verb: &'static str, detail: &str) {
        println!("  {} {verb} {}", arrow(), detail.accent());
    }

    fn on_warning(&self, message: &str) {
        eprintln!("{} {}", "warning:".warn(), message);
    }
}

/// Run one reconciliation pass of the current branch's stack.
pub async fn run_push(path: &Path, args: PushArgs) -> Result<()> {
    let setup = resolve_stack(path, args.trunk.as_deref(), args.branch_prefix).await?;

    let mut ctx = StackContext::new(
        setup.trunk_remote.clone(),
        setup.trunk_branch.clone(),
        setup.stack_prefix(),
    );
    ctx.draft = args.draft;
    ctx.next_only = args.next_only;
    ctx.only_update = args.only_update;
    ctx.keep_title_body = args.keep_title_body;
    ctx.delete_branch_on_close = !args.no_delete_branch;

    if !args.skip_rebase {
        println!("{} rebasing on {}", arrow(), setup.trunk().accent());
        setup
            .git
            .pull_rebase(&setup.trunk_remote, &setup.trunk_branch)
            .await?;
    }

    // Local extraction and remote inspection are independent reads.
    let spinner = ProgressBar::new_spinner().with_style(spinner_style());
    spinner.set_message("Reading local and remote stack...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    let (entries, units) = tokio::join!(
        read_stack(&setup.git, &ctx),
        inspect_remote(setup.host.as_ref(), &ctx)
    );
    spinner.finish_and_clear();
    let entries = match entries {
        Ok(entries) => entries,
        Err(Error::EmptyStack) => {
            println!(
                "{} no commits between {} and {}; nothing to do",
                check(),
                setup.trunk().accent(),
                setup.current.accent()
            );
            return Ok(());
        }
        Err(err) => return Err(err),
    };
    let units = units?;

    let plan = build_plan(&entries, units, &ctx)?;
    report::print_plan(&plan);

    if args.dry_run {
        report::print_dry_run(&plan);
        return Ok(());
    }

    let host: Arc<dyn prstack::platform::RemoteHost> = Arc::from(setup.host);
    let outcome = execute_plan(&plan, &setup.git, host, &ctx, &CliProgress).await?;
    println!();
    report::print_report(&outcome);
    Ok(())
}
