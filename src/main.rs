//! prstack - stacked pull requests from a single branch
//!
//! CLI binary that keeps a chain of pull requests in sync with the commits
//! of the current branch.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

mod cli;

use cli::{CheckoutArgs, ListArgs, PushArgs};

#[derive(Parser)]
#[command(name = "prstack")]
#[command(about = "Stacked pull requests from plain git branches - GitHub & GitLab")]
#[command(version)]
struct Cli {
    /// Path to the git repository (defaults to current directory)
    #[arg(short, long, global = true)]
    path: Option<PathBuf>,

    /// Verbosity (-v warn, -vv info, -vvv debug, -vvvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the current branch's commits with their pull requests
    Push(PushArgs),

    /// Show the stack and its pull requests without changing anything
    List(ListArgs),

    /// Recreate a pushed stack as a local branch
    Checkout(CheckoutArgs),

    /// Install the commit-msg hook that assigns Change-Id trailers
    Setup {
        /// Replace a commit-msg hook not managed by prstack
        #[arg(long)]
        force: bool,

        /// Report hook status without changing anything
        #[arg(long)]
        check: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(match args.verbose {
            0 => Level::ERROR,
            1 => Level::WARN,
            2 => Level::INFO,
            3 => Level::DEBUG,
            _ => Level::TRACE,
        })
        .with_writer(std::io::stderr)
        .init();

    let path = args.path.unwrap_or_else(|| PathBuf::from("."));

    match args.command {
        None => cli::run_push(&path, PushArgs::default()).await?,
        Some(Commands::Push(push)) => cli::run_push(&path, push).await?,
        Some(Commands::List(list)) => cli::run_list(&path, list).await?,
        Some(Commands::Checkout(checkout)) => cli::run_checkout(&path, checkout).await?,
        Some(Commands::Setup { force, check }) => cli::run_setup(&path, force, check).await?,
    }

    Ok(())
}
