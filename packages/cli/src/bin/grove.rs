use clap::{Parser, Subcommand};
use colored::*;
use std::process;
use tracing::debug;

mod cli;

use grove_cli::{logging, GroveContext};
use grove_config::GroveConfig;

#[derive(Parser)]
#[command(name = "grove")]
#[command(about = "Grove - isolated git worktrees with their own ports and database")]
#[command(version)]
struct Cli {
    /// Log debug output to stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a worktree for a branch with reserved ports and a database container
    Setup {
        /// Branch to check out; created when it does not exist
        branch: String,

        /// Branch to create it from (default: the current branch)
        #[arg(long)]
        source: Option<String>,
    },
    /// Remove one worktree, its database and its port reservation
    Cleanup {
        /// Worktree id or branch name
        target: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Remove several worktrees at once
    CleanupBulk {
        /// Remove every registered worktree
        #[arg(short, long, conflicts_with = "stale")]
        all: bool,

        /// Remove worktrees not accessed for at least this many days
        #[arg(long, value_name = "DAYS", value_parser = clap::value_parser!(i64).range(1..))]
        stale: Option<i64>,

        /// Show what would be removed without removing anything
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// List registered worktrees with their live status
    List {
        /// Print JSON instead of a table
        #[arg(short, long)]
        json: bool,

        /// Include checkout paths
        #[arg(short, long)]
        verbose: bool,
    },
    /// Reconcile the registry with git and docker
    Sync {
        /// Report without removing anything
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,

        /// Show per-entry details
        #[arg(short, long)]
        verbose: bool,
    },
    /// Start the database of the worktree containing the current directory
    DbStart,
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = GroveConfig::from_env()?;
    logging::init(cli.debug, config.log_filter.as_deref());
    debug!("Loaded configuration: {:?}", config.redacted());

    let ctx = GroveContext::discover(&config)?;

    match cli.command {
        Commands::Setup { branch, source } => cli::setup::run(&ctx, &config, branch, source),
        Commands::Cleanup { target, force } => cli::cleanup::run(&ctx, &target, force),
        Commands::CleanupBulk {
            all,
            stale,
            dry_run,
            force,
        } => cli::cleanup::run_bulk(&ctx, all, stale, dry_run, force),
        Commands::List { json, verbose } => cli::list::run(&ctx, json, verbose),
        Commands::Sync {
            dry_run,
            force,
            verbose,
        } => cli::sync::run(&ctx, dry_run, force, verbose),
        Commands::DbStart => cli::db::run(&ctx, &config),
    }
}
