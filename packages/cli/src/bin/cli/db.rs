// ABOUTME: `grove db-start` command: bring back the database of the current worktree
// ABOUTME: Useful after a reboot or a manual `docker stop`

use anyhow::Result;
use colored::*;

use grove_cli::render;
use grove_cli::GroveContext;
use grove_config::GroveConfig;
use grove_containers::StartOutcome;

pub fn run(ctx: &GroveContext, config: &GroveConfig) -> Result<()> {
    let (worktree, outcome) = ctx.manager.db_start(&ctx.cwd)?;

    let message = match outcome {
        StartOutcome::AlreadyRunning => "Database already running",
        StartOutcome::Restarted => "Database restarted",
        StartOutcome::Created => "Database created",
    };
    println!("{} {} ({})", "✓".green(), message, worktree.db_container_name);
    println!(
        "{:<12} {}",
        "Database:".cyan(),
        render::database_url(&config.database, worktree.ports.database)
    );

    Ok(())
}
