// ABOUTME: `grove list` command: registered worktrees with live status
// ABOUTME: Status is recomputed from disk and docker on every call

use anyhow::Result;
use chrono::Utc;
use colored::*;

use grove_cli::render;
use grove_cli::GroveContext;

pub fn run(ctx: &GroveContext, json: bool, verbose: bool) -> Result<()> {
    let views = ctx.manager.list()?;

    if json {
        println!("{}", render::list_json(&views)?);
        return Ok(());
    }

    if views.is_empty() {
        println!("{}", "No worktrees registered.".yellow());
        println!("{}", "Use 'grove setup <branch>' to create one".dimmed());
        return Ok(());
    }

    println!("{}", "Registered Worktrees".blue().bold());
    println!();
    println!("{}", render::worktree_table(&views, Utc::now(), verbose));
    println!("Total: {} worktree(s)", views.len().to_string().cyan());

    Ok(())
}
