// ABOUTME: `grove cleanup` and `grove cleanup-bulk` commands
// ABOUTME: Teardown problems are reported per resource; the branch itself is never deleted

use anyhow::{bail, Result};
use chrono::Utc;
use colored::*;

use grove_cli::prompt::{self, InquireConfirm};
use grove_cli::render;
use grove_cli::GroveContext;
use grove_worktrees::{BulkOutcome, BulkSelection, CleanupOutcome};

pub fn run(ctx: &GroveContext, target: &str, force: bool) -> Result<()> {
    let worktree = ctx.manager.resolve(target)?;

    println!("{}", format!("Preparing to remove worktree: {}", worktree.id).blue());
    println!();
    render::print_worktree_details(&worktree);
    println!();

    match ctx.manager.cleanup(&worktree.id, force, &InquireConfirm)? {
        CleanupOutcome::Cancelled(_) => {
            println!("{}", "Cancelled.".yellow());
        }
        CleanupOutcome::Removed(report) => {
            render::print_teardown_report(&report);
            println!();
            println!("{}", format!("✓ Worktree '{}' removed", report.worktree.id).green());
            println!("Freed ports: {}", report.worktree.ports);
            println!();
            println!(
                "Note: branch '{}' was not deleted. Delete it manually if needed:",
                report.worktree.branch
            );
            println!("{}", format!("  git branch -D {}", report.worktree.branch).dimmed());
        }
    }

    Ok(())
}

pub fn run_bulk(ctx: &GroveContext, all: bool, stale: Option<i64>, dry_run: bool, force: bool) -> Result<()> {
    let now = Utc::now();

    let selection = if all {
        BulkSelection::All
    } else if let Some(days) = stale {
        BulkSelection::Stale { days }
    } else {
        let worktrees = ctx.manager.registry()?.worktrees;
        if worktrees.is_empty() {
            println!("{}", "No worktrees registered.".yellow());
            return Ok(());
        }
        println!("{}", render::selection_table(&worktrees, now));
        let ids = prompt::select_worktrees(&worktrees)?;
        if ids.is_empty() {
            println!("{}", "No worktrees selected.".yellow());
            return Ok(());
        }
        BulkSelection::Ids(ids)
    };

    let preview = ctx.manager.select(&selection)?;
    if preview.is_empty() {
        match selection {
            BulkSelection::Stale { days } => {
                println!("{}", format!("No worktrees inactive for {}+ days.", days).green())
            }
            _ => println!("{}", "No worktrees registered.".yellow()),
        }
        return Ok(());
    }

    let heading = if dry_run {
        "[DRY RUN] Worktrees to remove:"
    } else {
        "Worktrees to remove:"
    };
    println!("{}", heading.bold());
    for worktree in &preview {
        println!("  - {} ({})", worktree.id, worktree.branch);
        println!("{}", format!("    Ports: {}", worktree.ports).dimmed());
    }
    println!();

    match ctx
        .manager
        .cleanup_bulk(&selection, dry_run, force, &InquireConfirm)?
    {
        BulkOutcome::NothingSelected => {
            println!("{}", "No worktrees selected.".yellow());
        }
        BulkOutcome::DryRun(selected) => {
            println!(
                "{}",
                format!("[DRY RUN] Would remove {} worktree(s)", selected.len()).blue()
            );
        }
        BulkOutcome::Cancelled(_) => {
            println!("{}", "Cancelled.".yellow());
        }
        BulkOutcome::Completed { removed, failed } => {
            for report in &removed {
                println!("{}", format!("✓ Removed: {}", report.worktree.id).green());
                for failure in report.failures() {
                    println!(
                        "{}",
                        render::outcome_line(&failure.outcome, failure.step.label())
                    );
                }
            }
            for (id, reason) in &failed {
                println!("{}", format!("✗ Failed: {} - {}", id, reason).red());
            }

            println!();
            println!("{}", format!("✓ Removed {} worktree(s)", removed.len()).green());
            if !failed.is_empty() {
                bail!("Failed to remove {} worktree(s)", failed.len());
            }
        }
    }

    Ok(())
}
