// ABOUTME: `grove sync` command: find and remove registry entries and containers with nothing behind them
// ABOUTME: Works like `git worktree prune` for the grove registry

use anyhow::{bail, Result};
use colored::*;

use grove_cli::prompt::InquireConfirm;
use grove_cli::render;
use grove_cli::GroveContext;
use grove_worktrees::SyncOutcome;

pub fn run(ctx: &GroveContext, dry_run: bool, force: bool, verbose: bool) -> Result<()> {
    println!("{}", "Scanning for orphaned entries...".blue());
    println!();

    let (plan, outcome) = ctx.manager.sync(dry_run, force, &InquireConfirm, |plan| {
        render::print_sync_plan(plan, verbose);
        println!();
    })?;

    match outcome {
        SyncOutcome::InSync => {
            println!("{}", "✓ Everything is in sync. No orphaned entries found.".green());
        }
        SyncOutcome::DryRun => {
            println!("{}", "[DRY RUN] Would clean up the above entries.".blue());
        }
        SyncOutcome::Cancelled => println!("{}", "Cancelled.".yellow()),
        SyncOutcome::Applied(summary) => {
            for report in &summary.removed_entries {
                println!("Removing: {}", report.worktree.id);
                if verbose {
                    render::print_teardown_report(report);
                } else {
                    println!("{}", "  ✓ Removed".green());
                }
            }
            for (id, reason) in &summary.failed_entries {
                println!("{}", format!("✗ Failed: {} - {}", id, reason).red());
            }
            for (name, outcome) in &summary.removed_containers {
                println!("Removing stale container: {}", name);
                if outcome.is_failure() {
                    println!("{}", format!("  ⚠ Could not remove: {}", outcome).yellow());
                } else {
                    println!("{}", "  ✓ Removed".green());
                }
            }

            println!();
            println!("{}", "✓ Sync complete!".green());
            println!("  - Removed {} orphaned entries", summary.removed_entries.len());
            println!("  - Removed {} stale containers", summary.removed_containers.len());
            if summary.freed_ports() > 0 {
                println!("  - Freed {} ports", summary.freed_ports());
            }
            println!();
            println!("Registry now has {} valid worktree(s).", plan.valid.len());

            if !summary.failed_entries.is_empty() {
                bail!(
                    "Failed to remove {} orphaned entries",
                    summary.failed_entries.len()
                );
            }
        }
    }

    Ok(())
}
