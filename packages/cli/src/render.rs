// ABOUTME: Terminal rendering for worktrees, teardown reports and sync plans
// ABOUTME: Tables use comfy-table with rounded UTF-8 borders; colors come from colored

use chrono::{DateTime, Utc};
use colored::*;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};

use grove_core::{DatabaseConfig, Worktree};
use grove_worktrees::{ActualStatus, StepOutcome, SyncPlan, TeardownReport, WorktreeView};

pub fn format_last_access(last_accessed: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (now - last_accessed).num_days().max(0);
    match days {
        0 => "today".to_string(),
        1 => "yesterday".to_string(),
        2..=6 => format!("{} days ago", days),
        7..=29 => format!("{} weeks ago", days / 7),
        _ => last_accessed.format("%-m/%-d/%Y").to_string(),
    }
}

pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn status_label(status: ActualStatus) -> ColoredString {
    match status {
        ActualStatus::Active => status.as_str().green(),
        ActualStatus::Stopped => status.as_str().yellow(),
        ActualStatus::Missing => status.as_str().red(),
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn worktree_table(views: &[WorktreeView], now: DateTime<Utc>, verbose: bool) -> Table {
    let mut table = new_table();

    let mut header = vec!["ID", "Branch", "Ports (F/B/D)", "Status", "Last Access"];
    if verbose {
        header.push("Path");
    }
    table.set_header(header);

    for view in views {
        let worktree = &view.worktree;
        let mut row = vec![
            truncate(&worktree.id, 24),
            truncate(&worktree.branch, 32),
            worktree.ports.to_string(),
            status_label(view.actual_status).to_string(),
            format_last_access(worktree.last_accessed, now),
        ];
        if verbose {
            row.push(worktree.path.display().to_string());
        }
        table.add_row(row);
    }

    table
}

/// Numbered list of worktrees a bulk cleanup is about to remove
pub fn selection_table(worktrees: &[Worktree], now: DateTime<Utc>) -> Table {
    let mut table = new_table();
    table.set_header(vec!["#", "ID", "Branch", "Ports (F/B/D)", "Last Access"]);

    for (index, worktree) in worktrees.iter().enumerate() {
        table.add_row(vec![
            (index + 1).to_string(),
            truncate(&worktree.id, 24),
            truncate(&worktree.branch, 32),
            worktree.ports.to_string(),
            format_last_access(worktree.last_accessed, now),
        ]);
    }

    table
}

pub fn print_worktree_details(worktree: &Worktree) {
    println!("{:<12} {}", "ID:".cyan(), worktree.id);
    println!("{:<12} {}", "Branch:".cyan(), worktree.branch);
    println!("{:<12} {}", "Path:".cyan(), worktree.path.display());
    println!("{:<12} {}", "Ports:".cyan(), worktree.ports);
    println!("{:<12} {}", "Database:".cyan(), worktree.db_container_name);
}

pub fn outcome_line(outcome: &StepOutcome, label: &str) -> String {
    match outcome {
        StepOutcome::Done => format!("  {} {} removed", "✓".green(), label),
        StepOutcome::AlreadyGone => format!("  {} {} already removed", "○".dimmed(), label),
        StepOutcome::Failed(reason) => {
            format!("  {} Could not remove {}: {}", "⚠".yellow(), label.to_lowercase(), reason)
        }
    }
}

pub fn print_teardown_report(report: &TeardownReport) {
    for result in &report.steps {
        println!("{}", outcome_line(&result.outcome, result.step.label()));
    }
}

pub fn print_sync_plan(plan: &SyncPlan, verbose: bool) {
    println!("{}", "Sync Report".bold());
    println!("Valid worktrees:    {}", plan.valid.len());
    println!("Orphaned entries:   {}", plan.orphaned.len());
    println!("Stale containers:   {}", plan.stale_containers.len());

    if verbose && !plan.valid.is_empty() {
        println!();
        println!("{}", "Valid worktrees:".green());
        for worktree in &plan.valid {
            println!("  - {} {}", worktree.id, worktree.path.display().to_string().dimmed());
        }
    }

    if !plan.orphaned.is_empty() {
        println!();
        println!("{}", "Orphaned entries:".yellow());
        for orphan in &plan.orphaned {
            println!("  - {} ({})", orphan.worktree.id, orphan.worktree.branch);
            println!(
                "    {}",
                format!("{} | Ports: {}", orphan.reason, orphan.worktree.ports).dimmed()
            );
            if verbose {
                let container = if orphan.container_exists {
                    "still present"
                } else {
                    "gone"
                };
                println!(
                    "    {}",
                    format!(
                        "Path: {} | Database container {}: {}",
                        orphan.worktree.path.display(),
                        orphan.worktree.db_container_name,
                        container
                    )
                    .dimmed()
                );
            }
        }
    }

    if !plan.stale_containers.is_empty() {
        println!();
        println!("{}", "Stale containers:".yellow());
        for stale in &plan.stale_containers {
            let state = if stale.running {
                "running".green()
            } else {
                "stopped".dimmed()
            };
            println!("  - {} ({}) - No registry entry", stale.name, state);
        }
    }
}

/// Connection string for a worktree database on localhost
pub fn database_url(database: &DatabaseConfig, port: u16) -> String {
    format!(
        "postgresql://{}:{}@localhost:{}/{}",
        database.user, database.password, port, database.database
    )
}

/// `list --json` document: registry entries with their live status
pub fn list_json(views: &[WorktreeView]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(views)
}
