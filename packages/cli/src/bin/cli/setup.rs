// ABOUTME: `grove setup` command: create a worktree with ports and a database
// ABOUTME: Prints the connection details a dev server in the new checkout needs

use anyhow::Result;
use colored::*;

use grove_cli::render;
use grove_cli::GroveContext;
use grove_config::GroveConfig;
use grove_worktrees::SetupRequest;

pub fn run(ctx: &GroveContext, config: &GroveConfig, branch: String, source: Option<String>) -> Result<()> {
    println!("{}", format!("Setting up worktree for '{}'...", branch).blue());

    let worktree = ctx.manager.setup(&SetupRequest {
        branch,
        source_branch: source,
    })?;

    println!();
    println!("{}", format!("✓ Worktree '{}' created successfully!", worktree.id).green());
    println!();
    println!("{:<12} {}", "Path:".cyan(), worktree.path.display());
    println!("{:<12} {} (from {})", "Branch:".cyan(), worktree.branch, worktree.source_branch);
    println!("{:<12} {}", "Frontend:".cyan(), format!("http://localhost:{}", worktree.ports.frontend));
    println!("{:<12} {}", "Backend:".cyan(), format!("http://localhost:{}", worktree.ports.backend));
    println!(
        "{:<12} {}",
        "Database:".cyan(),
        render::database_url(&config.database, worktree.ports.database)
    );
    println!();
    println!("Next steps:");
    println!("  cd {}", worktree.path.display());
    println!("{}", format!("  grove cleanup {}   # when you are done", worktree.id).dimmed());

    Ok(())
}
