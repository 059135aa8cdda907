// ABOUTME: Interactive prompts backed by inquire
// ABOUTME: Confirmation defaults to "no"; an aborted prompt counts as a refusal

use inquire::{Confirm, MultiSelect};

use grove_core::Worktree;
use grove_worktrees::Confirm as ConfirmPrompt;

/// Yes/no confirmation on the terminal
pub struct InquireConfirm;

impl ConfirmPrompt for InquireConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        Confirm::new(prompt)
            .with_default(false)
            .prompt()
            .unwrap_or(false)
    }
}

/// Let the user tick worktrees to remove; returns the chosen ids
pub fn select_worktrees(worktrees: &[Worktree]) -> anyhow::Result<Vec<String>> {
    let options: Vec<String> = worktrees
        .iter()
        .map(|w| format!("{} ({})", w.id, w.branch))
        .collect();

    let chosen = MultiSelect::new("Select worktrees to remove:", options.clone())
        .with_help_message("space to select, enter to confirm, esc to cancel")
        .prompt_skippable()?
        .unwrap_or_default();

    Ok(worktrees
        .iter()
        .zip(options.iter())
        .filter(|(_, label)| chosen.contains(label))
        .map(|(w, _)| w.id.clone())
        .collect())
}
