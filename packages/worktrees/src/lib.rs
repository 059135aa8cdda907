// ABOUTME: Worktree orchestration composing registry, ports, containers and git
// ABOUTME: Exposes setup, cleanup, bulk cleanup, listing, sync and database start workflows

pub mod manager;
pub mod status;
pub mod sync;
pub mod teardown;

use thiserror::Error;

use grove_containers::ContainerError;
use grove_core::ValidationError;
use grove_git_utils::GitError;
use grove_ports::PortError;
use grove_storage::StorageError;

pub use manager::{BulkOutcome, BulkSelection, CleanupOutcome, SetupRequest, WorktreeManager};
pub use status::{ActualStatus, WorktreeView};
pub use sync::{OrphanReason, OrphanedEntry, StaleContainer, SyncOutcome, SyncPlan, SyncSummary};
pub use teardown::{StepOutcome, StepResult, TeardownReport, TeardownStep};

#[derive(Error, Debug)]
pub enum WorktreeError {
    #[error("Worktree '{0}' not found. Use `grove list` to see registered worktrees")]
    NotFound(String),

    #[error("Worktree '{id}' already exists: {reason}")]
    AlreadyExists { id: String, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid branch name: {0}")]
    InvalidBranch(#[from] ValidationError),

    #[error("Registry error: {0}")]
    Storage(#[from] StorageError),

    #[error("Port allocation error: {0}")]
    Ports(#[from] PortError),

    #[error("Container error: {0}")]
    Container(#[from] ContainerError),

    #[error("Git error: {0}")]
    Git(#[from] GitError),
}

pub type Result<T> = std::result::Result<T, WorktreeError>;

/// Asks the user before anything destructive happens
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}
