// ABOUTME: Live status of registered worktrees, derived from the filesystem and the container daemon
// ABOUTME: The status stored in the registry is advisory and never consulted here

use serde::Serialize;
use std::fmt;

use grove_containers::ContainerRuntime;
use grove_core::Worktree;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActualStatus {
    /// The checkout directory is gone
    Missing,
    /// The database container is running
    Active,
    Stopped,
}

impl ActualStatus {
    pub fn of(worktree: &Worktree, containers: &dyn ContainerRuntime) -> Self {
        if !worktree.path.exists() {
            ActualStatus::Missing
        } else if containers.is_running(&worktree.db_container_name) {
            ActualStatus::Active
        } else {
            ActualStatus::Stopped
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActualStatus::Missing => "missing",
            ActualStatus::Active => "active",
            ActualStatus::Stopped => "stopped",
        }
    }
}

impl fmt::Display for ActualStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registry entry together with its live status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorktreeView {
    #[serde(flatten)]
    pub worktree: Worktree,
    pub actual_status: ActualStatus,
}
