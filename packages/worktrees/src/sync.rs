// ABOUTME: Reconciliation of the registry against git, the filesystem and the container daemon
// ABOUTME: Orphaned entries and database containers without an entry are found first, then removed on request

use std::fmt;

use grove_containers::RemovalOutcome;
use grove_core::Worktree;

use crate::teardown::TeardownReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanReason {
    PathMissing,
    NotInGit,
}

impl fmt::Display for OrphanReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrphanReason::PathMissing => f.write_str("Path does not exist"),
            OrphanReason::NotInGit => f.write_str("Not in git worktree list"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanedEntry {
    pub worktree: Worktree,
    pub reason: OrphanReason,
    /// The daemon still has the entry's database container
    pub container_exists: bool,
}

/// A grove database container with no registry entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleContainer {
    pub name: String,
    pub running: bool,
}

/// Everything sync found, before anything is removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub valid: Vec<Worktree>,
    pub orphaned: Vec<OrphanedEntry>,
    pub stale_containers: Vec<StaleContainer>,
}

impl SyncPlan {
    pub fn is_clean(&self) -> bool {
        self.orphaned.is_empty() && self.stale_containers.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub removed_entries: Vec<TeardownReport>,
    /// Entries whose registry removal failed, with the reason
    pub failed_entries: Vec<(String, String)>,
    pub removed_containers: Vec<(String, RemovalOutcome)>,
}

impl SyncSummary {
    pub fn freed_ports(&self) -> usize {
        self.removed_entries.len() * 3
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    InSync,
    DryRun,
    Cancelled,
    Applied(SyncSummary),
}
