// ABOUTME: Ordered best-effort teardown of one worktree's resources
// ABOUTME: Container and checkout failures are recorded and skipped; the registry entry is always removed last

use std::fmt;
use tracing::{info, warn};

use grove_containers::{ContainerRuntime, RemovalOutcome};
use grove_core::Worktree;
use grove_git_utils::{CheckoutRemoval, Vcs};
use grove_storage::{mutate, RegistryStore};

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStep {
    Database,
    AppContainer,
    Checkout,
    RegistryEntry,
}

impl TeardownStep {
    pub const ORDER: [TeardownStep; 4] = [
        TeardownStep::Database,
        TeardownStep::AppContainer,
        TeardownStep::Checkout,
        TeardownStep::RegistryEntry,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TeardownStep::Database => "Database container",
            TeardownStep::AppContainer => "Devcontainer",
            TeardownStep::Checkout => "Git worktree",
            TeardownStep::RegistryEntry => "Registry entry",
        }
    }
}

impl fmt::Display for TeardownStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Done,
    AlreadyGone,
    Failed(String),
}

impl StepOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }
}

impl From<RemovalOutcome> for StepOutcome {
    fn from(outcome: RemovalOutcome) -> Self {
        match outcome {
            RemovalOutcome::Removed => StepOutcome::Done,
            RemovalOutcome::NotFound => StepOutcome::AlreadyGone,
            RemovalOutcome::Failed(message) => StepOutcome::Failed(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    pub step: TeardownStep,
    pub outcome: StepOutcome,
}

/// What happened to each resource of one removed worktree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownReport {
    pub worktree: Worktree,
    pub steps: Vec<StepResult>,
}

impl TeardownReport {
    pub fn outcome(&self, step: TeardownStep) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|result| result.step == step)
            .map(|result| &result.outcome)
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepResult> {
        self.steps.iter().filter(|result| result.outcome.is_failure())
    }

    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Run every teardown step for `worktree` in order.
///
/// Only a failure to update the registry is returned as an error.
pub(crate) fn teardown(
    worktree: &Worktree,
    containers: &dyn ContainerRuntime,
    vcs: &dyn Vcs,
    store: &dyn RegistryStore,
) -> Result<TeardownReport> {
    info!("Tearing down worktree {}", worktree.id);
    let mut steps = Vec::with_capacity(TeardownStep::ORDER.len());

    for step in TeardownStep::ORDER {
        let outcome = match step {
            TeardownStep::Database => containers.remove_database(&worktree.id).into(),
            TeardownStep::AppContainer => containers.remove_app_container(&worktree.id).into(),
            TeardownStep::Checkout => remove_checkout(worktree, vcs),
            TeardownStep::RegistryEntry => {
                let removed = mutate(store, |registry| registry.remove(&worktree.id).is_some())?;
                if removed {
                    StepOutcome::Done
                } else {
                    StepOutcome::AlreadyGone
                }
            }
        };

        if let StepOutcome::Failed(reason) = &outcome {
            warn!("{} of {} not removed: {}", step, worktree.id, reason);
        }
        steps.push(StepResult { step, outcome });
    }

    Ok(TeardownReport {
        worktree: worktree.clone(),
        steps,
    })
}

fn remove_checkout(worktree: &Worktree, vcs: &dyn Vcs) -> StepOutcome {
    if !worktree.path.exists() {
        return match vcs.prune_stale() {
            Ok(()) => StepOutcome::AlreadyGone,
            Err(e) => StepOutcome::Failed(e.to_string()),
        };
    }

    match vcs.remove_checkout(&worktree.path) {
        Ok(CheckoutRemoval::Removed) => StepOutcome::Done,
        Ok(CheckoutRemoval::AlreadyAbsent) => StepOutcome::AlreadyGone,
        Err(e) => {
            if let Err(prune) = vcs.prune_stale() {
                warn!("git worktree prune failed: {}", prune);
            }
            StepOutcome::Failed(e.to_string())
        }
    }
}
