// ABOUTME: Worktree lifecycle manager orchestrating registry, ports, git checkouts and database containers
// ABOUTME: Setup rolls back what it created on failure; teardown is best-effort and always drops the entry

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use grove_containers::{ContainerError, ContainerRuntime, StartOutcome};
use grove_core::{
    app_container_name, db_container_name, id_from_db_container, validate_branch_name, Registry,
    ServiceClass, Worktree, WorktreeStatus,
};
use grove_git_utils::{normalize_path, same_path, Vcs};
use grove_ports::PortAllocator;
use grove_storage::{mutate, RegistryStore, StorageError, MAX_SAVE_ATTEMPTS};

use crate::status::{ActualStatus, WorktreeView};
use crate::sync::{OrphanReason, OrphanedEntry, StaleContainer, SyncOutcome, SyncPlan, SyncSummary};
use crate::teardown::{teardown, TeardownReport};
use crate::{Confirm, Result, WorktreeError};

/// Request to create a new worktree
#[derive(Debug, Clone)]
pub struct SetupRequest {
    pub branch: String,
    /// Branch to create `branch` from when it does not exist yet; defaults to the current branch
    pub source_branch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    Cancelled(Worktree),
    Removed(TeardownReport),
}

/// Which worktrees a bulk cleanup targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkSelection {
    All,
    /// Not accessed for at least this many days
    Stale { days: i64 },
    Ids(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkOutcome {
    NothingSelected,
    DryRun(Vec<Worktree>),
    Cancelled(Vec<Worktree>),
    Completed {
        removed: Vec<TeardownReport>,
        /// Worktrees whose registry entry could not be removed, with the reason
        failed: Vec<(String, String)>,
    },
}

pub struct WorktreeManager {
    store: Arc<dyn RegistryStore>,
    vcs: Arc<dyn Vcs>,
    containers: Arc<dyn ContainerRuntime>,
    ports: PortAllocator,
    main_root: PathBuf,
}

impl WorktreeManager {
    pub fn new(
        store: Arc<dyn RegistryStore>,
        vcs: Arc<dyn Vcs>,
        containers: Arc<dyn ContainerRuntime>,
        ports: PortAllocator,
        main_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            vcs,
            containers,
            ports,
            main_root: main_root.into(),
        }
    }

    pub fn registry(&self) -> Result<Registry> {
        Ok(self.store.load()?)
    }

    /// Create a checkout, database and port reservation for a branch
    pub fn setup(&self, request: &SetupRequest) -> Result<Worktree> {
        let branch = request.branch.as_str();
        let id = validate_branch_name(branch)?;

        let registry = self.store.load()?;
        if let Some(existing) = registry.find(&id).or_else(|| registry.find_by_branch(branch)) {
            return Err(WorktreeError::AlreadyExists {
                id: existing.id.clone(),
                reason: format!("registered at {}", existing.path.display()),
            });
        }
        if self.vcs.worktree_exists_for_branch(branch)? {
            return Err(WorktreeError::AlreadyExists {
                id,
                reason: format!("branch '{}' is already checked out in another worktree", branch),
            });
        }

        if !self.containers.is_available() {
            return Err(ContainerError::DaemonUnavailable.into());
        }

        // The id is unregistered, so a container with its name is a leftover whose
        // published port nothing records; replace it rather than adopt it
        let db_name = db_container_name(&id);
        if self.containers.exists(&db_name) {
            warn!("Removing leftover database container {} with no registry entry", db_name);
            let outcome = self.containers.remove_database(&id);
            if outcome.is_failure() {
                return Err(WorktreeError::AlreadyExists {
                    id,
                    reason: format!("leftover container {} could not be removed: {}", db_name, outcome),
                });
            }
        }

        let source_branch = match &request.source_branch {
            Some(source) => source.clone(),
            None => self.vcs.current_branch()?,
        };

        let ports = self.ports.find_all_ports(&registry)?;
        let path = self.checkout_path(&registry, &id);
        if path.exists() {
            return Err(WorktreeError::AlreadyExists {
                id,
                reason: format!("{} is already present on disk", path.display()),
            });
        }

        self.ports.validate_ports(&registry, &ports, &[])?;

        info!(
            "Creating worktree {} for {} from {} at {}",
            id,
            branch,
            source_branch,
            path.display()
        );
        self.vcs.create_checkout(branch, &source_branch, &path)?;

        let started = match self.containers.start_database(&id, ports.database) {
            Ok(outcome) => outcome,
            Err(e) => {
                // A half-created container for an unregistered id is unusable
                self.rollback(&id, &path, true);
                return Err(e.into());
            }
        };

        let now = Utc::now();
        let worktree = Worktree {
            id: id.clone(),
            branch: branch.to_string(),
            source_branch,
            path: path.clone(),
            ports,
            db_container_name: db_name,
            app_container_name: app_container_name(&id),
            status: WorktreeStatus::Active,
            created_at: now,
            last_accessed: now,
        };

        if let Err(e) = self.commit(&worktree) {
            self.rollback(&id, &path, started == StartOutcome::Created);
            return Err(e);
        }

        info!("Worktree {} ready on ports {}", id, worktree.ports);
        Ok(worktree)
    }

    /// Persist a new entry, re-checking id and ports against whatever is on disk now
    fn commit(&self, worktree: &Worktree) -> Result<()> {
        let mut attempt = 1;
        loop {
            let mut registry = self.store.load()?;
            let others = registry.clone();
            registry
                .add(worktree.clone())
                .map_err(|e| WorktreeError::AlreadyExists {
                    id: worktree.id.clone(),
                    reason: format!("registered by another grove process during setup ({})", e),
                })?;
            // Our own database container now holds the database port
            self.ports
                .validate_ports(&others, &worktree.ports, &[ServiceClass::Database])?;

            match self.store.save(&mut registry) {
                Ok(()) => return Ok(()),
                Err(StorageError::ConcurrentModification { .. }) if attempt < MAX_SAVE_ATTEMPTS => {
                    debug!("Registry changed during setup of {}, retrying commit", worktree.id);
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn rollback(&self, id: &str, path: &Path, remove_database: bool) {
        warn!("Rolling back setup of {}", id);

        if remove_database {
            let outcome = self.containers.remove_database(id);
            if outcome.is_failure() {
                warn!("Rollback could not remove database of {}: {}", id, outcome);
            }
        }

        if let Err(e) = self.vcs.remove_checkout(path) {
            warn!("Rollback could not remove checkout {}: {}", path.display(), e);
            if let Err(e) = self.vcs.prune_stale() {
                warn!("git worktree prune failed: {}", e);
            }
        }
    }

    fn checkout_path(&self, registry: &Registry, id: &str) -> PathBuf {
        normalize_path(
            &self
                .main_root
                .join(&registry.settings.worktree_base_dir)
                .join(id),
        )
    }

    /// Find a worktree by id, then exact branch, then sanitized branch
    pub fn resolve(&self, target: &str) -> Result<Worktree> {
        self.store
            .load()?
            .resolve(target)
            .cloned()
            .ok_or_else(|| WorktreeError::NotFound(target.to_string()))
    }

    /// Tear down one worktree. The branch is left in place.
    pub fn cleanup(&self, target: &str, force: bool, confirm: &dyn Confirm) -> Result<CleanupOutcome> {
        let worktree = self.resolve(target)?;

        if !force
            && !confirm.confirm(&format!(
                "Remove worktree '{}' with its database and free ports {}?",
                worktree.id, worktree.ports
            ))
        {
            return Ok(CleanupOutcome::Cancelled(worktree));
        }

        let report = teardown(
            &worktree,
            self.containers.as_ref(),
            self.vcs.as_ref(),
            self.store.as_ref(),
        )?;
        self.prune();
        Ok(CleanupOutcome::Removed(report))
    }

    /// Worktrees matched by `selection`, in registry order
    pub fn select(&self, selection: &BulkSelection) -> Result<Vec<Worktree>> {
        let registry = self.store.load()?;
        let selected = match selection {
            BulkSelection::All => registry.worktrees.clone(),
            BulkSelection::Stale { days } => {
                if *days < 1 {
                    return Err(WorktreeError::InvalidInput(format!(
                        "stale threshold must be a positive number of days, got {}",
                        days
                    )));
                }
                registry.stale(*days, Utc::now()).into_iter().cloned().collect()
            }
            BulkSelection::Ids(ids) => registry
                .worktrees
                .iter()
                .filter(|w| ids.contains(&w.id))
                .cloned()
                .collect(),
        };
        Ok(selected)
    }

    /// Tear down every selected worktree, one at a time, after a single confirmation
    pub fn cleanup_bulk(
        &self,
        selection: &BulkSelection,
        dry_run: bool,
        force: bool,
        confirm: &dyn Confirm,
    ) -> Result<BulkOutcome> {
        let selected = self.select(selection)?;
        if selected.is_empty() {
            return Ok(BulkOutcome::NothingSelected);
        }
        if dry_run {
            return Ok(BulkOutcome::DryRun(selected));
        }
        if !force && !confirm.confirm(&format!("Remove {} worktree(s)?", selected.len())) {
            return Ok(BulkOutcome::Cancelled(selected));
        }

        let mut removed = Vec::new();
        let mut failed = Vec::new();
        for worktree in &selected {
            match teardown(
                worktree,
                self.containers.as_ref(),
                self.vcs.as_ref(),
                self.store.as_ref(),
            ) {
                Ok(report) => removed.push(report),
                Err(e) => {
                    warn!("Failed to remove {}: {}", worktree.id, e);
                    failed.push((worktree.id.clone(), e.to_string()));
                }
            }
        }
        self.prune();

        Ok(BulkOutcome::Completed { removed, failed })
    }

    /// Registered worktrees with status recomputed from disk and the daemon
    pub fn list(&self) -> Result<Vec<WorktreeView>> {
        let registry = self.store.load()?;
        Ok(registry
            .worktrees
            .into_iter()
            .map(|worktree| {
                let actual_status = ActualStatus::of(&worktree, self.containers.as_ref());
                WorktreeView {
                    worktree,
                    actual_status,
                }
            })
            .collect())
    }

    /// Compare the registry with git, the filesystem and the daemon without changing anything
    pub fn plan_sync(&self) -> Result<SyncPlan> {
        let registry = self.store.load()?;
        let git_worktrees = self.vcs.list_worktrees()?;

        let mut plan = SyncPlan::default();
        for worktree in &registry.worktrees {
            let reason = if !worktree.path.exists() {
                Some(OrphanReason::PathMissing)
            } else if !git_worktrees.iter().any(|g| same_path(&g.path, &worktree.path)) {
                Some(OrphanReason::NotInGit)
            } else {
                None
            };

            match reason {
                Some(reason) => plan.orphaned.push(OrphanedEntry {
                    worktree: worktree.clone(),
                    reason,
                    container_exists: self.containers.exists(&worktree.db_container_name),
                }),
                None => plan.valid.push(worktree.clone()),
            }
        }

        for name in self.containers.list_database_containers() {
            let registered = id_from_db_container(&name)
                .map(|id| registry.find(id).is_some())
                .unwrap_or(true);
            if !registered {
                plan.stale_containers.push(StaleContainer {
                    running: self.containers.is_running(&name),
                    name,
                });
            }
        }

        debug!(
            "Sync plan: {} valid, {} orphaned, {} stale containers",
            plan.valid.len(),
            plan.orphaned.len(),
            plan.stale_containers.len()
        );
        Ok(plan)
    }

    /// Remove what `plan` found: orphaned entries with their leftovers, then stale containers
    pub fn apply_sync(&self, plan: &SyncPlan, force: bool, confirm: &dyn Confirm) -> Result<SyncOutcome> {
        if plan.is_clean() {
            return Ok(SyncOutcome::InSync);
        }
        if !force && !confirm.confirm("Remove orphaned entries and stale containers?") {
            return Ok(SyncOutcome::Cancelled);
        }

        let mut summary = SyncSummary::default();
        for orphan in &plan.orphaned {
            info!("Removing orphaned entry {} ({})", orphan.worktree.id, orphan.reason);
            match teardown(
                &orphan.worktree,
                self.containers.as_ref(),
                self.vcs.as_ref(),
                self.store.as_ref(),
            ) {
                Ok(report) => summary.removed_entries.push(report),
                Err(e) => {
                    warn!("Failed to remove orphaned entry {}: {}", orphan.worktree.id, e);
                    summary
                        .failed_entries
                        .push((orphan.worktree.id.clone(), e.to_string()));
                }
            }
        }

        for stale in &plan.stale_containers {
            if let Some(id) = id_from_db_container(&stale.name) {
                info!("Removing stale container {}", stale.name);
                let outcome = self.containers.remove_database(id);
                if outcome.is_failure() {
                    warn!("Could not remove stale container {}: {}", stale.name, outcome);
                }
                summary.removed_containers.push((stale.name.clone(), outcome));
            }
        }

        self.prune();
        Ok(SyncOutcome::Applied(summary))
    }

    /// Plan, then apply unless `dry_run`. `on_plan` sees the plan before anything is prompted or removed.
    pub fn sync(
        &self,
        dry_run: bool,
        force: bool,
        confirm: &dyn Confirm,
        on_plan: impl FnOnce(&SyncPlan),
    ) -> Result<(SyncPlan, SyncOutcome)> {
        let plan = self.plan_sync()?;
        on_plan(&plan);
        let outcome = if plan.is_clean() {
            SyncOutcome::InSync
        } else if dry_run {
            SyncOutcome::DryRun
        } else {
            self.apply_sync(&plan, force, confirm)?
        };
        Ok((plan, outcome))
    }

    /// Start the database of the worktree containing `dir`
    pub fn db_start(&self, dir: &Path) -> Result<(Worktree, StartOutcome)> {
        let registry = self.store.load()?;
        let canonical = dir.canonicalize().ok();
        let worktree = registry
            .find_by_path_containing(dir)
            .or_else(|| {
                canonical
                    .as_deref()
                    .and_then(|dir| registry.find_by_path_containing(dir))
            })
            .cloned()
            .ok_or_else(|| WorktreeError::NotFound(dir.display().to_string()))?;

        if !self.containers.is_available() {
            return Err(ContainerError::DaemonUnavailable.into());
        }

        let outcome = self
            .containers
            .start_database(&worktree.id, worktree.ports.database)?;

        let id = worktree.id.clone();
        let now = Utc::now();
        mutate(self.store.as_ref(), |registry| {
            if let Some(entry) = registry.worktrees.iter_mut().find(|w| w.id == id) {
                entry.status = WorktreeStatus::Active;
                entry.last_accessed = now;
            }
        })?;

        Ok((worktree, outcome))
    }

    fn prune(&self) {
        if let Err(e) = self.vcs.prune_stale() {
            warn!("git worktree prune failed: {}", e);
        }
    }
}
