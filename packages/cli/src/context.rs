// ABOUTME: Builds the worktree manager for the repository containing the working directory
// ABOUTME: Wires the system command runner into git, docker and the port probes

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use grove_config::GroveConfig;
use grove_containers::DockerRuntime;
use grove_core::{CommandRunner, SystemRunner};
use grove_git_utils::{GitCli, RepoLocation};
use grove_ports::PortAllocator;
use grove_storage::{JsonRegistryStore, RegistryStore};
use grove_worktrees::WorktreeManager;

pub struct GroveContext {
    pub location: RepoLocation,
    pub manager: WorktreeManager,
    pub cwd: PathBuf,
}

/// Registry location: the explicit override, else the shared git dir
pub fn registry_path(config: &GroveConfig, location: &RepoLocation) -> PathBuf {
    match &config.registry_path {
        Some(path) => path.clone(),
        None => JsonRegistryStore::for_git_common_dir(&location.common_dir)
            .path()
            .to_path_buf(),
    }
}

impl GroveContext {
    pub fn discover(config: &GroveConfig) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read the current directory")?;
        Self::discover_from(config, &cwd)
    }

    pub fn discover_from(config: &GroveConfig, cwd: &Path) -> Result<Self> {
        let location = RepoLocation::discover(cwd)?;
        let registry = registry_path(config, &location);
        debug!("Using registry {}", registry.display());

        let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
        let store = Arc::new(JsonRegistryStore::new(registry));
        let git = Arc::new(GitCli::new(runner.clone(), &location.main_root)?);
        let docker = Arc::new(DockerRuntime::new(
            runner.clone(),
            config.database.clone(),
            config.health,
        ));

        let manager = WorktreeManager::new(
            store,
            git,
            docker,
            PortAllocator::with_system_probes(runner),
            &location.main_root,
        );

        Ok(Self {
            location,
            manager,
            cwd: cwd.to_path_buf(),
        })
    }
}
