// ABOUTME: Container lifecycle for per-worktree databases and devcontainers
// ABOUTME: Containers are located purely by names derived from the worktree id

pub mod docker;

use std::fmt;
use thiserror::Error;

use grove_core::ExecError;

pub use docker::DockerRuntime;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("Docker is not available. Start the Docker daemon and try again")]
    DaemonUnavailable,

    #[error("Database container {container} did not become ready after {attempts} attempts. Inspect it with `docker logs {container}`")]
    DatabaseNotReady { container: String, attempts: u32 },

    #[error("Docker command failed: {0}")]
    Exec(#[from] ExecError),
}

pub type Result<T> = std::result::Result<T, ContainerError>;

/// How a database came to be running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// It was already running
    AlreadyRunning,
    /// A stopped container was started again
    Restarted,
    /// A new container (and volume) was created
    Created,
}

/// Result of tearing down one container
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    Removed,
    NotFound,
    Failed(String),
}

impl RemovalOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, RemovalOutcome::Failed(_))
    }
}

impl fmt::Display for RemovalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemovalOutcome::Removed => f.write_str("removed"),
            RemovalOutcome::NotFound => f.write_str("already removed"),
            RemovalOutcome::Failed(message) => write!(f, "failed: {}", message),
        }
    }
}

/// Container daemon operations used by the orchestrator
pub trait ContainerRuntime: Send + Sync {
    /// The daemon answers
    fn is_available(&self) -> bool;

    /// A container with exactly this name exists, running or not
    fn exists(&self, name: &str) -> bool;

    fn is_running(&self, name: &str) -> bool;

    /// Make the worktree's database run on `port` and wait until it accepts connections
    fn start_database(&self, id: &str, port: u16) -> Result<StartOutcome>;

    /// Stop and remove the database container and its data volume
    fn remove_database(&self, id: &str) -> RemovalOutcome;

    /// Stop and remove the devcontainer an editor integration may have created
    fn remove_app_container(&self, id: &str) -> RemovalOutcome;

    /// Names of every grove database container known to the daemon
    fn list_database_containers(&self) -> Vec<String>;
}
