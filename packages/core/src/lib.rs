// ABOUTME: Core types, naming rules and process execution for grove
// ABOUTME: Foundational package shared by storage, ports, containers, git and orchestration

pub mod constants;
pub mod exec;
pub mod registry;
pub mod types;
pub mod utils;
pub mod validation;

// Re-export main types
pub use types::{
    DatabaseConfig, HealthPolicy, PortRange, PortRanges, Ports, Registry, RegistrySettings,
    ServiceClass, Worktree, WorktreeStatus,
};

pub use registry::RegistryError;

// Re-export execution
pub use exec::{CommandOutput, CommandRunner, ExecError, SystemRunner};

// Re-export utilities
pub use utils::{app_container_name, db_container_name, id_from_db_container, sanitize_branch_name};

pub use validation::{validate_branch_name, ValidationError};
