// ABOUTME: Worktree registry data model persisted as the shared JSON ledger
// ABOUTME: Field names are camelCase because external tools read the file directly

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_DB_IMAGE, DEFAULT_DB_NAME, DEFAULT_DB_PASSWORD, DEFAULT_DB_USER,
    DEFAULT_HEALTH_ATTEMPTS, DEFAULT_HEALTH_INTERVAL_MS, DEFAULT_PORT_RANGES,
    DEFAULT_WORKTREE_BASE_DIR,
};

/// Service class a port is reserved for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceClass {
    Frontend,
    Backend,
    Database,
}

impl ServiceClass {
    pub const ALL: [ServiceClass; 3] = [
        ServiceClass::Frontend,
        ServiceClass::Backend,
        ServiceClass::Database,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceClass::Frontend => "frontend",
            ServiceClass::Backend => "backend",
            ServiceClass::Database => "database",
        }
    }
}

impl fmt::Display for ServiceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive port range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    pub min: u16,
    pub max: u16,
}

impl PortRange {
    pub fn contains(&self, port: u16) -> bool {
        port >= self.min && port <= self.max
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRanges {
    pub frontend: PortRange,
    pub backend: PortRange,
    pub database: PortRange,
}

impl PortRanges {
    pub fn get(&self, class: ServiceClass) -> PortRange {
        match class {
            ServiceClass::Frontend => self.frontend,
            ServiceClass::Backend => self.backend,
            ServiceClass::Database => self.database,
        }
    }
}

impl Default for PortRanges {
    fn default() -> Self {
        DEFAULT_PORT_RANGES
    }
}

/// The three ports reserved by one worktree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ports {
    pub frontend: u16,
    pub backend: u16,
    pub database: u16,
}

impl Ports {
    pub fn get(&self, class: ServiceClass) -> u16 {
        match class {
            ServiceClass::Frontend => self.frontend,
            ServiceClass::Backend => self.backend,
            ServiceClass::Database => self.database,
        }
    }
}

impl fmt::Display for Ports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.frontend, self.backend, self.database)
    }
}

/// Stored status. Advisory only: `list` and `sync` re-derive the real state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorktreeStatus {
    Active,
    Stopped,
    Error,
}

impl WorktreeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorktreeStatus::Active => "active",
            WorktreeStatus::Stopped => "stopped",
            WorktreeStatus::Error => "error",
        }
    }
}

/// One isolated development environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worktree {
    pub id: String,
    pub branch: String,
    pub source_branch: String,
    pub path: PathBuf,
    pub ports: Ports,
    pub db_container_name: String,
    pub app_container_name: String,
    pub status: WorktreeStatus,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
}

impl Worktree {
    /// Whole days since `last_accessed`, never negative
    pub fn days_since_access(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_accessed).num_days().max(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySettings {
    #[serde(default = "default_base_dir")]
    pub worktree_base_dir: String,
    #[serde(default)]
    pub port_ranges: PortRanges,
}

fn default_base_dir() -> String {
    DEFAULT_WORKTREE_BASE_DIR.to_string()
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            worktree_base_dir: default_base_dir(),
            port_ranges: PortRanges::default(),
        }
    }
}

/// The persisted ledger of all worktrees of one repository clone
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default)]
    pub worktrees: Vec<Worktree>,
    #[serde(default)]
    pub settings: RegistrySettings,
    /// Bumped on every successful save; guards against lost updates
    #[serde(default)]
    pub revision: u64,
}

/// Fixed database container parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub image: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            image: DEFAULT_DB_IMAGE.to_string(),
            user: DEFAULT_DB_USER.to_string(),
            password: DEFAULT_DB_PASSWORD.to_string(),
            database: DEFAULT_DB_NAME.to_string(),
        }
    }
}

/// Bounded readiness polling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_HEALTH_ATTEMPTS,
            interval: Duration::from_millis(DEFAULT_HEALTH_INTERVAL_MS),
        }
    }
}
