// ABOUTME: Naming conventions and default settings shared by every grove package
// ABOUTME: Container prefixes, registry file location and default port ranges

use crate::types::{PortRange, PortRanges};

/// Directory (inside the git common dir) that holds grove state
pub const REGISTRY_DIR_NAME: &str = "grove";

/// Registry document file name
pub const REGISTRY_FILE_NAME: &str = "worktree.json";

/// Default worktree base directory, relative to the main working tree root
pub const DEFAULT_WORKTREE_BASE_DIR: &str = "../grove-worktrees";

/// Prefix of the per-worktree database container (and its data volume)
pub const DB_CONTAINER_PREFIX: &str = "grove-db-wt-";

/// Prefix of the per-worktree devcontainer
pub const APP_CONTAINER_PREFIX: &str = "grove-wt-";

/// Port the database listens on inside its container
pub const DB_CONTAINER_PORT: u16 = 5432;

pub const DEFAULT_FRONTEND_RANGE: PortRange = PortRange {
    min: 5173,
    max: 5199,
};

pub const DEFAULT_BACKEND_RANGE: PortRange = PortRange {
    min: 3001,
    max: 3099,
};

pub const DEFAULT_DATABASE_RANGE: PortRange = PortRange {
    min: 7432,
    max: 7499,
};

/// Lower bound of the database range used by older registries; migrated on load
pub const LEGACY_DATABASE_RANGE_MIN: u16 = 5435;

pub const DEFAULT_PORT_RANGES: PortRanges = PortRanges {
    frontend: DEFAULT_FRONTEND_RANGE,
    backend: DEFAULT_BACKEND_RANGE,
    database: DEFAULT_DATABASE_RANGE,
};

/// Development-only database credentials. Not secrets.
pub const DEFAULT_DB_IMAGE: &str = "postgres:16-alpine";
pub const DEFAULT_DB_USER: &str = "grove";
pub const DEFAULT_DB_PASSWORD: &str = "grove_dev";
pub const DEFAULT_DB_NAME: &str = "grove";

/// Health poll budget for a freshly started database
pub const DEFAULT_HEALTH_ATTEMPTS: u32 = 30;
pub const DEFAULT_HEALTH_INTERVAL_MS: u64 = 1000;
