// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names used across grove

// Registry
pub const GROVE_REGISTRY_PATH: &str = "GROVE_REGISTRY_PATH";

// Database container
pub const GROVE_DB_IMAGE: &str = "GROVE_DB_IMAGE";
pub const GROVE_DB_USER: &str = "GROVE_DB_USER";
pub const GROVE_DB_PASSWORD: &str = "GROVE_DB_PASSWORD";
pub const GROVE_DB_NAME: &str = "GROVE_DB_NAME";

// Readiness polling
pub const GROVE_HEALTH_ATTEMPTS: &str = "GROVE_HEALTH_ATTEMPTS";
pub const GROVE_HEALTH_INTERVAL_MS: &str = "GROVE_HEALTH_INTERVAL_MS";

// Logging
pub const GROVE_LOG: &str = "GROVE_LOG";
pub const RUST_LOG: &str = "RUST_LOG"; // Fallback
