// ABOUTME: Runtime configuration loaded from GROVE_* environment variables
// ABOUTME: Port ranges and base directory live in the registry, not here

pub mod constants;

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use grove_core::{DatabaseConfig, HealthPolicy};

use constants::*;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {var}")]
    InvalidValue { var: String, value: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroveConfig {
    /// Explicit registry file; `None` means the default under the git common dir
    pub registry_path: Option<PathBuf>,
    pub database: DatabaseConfig,
    pub health: HealthPolicy,
    /// Log filter directive from GROVE_LOG or RUST_LOG
    pub log_filter: Option<String>,
}

impl GroveConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let defaults = DatabaseConfig::default();

        let database = DatabaseConfig {
            image: get(GROVE_DB_IMAGE).unwrap_or(defaults.image),
            user: get(GROVE_DB_USER).unwrap_or(defaults.user),
            password: get(GROVE_DB_PASSWORD).unwrap_or(defaults.password),
            database: get(GROVE_DB_NAME).unwrap_or(defaults.database),
        };

        let health_defaults = HealthPolicy::default();
        let attempts = match get(GROVE_HEALTH_ATTEMPTS) {
            Some(raw) => parse_positive::<u32>(GROVE_HEALTH_ATTEMPTS, &raw)?,
            None => health_defaults.attempts,
        };
        let interval = match get(GROVE_HEALTH_INTERVAL_MS) {
            Some(raw) => Duration::from_millis(parse_value::<u64>(GROVE_HEALTH_INTERVAL_MS, &raw)?),
            None => health_defaults.interval,
        };

        Ok(GroveConfig {
            registry_path: get(GROVE_REGISTRY_PATH).map(PathBuf::from),
            database,
            health: HealthPolicy { attempts, interval },
            log_filter: get(GROVE_LOG).or_else(|| get(RUST_LOG)),
        })
    }

    /// Copy safe to log
    pub fn redacted(&self) -> GroveConfig {
        let mut copy = self.clone();
        copy.database.password = "***".to_string();
        copy
    }
}

fn parse_value<T: FromStr>(var: &str, raw: &str) -> Result<T> {
    raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
        var: var.to_string(),
        value: raw.to_string(),
    })
}

fn parse_positive<T: FromStr + PartialOrd + Default>(var: &str, raw: &str) -> Result<T> {
    let value = parse_value::<T>(var, raw)?;
    if value <= T::default() {
        return Err(ConfigError::InvalidValue {
            var: var.to_string(),
            value: raw.to_string(),
        });
    }
    Ok(value)
}
