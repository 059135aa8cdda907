// ABOUTME: JSON file implementation of the registry store
// ABOUTME: Saves are serialized by an advisory lock and guarded by a revision counter

use fs2::FileExt;
use serde::Deserialize;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use grove_core::constants::{
    DEFAULT_DATABASE_RANGE, LEGACY_DATABASE_RANGE_MIN, REGISTRY_DIR_NAME, REGISTRY_FILE_NAME,
};
use grove_core::Registry;

use crate::{RegistryStore, StorageError, StorageResult};

/// Registry stored as pretty-printed JSON at a fixed path
#[derive(Debug, Clone)]
pub struct JsonRegistryStore {
    path: PathBuf,
}

/// Only the revision is needed to detect a concurrent writer
#[derive(Deserialize)]
struct RevisionOnly {
    #[serde(default)]
    revision: u64,
}

impl JsonRegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location: `<git-common-dir>/grove/worktree.json`
    pub fn for_git_common_dir(common_dir: &Path) -> Self {
        Self::new(common_dir.join(REGISTRY_DIR_NAME).join(REGISTRY_FILE_NAME))
    }

    fn lock_path(&self) -> PathBuf {
        sibling(&self.path, ".lock")
    }

    fn corrupt(&self, reason: impl Into<String>) -> StorageError {
        StorageError::Corrupt {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }

    fn ensure_parent(&self) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn read_document(&self) -> StorageResult<String> {
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Err(self.corrupt("file is empty"));
        }
        Ok(content)
    }

    fn disk_revision(&self) -> StorageResult<u64> {
        if !self.path.exists() {
            return Ok(0);
        }
        let content = self.read_document()?;
        let parsed: RevisionOnly =
            serde_json::from_str(&content).map_err(|e| self.corrupt(e.to_string()))?;
        Ok(parsed.revision)
    }

    /// Write via a temporary sibling and rename so readers never see a partial file
    fn write_document(&self, registry: &Registry) -> StorageResult<()> {
        self.ensure_parent()?;

        let mut json = serde_json::to_string_pretty(registry)?;
        json.push('\n');

        let tmp_path = sibling(&self.path, &format!(".tmp-{}", std::process::id()));
        {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(json.as_bytes())?;
            tmp.sync_all()?;
        }
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }
}

/// Bring documents written by older versions up to the current shape
fn migrate(registry: &mut Registry) {
    let database = &mut registry.settings.port_ranges.database;
    if database.min == LEGACY_DATABASE_RANGE_MIN {
        info!(
            "Migrating legacy database port range {} to {}",
            database, DEFAULT_DATABASE_RANGE
        );
        *database = DEFAULT_DATABASE_RANGE;
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}

impl RegistryStore for JsonRegistryStore {
    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> StorageResult<Registry> {
        if !self.path.exists() {
            debug!("Registry does not exist yet at {:?}, creating it", self.path);
            let registry = Registry::default();
            self.write_document(&registry)?;
            return Ok(registry);
        }

        let content = self.read_document()?;
        let mut registry: Registry =
            serde_json::from_str(&content).map_err(|e| self.corrupt(e.to_string()))?;
        migrate(&mut registry);

        debug!(
            "Loaded {} worktree(s) from registry (revision {})",
            registry.worktrees.len(),
            registry.revision
        );
        Ok(registry)
    }

    fn save(&self, registry: &mut Registry) -> StorageResult<()> {
        self.ensure_parent()?;

        let lock_path = self.lock_path();
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|source| StorageError::Lock {
                path: lock_path.clone(),
                source,
            })?;
        lock.lock_exclusive().map_err(|source| StorageError::Lock {
            path: lock_path.clone(),
            source,
        })?;

        let result = self.save_locked(registry);

        let _ = FileExt::unlock(&lock);
        result
    }
}

impl JsonRegistryStore {
    fn save_locked(&self, registry: &mut Registry) -> StorageResult<()> {
        let found = self.disk_revision()?;
        if found != registry.revision {
            return Err(StorageError::ConcurrentModification {
                path: self.path.clone(),
                expected: registry.revision,
                found,
            });
        }

        let mut next = registry.clone();
        next.revision = registry.revision + 1;
        self.write_document(&next)?;
        registry.revision = next.revision;

        debug!(
            "Saved {} worktree(s) to registry (revision {})",
            registry.worktrees.len(),
            registry.revision
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sibling_paths() {
        let path = Path::new("/repo/.git/grove/worktree.json");
        assert_eq!(
            sibling(path, ".lock"),
            PathBuf::from("/repo/.git/grove/worktree.json.lock")
        );
    }

    #[test]
    fn test_migrate_replaces_legacy_database_range() {
        let mut registry = Registry::default();
        registry.settings.port_ranges.database.min = LEGACY_DATABASE_RANGE_MIN;
        registry.settings.port_ranges.database.max = 5499;

        migrate(&mut registry);
        assert_eq!(registry.settings.port_ranges.database, DEFAULT_DATABASE_RANGE);
    }

    #[test]
    fn test_migrate_keeps_custom_range() {
        let mut registry = Registry::default();
        registry.settings.port_ranges.database.min = 8000;
        registry.settings.port_ranges.database.max = 8010;

        migrate(&mut registry);
        assert_eq!(registry.settings.port_ranges.database.min, 8000);
    }
}
