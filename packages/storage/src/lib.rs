// ABOUTME: Registry persistence for grove worktrees
// ABOUTME: A single JSON document shared by every working tree of one repository clone

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use grove_core::Registry;

pub mod json;

pub use json::JsonRegistryStore;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Registry file {} is corrupt: {reason}. Repair or remove it by hand; grove will not overwrite it", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("Registry file {} was modified by another grove process (loaded revision {expected}, found {found})", .path.display())]
    ConcurrentModification {
        path: PathBuf,
        expected: u64,
        found: u64,
    },

    #[error("Failed to lock registry {}: {source}", .path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Attempts made by [`mutate`] before giving up on a contended registry
pub const MAX_SAVE_ATTEMPTS: usize = 5;

/// Persistent home of the registry document
pub trait RegistryStore: Send + Sync {
    /// Location of the backing document
    fn path(&self) -> &Path;

    /// Load the registry, creating a default document when none exists.
    /// A document that cannot be parsed is reported, never replaced.
    fn load(&self) -> StorageResult<Registry>;

    /// Persist `registry` if nobody saved since it was loaded.
    /// On success `registry.revision` holds the new revision.
    fn save(&self, registry: &mut Registry) -> StorageResult<()>;
}

/// Load, apply `apply`, save; reload and reapply on concurrent modification.
///
/// `apply` must be safe to run more than once against fresh registry contents.
pub fn mutate<T, F>(store: &dyn RegistryStore, mut apply: F) -> StorageResult<T>
where
    F: FnMut(&mut Registry) -> T,
{
    let mut attempt = 1;
    loop {
        let mut registry = store.load()?;
        let value = apply(&mut registry);
        match store.save(&mut registry) {
            Ok(()) => return Ok(value),
            Err(StorageError::ConcurrentModification { expected, found, .. })
                if attempt < MAX_SAVE_ATTEMPTS =>
            {
                debug!(
                    "Registry changed underneath us (revision {} -> {}), retrying",
                    expected, found
                );
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
