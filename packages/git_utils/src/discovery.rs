// ABOUTME: Locates the repository shared by all linked working trees using git2
// ABOUTME: The common git dir anchors the registry; the main working tree anchors checkout paths

use git2::{ErrorCode, Repository};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{GitError, Result};

/// Where the repository lives, seen from any of its working trees
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLocation {
    /// Git directory shared by every working tree (`<main>/.git`)
    pub common_dir: PathBuf,
    /// Root of the main working tree
    pub main_root: PathBuf,
}

impl RepoLocation {
    pub fn discover(dir: &Path) -> Result<Self> {
        debug!("Discovering git repository from {}", dir.display());

        let repo = Repository::discover(dir).map_err(|e| match e.code() {
            ErrorCode::NotFound => GitError::NotARepository(dir.to_path_buf()),
            _ => GitError::Repository(e),
        })?;

        let current_root = repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| GitError::NoWorkingTree(repo.path().to_path_buf()))?;

        let common_dir = repo.commondir().to_path_buf();
        let main_root = match common_dir.file_name() {
            Some(name) if name == ".git" => common_dir
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| current_root.clone()),
            _ => current_root.clone(),
        };

        debug!(
            "Repository common dir {}, main working tree {}",
            common_dir.display(),
            main_root.display()
        );

        Ok(Self {
            common_dir: strip_trailing_separator(common_dir),
            main_root: strip_trailing_separator(main_root),
        })
    }
}

/// git2 reports directories with a trailing slash
fn strip_trailing_separator(path: PathBuf) -> PathBuf {
    path.components().collect()
}
