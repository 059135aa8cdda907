// ABOUTME: Git integration for grove: locating the shared repository and managing linked working trees
// ABOUTME: Discovery goes through git2; worktree mutations go through the git CLI

pub mod discovery;
pub mod worktrees;

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

use grove_core::ExecError;

pub use discovery::RepoLocation;
pub use worktrees::{parse_worktree_list, CheckoutRemoval, GitCli, GitWorktree, Vcs};

#[derive(Debug, Error)]
pub enum GitError {
    #[error("Not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("Repository at {} has no working tree", .0.display())]
    NoWorkingTree(PathBuf),

    #[error("git CLI not available: {0}")]
    NotAvailable(String),

    #[error("Git error: {0}")]
    Repository(#[from] git2::Error),

    #[error("Git command failed: {0}")]
    Exec(#[from] ExecError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GitError>;

/// Resolve `.` and `..` without touching the filesystem
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Compare two paths as git would report them
pub fn same_path(a: &Path, b: &Path) -> bool {
    if normalize_path(a) == normalize_path(b) {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/repo/app/../grove-worktrees/./feature")),
            PathBuf::from("/repo/grove-worktrees/feature")
        );
        assert_eq!(
            normalize_path(Path::new("../grove-worktrees")),
            PathBuf::from("../grove-worktrees")
        );
    }

    #[test]
    fn test_same_path_lexical() {
        assert!(same_path(
            Path::new("/repo/../trees/a"),
            Path::new("/trees/a")
        ));
        assert!(!same_path(Path::new("/trees/a"), Path::new("/trees/b")));
    }
}
