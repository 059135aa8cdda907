// ABOUTME: Linked working tree lifecycle through the git CLI
// ABOUTME: Branches are created when missing and never deleted; removal of an absent checkout prunes instead

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use grove_core::CommandRunner;

use crate::{same_path, GitError, Result};

/// One entry of `git worktree list --porcelain`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitWorktree {
    pub path: PathBuf,
    /// Short branch name, `None` for detached or bare entries
    pub branch: Option<String>,
    pub head: Option<String>,
    pub bare: bool,
}

/// What `remove_checkout` had to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutRemoval {
    Removed,
    /// Git did not know the path; stale metadata was pruned instead
    AlreadyAbsent,
}

/// Version control operations the orchestrator depends on
pub trait Vcs: Send + Sync {
    fn current_branch(&self) -> Result<String>;

    /// Local branch, or `origin/<branch>`
    fn branch_exists(&self, branch: &str) -> bool;

    fn create_branch(&self, branch: &str, source: &str) -> Result<()>;

    fn list_worktrees(&self) -> Result<Vec<GitWorktree>>;

    fn worktree_exists_for_branch(&self, branch: &str) -> Result<bool> {
        Ok(self
            .list_worktrees()?
            .iter()
            .any(|w| w.branch.as_deref() == Some(branch)))
    }

    /// Check out `branch` (created from `source` when missing) as a linked working tree at `path`
    fn create_checkout(&self, branch: &str, source: &str, path: &Path) -> Result<()>;

    fn remove_checkout(&self, path: &Path) -> Result<CheckoutRemoval>;

    /// Drop bookkeeping for working trees whose directories are gone
    fn prune_stale(&self) -> Result<()>;
}

/// Parse `git worktree list --porcelain`
pub fn parse_worktree_list(output: &str) -> Vec<GitWorktree> {
    let mut worktrees = Vec::new();
    let mut current: Option<GitWorktree> = None;

    for line in output.lines().chain(std::iter::once("")) {
        if let Some(path) = line.strip_prefix("worktree ") {
            if let Some(done) = current.take() {
                worktrees.push(done);
            }
            current = Some(GitWorktree {
                path: PathBuf::from(path),
                branch: None,
                head: None,
                bare: false,
            });
        } else if let Some(entry) = current.as_mut() {
            if let Some(head) = line.strip_prefix("HEAD ") {
                entry.head = Some(head.to_string());
            } else if let Some(branch) = line.strip_prefix("branch ") {
                let short = branch.strip_prefix("refs/heads/").unwrap_or(branch);
                entry.branch = Some(short.to_string());
            } else if line == "bare" {
                entry.bare = true;
            } else if line.is_empty() {
                if let Some(done) = current.take() {
                    worktrees.push(done);
                }
            }
        }
    }

    worktrees
}

/// `git` invoked through a [`CommandRunner`], always with `-C <repo root>`
pub struct GitCli {
    runner: Arc<dyn CommandRunner>,
    git: String,
    root: PathBuf,
}

impl GitCli {
    /// Locate `git` on PATH and operate on the repository at `root`
    pub fn new(runner: Arc<dyn CommandRunner>, root: impl Into<PathBuf>) -> Result<Self> {
        let git = which::which("git")
            .map_err(|e| GitError::NotAvailable(format!("git not found in PATH: {}", e)))?
            .to_string_lossy()
            .to_string();
        Ok(Self::with_program(runner, git, root))
    }

    pub fn with_program(
        runner: Arc<dyn CommandRunner>,
        git: impl Into<String>,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            git: git.into(),
            root: root.into(),
        }
    }

    fn git(&self, args: &[&str]) -> Result<String> {
        let root = self.root.to_string_lossy();
        let mut full = vec!["-C", root.as_ref()];
        full.extend_from_slice(args);
        Ok(self.runner.run(&self.git, &full)?)
    }

    fn git_safe(&self, args: &[&str]) -> Option<String> {
        self.git(args).ok()
    }

    fn local_branch_exists(&self, branch: &str) -> bool {
        let local = format!("refs/heads/{}", branch);
        self.git_safe(&["rev-parse", "--verify", "--quiet", &local])
            .is_some()
    }
}

impl Vcs for GitCli {
    fn current_branch(&self) -> Result<String> {
        self.git(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    fn branch_exists(&self, branch: &str) -> bool {
        if self.local_branch_exists(branch) {
            return true;
        }
        let remote = format!("refs/remotes/origin/{}", branch);
        self.git_safe(&["rev-parse", "--verify", "--quiet", &remote])
            .is_some()
    }

    fn create_branch(&self, branch: &str, source: &str) -> Result<()> {
        if self.git_safe(&["fetch", "origin"]).is_none() {
            debug!("git fetch origin failed, creating branch from local refs");
        }

        let source_ref = if self.local_branch_exists(source) {
            source.to_string()
        } else {
            format!("origin/{}", source)
        };

        info!("Creating branch {} from {}", branch, source_ref);
        self.git(&["branch", branch, &source_ref])?;
        Ok(())
    }

    fn list_worktrees(&self) -> Result<Vec<GitWorktree>> {
        let output = self.git(&["worktree", "list", "--porcelain"])?;
        Ok(parse_worktree_list(&output))
    }

    fn create_checkout(&self, branch: &str, source: &str, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        if !self.branch_exists(branch) {
            self.create_branch(branch, source)?;
        }

        let target = path.to_string_lossy();
        info!("Creating worktree for {} at {}", branch, target);
        self.git(&["worktree", "add", target.as_ref(), branch])?;
        Ok(())
    }

    fn remove_checkout(&self, path: &Path) -> Result<CheckoutRemoval> {
        let known = self
            .list_worktrees()?
            .iter()
            .any(|w| same_path(&w.path, path));

        if !known {
            info!(
                "Worktree at {} not known to git, pruning stale metadata",
                path.display()
            );
            self.prune_stale()?;
            return Ok(CheckoutRemoval::AlreadyAbsent);
        }

        let target = path.to_string_lossy();
        self.git(&["worktree", "remove", target.as_ref(), "--force"])?;
        info!("Removed worktree at {}", target);
        Ok(CheckoutRemoval::Removed)
    }

    fn prune_stale(&self) -> Result<()> {
        self.git(&["worktree", "prune"])?;
        Ok(())
    }
}
