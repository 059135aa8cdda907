// ABOUTME: In-memory queries and mutations over the worktree registry document
// ABOUTME: Persistence lives in grove-storage; these helpers never touch the registry file

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

use crate::types::{PortRange, Registry, ServiceClass, Worktree};
use crate::utils::sanitize_branch_name;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Worktree with ID '{0}' already exists")]
    DuplicateId(String),

    #[error("Worktree for branch '{0}' already exists")]
    DuplicateBranch(String),
}

impl Registry {
    pub fn find(&self, id: &str) -> Option<&Worktree> {
        self.worktrees.iter().find(|w| w.id == id)
    }

    pub fn find_by_branch(&self, branch: &str) -> Option<&Worktree> {
        self.worktrees.iter().find(|w| w.branch == branch)
    }

    /// Resolve a user-supplied target: exact id, then exact branch, then sanitized id
    pub fn resolve(&self, target: &str) -> Option<&Worktree> {
        self.find(target)
            .or_else(|| self.find_by_branch(target))
            .or_else(|| {
                let id = sanitize_branch_name(target);
                if id.is_empty() {
                    None
                } else {
                    self.find(&id)
                }
            })
    }

    /// The entry whose checkout contains `dir`; the deepest path wins
    pub fn find_by_path_containing(&self, dir: &Path) -> Option<&Worktree> {
        self.worktrees
            .iter()
            .filter(|w| dir.starts_with(&w.path))
            .max_by_key(|w| w.path.components().count())
    }

    pub fn add(&mut self, worktree: Worktree) -> Result<(), RegistryError> {
        if self.find(&worktree.id).is_some() {
            return Err(RegistryError::DuplicateId(worktree.id));
        }
        if self.find_by_branch(&worktree.branch).is_some() {
            return Err(RegistryError::DuplicateBranch(worktree.branch));
        }
        self.worktrees.push(worktree);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Option<Worktree> {
        let index = self.worktrees.iter().position(|w| w.id == id)?;
        Some(self.worktrees.remove(index))
    }

    /// Set `lastAccessed`; returns false when the id is unknown
    pub fn touch(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        match self.worktrees.iter_mut().find(|w| w.id == id) {
            Some(worktree) => {
                worktree.last_accessed = now;
                true
            }
            None => false,
        }
    }

    /// Ports of `class` reserved by any entry
    pub fn used_ports(&self, class: ServiceClass) -> BTreeSet<u16> {
        self.worktrees.iter().map(|w| w.ports.get(class)).collect()
    }

    pub fn port_range(&self, class: ServiceClass) -> PortRange {
        self.settings.port_ranges.get(class)
    }

    /// Entries not accessed for at least `days` whole days
    pub fn stale(&self, days: i64, now: DateTime<Utc>) -> Vec<&Worktree> {
        self.worktrees
            .iter()
            .filter(|w| w.days_since_access(now) >= days)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Ports, WorktreeStatus};
    use crate::utils::{app_container_name, db_container_name};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn entry(id: &str, branch: &str, path: &str, ports: (u16, u16, u16)) -> Worktree {
        let at = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
        Worktree {
            id: id.to_string(),
            branch: branch.to_string(),
            source_branch: "main".to_string(),
            path: PathBuf::from(path),
            ports: Ports {
                frontend: ports.0,
                backend: ports.1,
                database: ports.2,
            },
            db_container_name: db_container_name(id),
            app_container_name: app_container_name(id),
            status: WorktreeStatus::Active,
            created_at: at,
            last_accessed: at,
        }
    }

    fn registry() -> Registry {
        let mut registry = Registry::default();
        registry
            .add(entry("feature-a", "feature/a", "/w/feature-a", (5173, 3001, 7432)))
            .unwrap();
        registry
            .add(entry("bugfix", "Bugfix", "/w/bugfix", (5175, 3002, 7433)))
            .unwrap();
        registry
    }

    #[test]
    fn test_add_rejects_duplicates() {
        let mut registry = registry();
        assert_eq!(
            registry.add(entry("feature-a", "other", "/w/x", (5180, 3050, 7450))),
            Err(RegistryError::DuplicateId("feature-a".to_string()))
        );
        assert_eq!(
            registry.add(entry("other", "feature/a", "/w/x", (5180, 3050, 7450))),
            Err(RegistryError::DuplicateBranch("feature/a".to_string()))
        );
        assert_eq!(registry.worktrees.len(), 2);
    }

    #[test]
    fn test_resolve_order() {
        let registry = registry();
        assert_eq!(registry.resolve("feature-a").unwrap().id, "feature-a");
        assert_eq!(registry.resolve("feature/a").unwrap().id, "feature-a");
        assert_eq!(registry.resolve("Feature/A").unwrap().id, "feature-a");
        assert_eq!(registry.resolve("BUGFIX").unwrap().id, "bugfix");
        assert!(registry.resolve("///").is_none());
        assert!(registry.resolve("missing").is_none());
    }

    #[test]
    fn test_find_by_path_containing() {
        let registry = registry();
        let found = registry.find_by_path_containing(Path::new("/w/bugfix/src/app"));
        assert_eq!(found.unwrap().id, "bugfix");
        assert!(registry
            .find_by_path_containing(Path::new("/w/bugfix-two"))
            .is_none());
    }

    #[test]
    fn test_used_ports_and_remove() {
        let mut registry = registry();
        assert_eq!(
            registry.used_ports(ServiceClass::Frontend).into_iter().collect::<Vec<_>>(),
            vec![5173, 5175]
        );

        let removed = registry.remove("feature-a").unwrap();
        assert_eq!(removed.branch, "feature/a");
        assert!(registry.remove("feature-a").is_none());
        assert!(!registry.used_ports(ServiceClass::Database).contains(&7432));
    }

    #[test]
    fn test_touch_and_stale() {
        let mut registry = registry();
        let now = Utc.with_ymd_and_hms(2026, 5, 11, 12, 0, 0).unwrap();

        assert!(registry.touch("bugfix", now));
        assert!(!registry.touch("missing", now));

        let stale: Vec<_> = registry.stale(7, now).into_iter().map(|w| w.id.as_str()).collect();
        assert_eq!(stale, vec!["feature-a"]);
    }
}
