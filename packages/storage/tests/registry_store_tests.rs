// ABOUTME: Integration tests for the JSON registry store
// ABOUTME: Covers first-run creation, corruption reporting, migration and lost-update detection

use chrono::{TimeZone, Utc};
use grove_core::{
    app_container_name, db_container_name, Ports, Registry, Worktree, WorktreeStatus,
};
use grove_storage::{mutate, JsonRegistryStore, RegistryStore, StorageError};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn worktree(id: &str, frontend: u16) -> Worktree {
    let at = Utc.with_ymd_and_hms(2026, 2, 1, 9, 30, 0).unwrap();
    Worktree {
        id: id.to_string(),
        branch: id.to_string(),
        source_branch: "main".to_string(),
        path: PathBuf::from(format!("/tmp/grove-worktrees/{}", id)),
        ports: Ports {
            frontend,
            backend: 3001,
            database: 7432,
        },
        db_container_name: db_container_name(id),
        app_container_name: app_container_name(id),
        status: WorktreeStatus::Active,
        created_at: at,
        last_accessed: at,
    }
}

fn store_in(dir: &TempDir) -> JsonRegistryStore {
    JsonRegistryStore::for_git_common_dir(dir.path())
}

#[test]
fn test_load_creates_default_document() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let registry = store.load().unwrap();
    assert_eq!(registry, Registry::default());

    let path = dir.path().join("grove").join("worktree.json");
    assert_eq!(store.path(), path.as_path());

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.ends_with('\n'));
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(json["settings"]["worktreeBaseDir"], "../grove-worktrees");
    assert_eq!(json["settings"]["portRanges"]["database"]["min"], 7432);
}

#[test]
fn test_save_then_load_preserves_entries() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let mut registry = store.load().unwrap();
    registry.add(worktree("feature-a", 5173)).unwrap();
    store.save(&mut registry).unwrap();
    assert_eq!(registry.revision, 1);

    let reloaded = store.load().unwrap();
    assert_eq!(reloaded, registry);
}

#[test]
fn test_malformed_document_is_reported_not_reset() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    fs::write(store.path(), "{ not json").unwrap();

    let err = store.load().unwrap_err();
    assert!(matches!(err, StorageError::Corrupt { .. }));
    assert!(err.to_string().contains("worktree.json"));

    // The broken file is left for the user to inspect
    assert_eq!(fs::read_to_string(store.path()).unwrap(), "{ not json");
}

#[test]
fn test_empty_document_is_corrupt() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    fs::write(store.path(), "  \n").unwrap();

    assert!(matches!(store.load(), Err(StorageError::Corrupt { .. })));
}

#[test]
fn test_missing_settings_are_filled_and_legacy_range_migrated() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    fs::create_dir_all(store.path().parent().unwrap()).unwrap();

    fs::write(store.path(), r#"{"worktrees": []}"#).unwrap();
    let registry = store.load().unwrap();
    assert_eq!(registry.settings.port_ranges.backend.min, 3001);

    fs::write(
        store.path(),
        r#"{
          "worktrees": [],
          "settings": {
            "worktreeBaseDir": "../trees",
            "portRanges": {
              "frontend": {"min": 5173, "max": 5199},
              "backend": {"min": 3001, "max": 3099},
              "database": {"min": 5435, "max": 5499}
            }
          }
        }"#,
    )
    .unwrap();
    let registry = store.load().unwrap();
    assert_eq!(registry.settings.worktree_base_dir, "../trees");
    assert_eq!(registry.settings.port_ranges.database.min, 7432);
    assert_eq!(registry.settings.port_ranges.database.max, 7499);
}

#[test]
fn test_stale_save_is_rejected() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let mut first = store.load().unwrap();
    let mut second = store.load().unwrap();

    first.add(worktree("first", 5173)).unwrap();
    store.save(&mut first).unwrap();

    second.add(worktree("second", 5173)).unwrap();
    let err = store.save(&mut second).unwrap_err();
    match err {
        StorageError::ConcurrentModification { expected, found, .. } => {
            assert_eq!(expected, 0);
            assert_eq!(found, 1);
        }
        other => panic!("unexpected error: {other}"),
    }

    let on_disk = store.load().unwrap();
    assert_eq!(on_disk.worktrees.len(), 1);
    assert_eq!(on_disk.worktrees[0].id, "first");
}

#[test]
fn test_mutate_applies_against_fresh_contents() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let mut registry = store.load().unwrap();
    registry.add(worktree("keep", 5173)).unwrap();
    registry.add(worktree("drop", 5174)).unwrap();
    store.save(&mut registry).unwrap();

    let removed = mutate(&store, |r| r.remove("drop")).unwrap();
    assert_eq!(removed.unwrap().id, "drop");

    let on_disk = store.load().unwrap();
    assert_eq!(on_disk.revision, 2);
    assert_eq!(
        on_disk.worktrees.iter().map(|w| w.id.as_str()).collect::<Vec<_>>(),
        vec!["keep"]
    );
}

#[test]
fn test_no_temporary_files_left_behind() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let mut registry = store.load().unwrap();
    registry.add(worktree("a", 5173)).unwrap();
    store.save(&mut registry).unwrap();

    let names: Vec<String> = fs::read_dir(store.path().parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert!(names.iter().all(|n| !n.contains(".tmp-")), "{names:?}");
}
