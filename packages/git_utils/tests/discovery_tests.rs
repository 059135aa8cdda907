// ABOUTME: Repository discovery tests against real repositories created with git2
// ABOUTME: Linked working trees must resolve to the same common dir and main root as the main clone

use git2::{Repository, Signature};
use grove_git_utils::{GitError, RepoLocation};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn init_with_commit(dir: &Path) -> Repository {
    let repo = Repository::init(dir).unwrap();
    fs::write(dir.join("README.md"), "grove\n").unwrap();
    {
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("README.md")).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = Signature::now("Grove Test", "test@example.com").unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
            .unwrap();
    }
    repo
}

fn canonical(path: &Path) -> std::path::PathBuf {
    path.canonicalize().unwrap()
}

#[test]
fn test_discover_from_main_working_tree_subdirectory() {
    let dir = TempDir::new().unwrap();
    init_with_commit(dir.path());

    let nested = dir.path().join("src").join("app");
    fs::create_dir_all(&nested).unwrap();

    let location = RepoLocation::discover(&nested).unwrap();
    assert_eq!(canonical(&location.main_root), canonical(dir.path()));
    assert_eq!(
        canonical(&location.common_dir),
        canonical(&dir.path().join(".git"))
    );
}

#[test]
fn test_discover_from_linked_working_tree() {
    let dir = TempDir::new().unwrap();
    let main = dir.path().join("main");
    fs::create_dir_all(&main).unwrap();
    let repo = init_with_commit(&main);

    let linked = dir.path().join("trees").join("feature-x");
    fs::create_dir_all(linked.parent().unwrap()).unwrap();
    repo.worktree("feature-x", &linked, None).unwrap();

    let location = RepoLocation::discover(&linked).unwrap();
    assert_eq!(canonical(&location.main_root), canonical(&main));
    assert_eq!(
        canonical(&location.common_dir),
        canonical(&main.join(".git"))
    );
}

#[test]
fn test_discover_outside_repository() {
    let dir = TempDir::new().unwrap();

    match RepoLocation::discover(dir.path()) {
        Err(GitError::NotARepository(path)) => assert_eq!(path, dir.path()),
        // The temp dir itself sits inside another checkout
        Ok(_) => {}
        Err(other) => panic!("unexpected error: {other}"),
    }
}
