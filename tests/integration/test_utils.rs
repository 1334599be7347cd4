//! Shared helpers for integration tests

use relic::Repository;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Initialize a repository in a fresh temporary directory.
pub fn init_repo() -> (TempDir, Repository) {
    let temp = TempDir::new().expect("create temp dir");
    let repo = Repository::init(temp.path()).expect("init repository");
    (temp, repo)
}

/// Write a working-tree file, creating parent directories.
pub fn write_file(root: &Path, rel_path: &str, content: &str) {
    let full = root.join(rel_path);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(full, content).expect("write file");
}

/// Stage a file and commit it in one step, returning the commit digest.
pub fn commit_file(
    repo: &mut Repository,
    root: &Path,
    rel_path: &str,
    content: &str,
    message: &str,
) -> relic::ObjectId {
    write_file(root, rel_path, content);
    repo.add(rel_path).expect("stage file");
    repo.commit(message).expect("commit")
}
