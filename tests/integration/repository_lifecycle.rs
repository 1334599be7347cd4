//! End-to-end repository lifecycle: layout, storage format, and the
//! add/commit/switch cycle exercised through the public session API.

use crate::integration::test_utils::{commit_file, init_repo, write_file};
use relic::hash::hash_bytes;
use relic::refs::HeadState;
use relic::ObjectId;
use std::fs;

#[test]
fn test_init_layout_is_exact() {
    let (temp, _repo) = init_repo();
    let control = temp.path().join(".relic");

    let head = fs::read_to_string(control.join("HEAD")).unwrap();
    assert_eq!(head, "ref: refs/heads/main\n");

    assert!(control.join("objects").is_dir());
    assert!(control.join("refs/heads").is_dir());
    assert!(control.join("refs/tags").is_dir());
    assert_eq!(fs::read_dir(control.join("refs/heads")).unwrap().count(), 0);
}

#[test]
fn test_hello_blob_bytes_and_digest() {
    let (temp, mut repo) = init_repo();
    write_file(temp.path(), "hello.txt", "hello");
    repo.add("hello.txt").unwrap();

    // The stored form is exactly "blob 5\0hello" and its digest is the
    // standard SHA-1 of those bytes.
    let expected =
        ObjectId::from_hex("b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0").unwrap();
    let raw = repo.store().get(&expected).unwrap();
    assert_eq!(raw, b"blob 5\0hello");
    assert_eq!(hash_bytes(b"blob 5\0hello"), expected);
}

#[test]
fn test_blob_roundtrip_through_store() {
    let (temp, mut repo) = init_repo();
    write_file(temp.path(), "data.bin", "arbitrary content\nwith lines");
    repo.add("data.bin").unwrap();

    let staged = repo.store();
    let id = relic::store::ObjectStore::file_blob_id(&temp.path().join("data.bin")).unwrap();
    assert_eq!(
        staged.get_blob(&id).unwrap(),
        b"arbitrary content\nwith lines"
    );
}

#[test]
fn test_identical_content_stored_once() {
    let (temp, mut repo) = init_repo();
    write_file(temp.path(), "a.txt", "same bytes");
    write_file(temp.path(), "b.txt", "same bytes");
    repo.add(".").unwrap();

    let objects: Vec<_> = walkdir::WalkDir::new(temp.path().join(".relic/objects"))
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .collect();
    // Two paths, one blob.
    assert_eq!(objects.len(), 1);
}

#[test]
fn test_commit_history_links() {
    let (temp, mut repo) = init_repo();
    let first = commit_file(&mut repo, temp.path(), "f.txt", "one", "first");
    let second = commit_file(&mut repo, temp.path(), "f.txt", "two", "second");
    let third = commit_file(&mut repo, temp.path(), "g.txt", "three", "third");

    let store = repo.store();
    assert_eq!(store.get_commit(&third).unwrap().first_parent(), Some(second));
    assert_eq!(store.get_commit(&second).unwrap().first_parent(), Some(first));
    assert_eq!(store.get_commit(&first).unwrap().first_parent(), None);
}

#[test]
fn test_switch_roundtrip_restores_content() {
    let (temp, mut repo) = init_repo();
    commit_file(&mut repo, temp.path(), "shared.txt", "v1", "base");
    repo.create_branch("side").unwrap();
    commit_file(&mut repo, temp.path(), "shared.txt", "v2", "main edit");

    repo.switch("side").unwrap();
    assert_eq!(
        fs::read_to_string(temp.path().join("shared.txt")).unwrap(),
        "v1"
    );
    repo.switch("main").unwrap();
    assert_eq!(
        fs::read_to_string(temp.path().join("shared.txt")).unwrap(),
        "v2"
    );
    assert_eq!(
        repo.refs().head_state().unwrap(),
        HeadState::OnBranch("main".to_string())
    );
}

#[test]
fn test_index_file_format_on_disk() {
    let (temp, mut repo) = init_repo();
    write_file(temp.path(), "z.txt", "zee");
    write_file(temp.path(), "a.txt", "ay");
    repo.add(".").unwrap();

    let index = fs::read_to_string(temp.path().join(".relic/index")).unwrap();
    let lines: Vec<&str> = index.lines().collect();
    assert_eq!(lines.len(), 2);
    // "<mode> <digest> <path>", sorted by path.
    assert!(lines[0].starts_with("100644 "));
    assert!(lines[0].ends_with(" a.txt"));
    assert!(lines[1].ends_with(" z.txt"));
}

#[test]
fn test_stash_cycle_through_session() {
    let (temp, mut repo) = init_repo();
    commit_file(&mut repo, temp.path(), "base.txt", "base", "base");

    write_file(temp.path(), "wip.txt", "work in progress");
    repo.add("wip.txt").unwrap();
    let id = repo.stash_save().unwrap();
    assert!(!temp.path().join("wip.txt").exists());

    let listing = repo.stash_list().unwrap();
    assert_eq!(listing, format!("stash@{{0}}: {}\n", id));

    repo.stash_pop().unwrap();
    assert_eq!(
        fs::read_to_string(temp.path().join("wip.txt")).unwrap(),
        "work in progress"
    );
    assert_eq!(repo.stash_list().unwrap(), "no stash entries\n");
}

#[test]
fn test_ignored_files_not_staged_by_add_dot() {
    let (temp, mut repo) = init_repo();
    write_file(temp.path(), ".relicignore", "build/\n");
    write_file(temp.path(), "build/out.bin", "artifact");
    write_file(temp.path(), "kept.txt", "kept");

    let staged = repo.add(".").unwrap();
    assert!(staged.contains(&"kept.txt".to_string()));
    assert!(!staged.iter().any(|p| p.starts_with("build/")));
}
