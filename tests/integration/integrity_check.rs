//! Integrity verification against on-disk corruption.

use crate::integration::test_utils::{commit_file, init_repo};
use relic::store::ObjectStore;
use relic::RelicError;
use std::fs;

#[test]
fn test_clean_repository_reports_counts() {
    let (temp, mut repo) = init_repo();
    commit_file(&mut repo, temp.path(), "a.txt", "a", "first");
    commit_file(&mut repo, temp.path(), "b.txt", "b", "second");

    let report = repo.verify_integrity().unwrap();
    assert_eq!(report.commits_checked, 2);
    // first: commit + tree + 1 blob; second: commit + tree + 2 blobs.
    assert_eq!(report.objects_checked, 7);
}

#[test]
fn test_altered_blob_identified_by_digest() {
    let (temp, mut repo) = init_repo();
    commit_file(&mut repo, temp.path(), "f.txt", "original", "base");

    let blob = ObjectStore::file_blob_id(&temp.path().join("f.txt")).unwrap();
    let path = repo.store().object_path(&blob);
    fs::write(&path, b"blob 8\0altered!").unwrap();

    let err = repo.verify_integrity().unwrap_err();
    match &err {
        RelicError::Malformed(msg) => {
            assert!(msg.contains(&blob.to_hex()), "message was: {}", msg);
            assert!(msg.contains("expected"), "message was: {}", msg);
            assert!(msg.contains("computed"), "message was: {}", msg);
        }
        other => panic!("expected Malformed, got {:?}", other),
    }
}

#[test]
fn test_verification_covers_full_first_parent_chain() {
    let (temp, mut repo) = init_repo();
    let first = commit_file(&mut repo, temp.path(), "f.txt", "v1", "first");
    commit_file(&mut repo, temp.path(), "f.txt", "v2", "second");

    // Damage an object reachable only through the older commit.
    let first_commit = repo.store().get_commit(&first).unwrap();
    let path = repo.store().object_path(&first_commit.tree);
    let mut raw = fs::read(&path).unwrap();
    let len = raw.len();
    raw[len - 1] ^= 0x01;
    fs::write(&path, raw).unwrap();

    assert!(repo.verify_integrity().is_err());
}
