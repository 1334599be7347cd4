//! Merge scenarios driven through the repository session: clean merges,
//! conflict-marker output, and idempotence on convergent trees.

use crate::integration::test_utils::{commit_file, init_repo, write_file};
use relic::RelicError;
use std::fs;

#[test]
fn test_divergent_edit_conflict_markers() {
    let (temp, mut repo) = init_repo();
    commit_file(&mut repo, temp.path(), "f.txt", "base", "base");
    repo.create_branch("feature").unwrap();

    commit_file(&mut repo, temp.path(), "f.txt", "from main", "main edit");

    repo.switch("feature").unwrap();
    commit_file(&mut repo, temp.path(), "f.txt", "from feature", "feature edit");

    repo.switch("main").unwrap();
    let err = repo.merge("feature").unwrap_err();
    match err {
        RelicError::Conflict(paths) => assert_eq!(paths, vec!["f.txt"]),
        other => panic!("expected conflict, got {:?}", other),
    }

    let content = fs::read_to_string(temp.path().join("f.txt")).unwrap();
    assert_eq!(
        content,
        "<<<<<<< main\nfrom main\n=======\nfrom feature\n>>>>>>> feature\n"
    );
}

#[test]
fn test_conflict_then_resolve_and_commit() {
    let (temp, mut repo) = init_repo();
    commit_file(&mut repo, temp.path(), "f.txt", "base", "base");
    repo.create_branch("feature").unwrap();
    commit_file(&mut repo, temp.path(), "f.txt", "ours", "main edit");
    repo.switch("feature").unwrap();
    commit_file(&mut repo, temp.path(), "f.txt", "theirs", "feature edit");
    repo.switch("main").unwrap();

    repo.merge("feature").unwrap_err();

    // Resolve by hand, restage, and commit explicitly.
    write_file(temp.path(), "f.txt", "resolved");
    repo.add("f.txt").unwrap();
    let resolution = repo.commit("resolve merge").unwrap();

    let commit = repo.store().get_commit(&resolution).unwrap();
    let tree = repo.store().get_tree(&commit.tree).unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(
        repo.store().get_blob(&tree[0].blob).unwrap(),
        b"resolved"
    );
}

#[test]
fn test_clean_merge_adopts_both_sides() {
    let (temp, mut repo) = init_repo();
    commit_file(&mut repo, temp.path(), "common.txt", "common", "base");
    repo.create_branch("feature").unwrap();

    commit_file(&mut repo, temp.path(), "main_only.txt", "m", "main adds");

    repo.switch("feature").unwrap();
    commit_file(&mut repo, temp.path(), "feature_only.txt", "f", "feature adds");

    repo.switch("main").unwrap();
    let merged = repo.merge("feature").unwrap();

    let commit = repo.store().get_commit(&merged).unwrap();
    assert_eq!(commit.parents.len(), 2);
    assert_eq!(repo.refs().branch_tip("main").unwrap(), Some(merged));

    for name in ["common.txt", "main_only.txt", "feature_only.txt"] {
        assert!(temp.path().join(name).exists(), "missing {}", name);
    }
}

#[test]
fn test_merge_idempotence_on_convergent_trees() {
    let (temp, mut repo) = init_repo();
    commit_file(&mut repo, temp.path(), "f.txt", "identical", "main version");

    // A second branch with a distinct commit carrying the same tree.
    repo.create_branch("twin").unwrap();
    repo.switch("twin").unwrap();
    repo.add("f.txt").unwrap();
    repo.commit("twin version, same content").unwrap();

    repo.switch("main").unwrap();
    let merged = repo.merge("twin").unwrap();

    let commit = repo.store().get_commit(&merged).unwrap();
    let p1 = repo.store().get_commit(&commit.parents[0]).unwrap();
    let p2 = repo.store().get_commit(&commit.parents[1]).unwrap();
    assert_eq!(commit.tree, p1.tree);
    assert_eq!(commit.tree, p2.tree);
}

#[test]
fn test_merge_preconditions_leave_state_untouched() {
    let (temp, mut repo) = init_repo();
    let tip = commit_file(&mut repo, temp.path(), "f.txt", "x", "base");

    // Self-merge.
    assert!(matches!(
        repo.merge("main"),
        Err(RelicError::InvalidState(_))
    ));
    // Missing target.
    assert!(matches!(repo.merge("ghost"), Err(RelicError::NotFound(_))));
    assert_eq!(repo.refs().branch_tip("main").unwrap(), Some(tip));

    // Detached HEAD.
    repo.create_branch("other").unwrap();
    repo.checkout(&tip.to_hex()).unwrap();
    assert!(matches!(
        repo.merge("other"),
        Err(RelicError::InvalidState(_))
    ));
}
