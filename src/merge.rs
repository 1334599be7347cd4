//! Merge engine
//!
//! Three-way-by-path reconciliation of two branch snapshots. Each tip
//! resolves to a flat path → blob mapping; the union of paths is
//! classified per path, conflicted files get marker content written to
//! the working tree and staged as new blobs, and a clean merge produces
//! a two-parent commit advancing the current branch.

use crate::error::{RelicError, Result};
use crate::hash::ObjectId;
use crate::index::{Index, IndexEntry};
use crate::objects::{encode_commit, encode_tree, Commit, ObjectKind, MODE_FILE};
use crate::refs::{HeadState, RefStore};
use crate::store::ObjectStore;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Merge `target_branch` into the current branch, returning the merge
/// commit's digest.
///
/// Preconditions are checked before anything is touched: HEAD must be
/// attached to a born branch, and the target must exist and differ from
/// the current branch. Divergent edits yield `Conflict` with the
/// offending paths; no commit is created, the index holds the conflict
/// blobs and the working tree holds marker files, awaiting an explicit
/// follow-up commit.
pub fn merge_branch(
    workdir: &Path,
    store: &ObjectStore,
    refs: &RefStore,
    index: &mut Index,
    target_branch: &str,
    signature: &str,
) -> Result<ObjectId> {
    let current_branch = match refs.head_state()? {
        HeadState::OnBranch(name) => name,
        HeadState::Detached(_) => {
            return Err(RelicError::InvalidState(
                "cannot merge with a detached HEAD".to_string(),
            ))
        }
        HeadState::Unborn(_) => {
            return Err(RelicError::InvalidState(
                "current branch has no commits yet".to_string(),
            ))
        }
    };
    if target_branch == current_branch {
        return Err(RelicError::InvalidState(format!(
            "cannot merge branch '{}' into itself",
            target_branch
        )));
    }
    let target_tip = refs
        .branch_tip(target_branch)?
        .ok_or_else(|| RelicError::NotFound(format!("branch {}", target_branch)))?;
    let current_tip = refs
        .branch_tip(&current_branch)?
        .ok_or_else(|| RelicError::NotFound(format!("branch {}", current_branch)))?;

    let ours = snapshot(store, &current_tip)?;
    let theirs = snapshot(store, &target_tip)?;

    let mut paths: Vec<String> = ours.keys().chain(theirs.keys()).cloned().collect();
    paths.sort();
    paths.dedup();

    let mut staged: BTreeMap<String, IndexEntry> = BTreeMap::new();
    let mut conflicts = Vec::new();

    for path in &paths {
        match (ours.get(path), theirs.get(path)) {
            (Some(our), Some(their)) if our.blob == their.blob => {
                staged.insert(path.clone(), our.clone());
            }
            (Some(our), Some(their)) => {
                let blob = write_conflict_file(
                    workdir,
                    store,
                    path,
                    &current_branch,
                    &our.blob,
                    target_branch,
                    &their.blob,
                )?;
                staged.insert(
                    path.clone(),
                    IndexEntry {
                        mode: MODE_FILE.to_string(),
                        blob,
                    },
                );
                conflicts.push(path.clone());
            }
            (Some(our), None) => {
                if !workdir.join(path).exists() {
                    write_workdir_file(workdir, path, &store.get_blob(&our.blob)?)?;
                }
                staged.insert(path.clone(), our.clone());
            }
            (None, Some(their)) => {
                write_workdir_file(workdir, path, &store.get_blob(&their.blob)?)?;
                staged.insert(path.clone(), their.clone());
            }
            (None, None) => unreachable!("path came from the union of the two snapshots"),
        }
    }

    index.replace(staged)?;

    if !conflicts.is_empty() {
        debug!(count = conflicts.len(), "merge stopped on conflicts");
        return Err(RelicError::Conflict(conflicts));
    }

    let tree = store.put(ObjectKind::Tree, &encode_tree(&index.to_tree_entries()))?;
    let commit = Commit {
        tree,
        parents: vec![current_tip, target_tip],
        author: signature.to_string(),
        committer: signature.to_string(),
        message: format!("Merge branch '{}' into {}", target_branch, current_branch),
    };
    let commit_id = store.put(ObjectKind::Commit, &encode_commit(&commit))?;
    refs.advance_branch(&current_branch, &commit_id)?;

    info!(commit = %commit_id, target = target_branch, "merged branch");
    Ok(commit_id)
}

/// Flat path → entry snapshot of the tree a commit points at.
fn snapshot(store: &ObjectStore, commit_id: &ObjectId) -> Result<BTreeMap<String, IndexEntry>> {
    let commit = store.get_commit(commit_id)?;
    let entries = store.get_tree(&commit.tree)?;
    Ok(entries
        .into_iter()
        .map(|e| {
            (
                e.path,
                IndexEntry {
                    mode: e.mode,
                    blob: e.blob,
                },
            )
        })
        .collect())
}

/// Write a conflict-marker file and store its content as a blob.
///
/// Each side's content is newline-terminated if it is not already, so the
/// divider and closing marker always start at column zero.
fn write_conflict_file(
    workdir: &Path,
    store: &ObjectStore,
    path: &str,
    current_branch: &str,
    our_blob: &ObjectId,
    target_branch: &str,
    their_blob: &ObjectId,
) -> Result<ObjectId> {
    let ours = store.get_blob(our_blob)?;
    let theirs = store.get_blob(their_blob)?;

    let mut content = Vec::new();
    content.extend_from_slice(format!("<<<<<<< {}\n", current_branch).as_bytes());
    content.extend_from_slice(&ours);
    if !ours.ends_with(b"\n") {
        content.push(b'\n');
    }
    content.extend_from_slice(b"=======\n");
    content.extend_from_slice(&theirs);
    if !theirs.ends_with(b"\n") {
        content.push(b'\n');
    }
    content.extend_from_slice(format!(">>>>>>> {}\n", target_branch).as_bytes());

    write_workdir_file(workdir, path, &content)?;
    store.put(ObjectKind::Blob, &content)
}

fn write_workdir_file(workdir: &Path, rel_path: &str, content: &[u8]) -> Result<()> {
    let full = workdir.join(rel_path);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&full, content)?;
    Ok(())
}
