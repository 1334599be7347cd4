//! Integrity verifier
//!
//! Re-derives digests for every object reachable along the first-parent
//! chain from HEAD and compares them to the digests they are stored
//! under. Second parents of merge commits are not walked independently;
//! the check covers the mainline history, a deliberate scope limit.

use crate::error::{RelicError, Result};
use crate::hash::{hash_bytes, ObjectId};
use crate::refs::RefStore;
use crate::store::ObjectStore;
use tracing::{debug, info};

/// Counts from a fully successful integrity walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegrityReport {
    pub commits_checked: usize,
    pub objects_checked: usize,
}

/// Walk first-parent history from HEAD, verifying every commit, its tree,
/// and every blob the tree references.
///
/// The first mismatch aborts the walk with a `Malformed` error naming the
/// offending object and both digests. A repository with no commits yet
/// verifies trivially with zero counts.
pub fn verify_repository(store: &ObjectStore, refs: &RefStore) -> Result<IntegrityReport> {
    let mut report = IntegrityReport {
        commits_checked: 0,
        objects_checked: 0,
    };

    let mut cursor = refs.head_commit()?;
    while let Some(commit_id) = cursor {
        check_object(store, &commit_id, "commit")?;
        report.objects_checked += 1;

        let commit = store.get_commit(&commit_id)?;
        check_object(store, &commit.tree, "tree")?;
        report.objects_checked += 1;

        for entry in store.get_tree(&commit.tree)? {
            check_object(store, &entry.blob, "blob")?;
            report.objects_checked += 1;
        }

        report.commits_checked += 1;
        debug!(commit = %commit_id, "verified commit");
        cursor = commit.first_parent();
    }

    info!(
        commits = report.commits_checked,
        objects = report.objects_checked,
        "integrity walk complete"
    );
    Ok(report)
}

/// Re-hash an object's stored bytes and compare to its storage key.
fn check_object(store: &ObjectStore, expected: &ObjectId, kind: &str) -> Result<()> {
    let raw = store.get(expected)?;
    let computed = hash_bytes(&raw);
    if computed != *expected {
        return Err(RelicError::Malformed(format!(
            "{} object corrupt: expected {}, computed {}",
            kind, expected, computed
        )));
    }
    Ok(())
}
