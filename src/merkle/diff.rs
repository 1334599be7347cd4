//! Structural diff between two Merkle trees

use crate::merkle::node::{MerkleTree, NodeIdx};
use std::collections::BTreeMap;

/// How a path differs between the two sides of a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Present only on the second side.
    Added,
    /// Present only on the first side.
    Deleted,
    /// Present on both sides with differing digests.
    Modified,
}

impl ChangeKind {
    pub fn letter(&self) -> char {
        match self {
            ChangeKind::Added => 'A',
            ChangeKind::Deleted => 'D',
            ChangeKind::Modified => 'M',
        }
    }
}

/// Compare two trees level by level, keyed by path.
///
/// Recursion into a subtree happens only when both sides are directories
/// at that path. If one side is a file and the other a directory, the
/// result is `Modified` with no further descent; the shapes are
/// incomparable below that point.
pub fn diff(a: &MerkleTree, b: &MerkleTree) -> BTreeMap<String, ChangeKind> {
    let mut changes = BTreeMap::new();
    diff_level(a, a.root_idx(), b, b.root_idx(), &mut changes);
    changes
}

fn diff_level(
    a: &MerkleTree,
    a_idx: NodeIdx,
    b: &MerkleTree,
    b_idx: NodeIdx,
    changes: &mut BTreeMap<String, ChangeKind>,
) {
    let a_children: BTreeMap<&str, NodeIdx> = a
        .node(a_idx)
        .children
        .iter()
        .map(|&idx| (a.node(idx).path.as_str(), idx))
        .collect();
    let b_children: BTreeMap<&str, NodeIdx> = b
        .node(b_idx)
        .children
        .iter()
        .map(|&idx| (b.node(idx).path.as_str(), idx))
        .collect();

    for (path, &a_child) in &a_children {
        match b_children.get(path) {
            None => {
                changes.insert(path.to_string(), ChangeKind::Deleted);
            }
            Some(&b_child) => {
                let an = a.node(a_child);
                let bn = b.node(b_child);
                if an.digest != bn.digest {
                    changes.insert(path.to_string(), ChangeKind::Modified);
                    if !an.is_file && !bn.is_file {
                        diff_level(a, a_child, b, b_child, changes);
                    }
                }
            }
        }
    }

    for path in b_children.keys() {
        if !a_children.contains_key(*path) {
            changes.insert(path.to_string(), ChangeKind::Added);
        }
    }
}
