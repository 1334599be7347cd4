//! Aggregate hash computation for Merkle nodes

use crate::hash::{hash_bytes, ObjectId};
use crate::merkle::node::{MerkleTree, NodeIdx};

/// Compute a directory's aggregate digest from its children's
/// (path, digest) pairs.
///
/// Preimage: `"merkle_dir " ++ concat(path ++ ":" ++ digest_hex ++ ";")`
/// with children sorted by path. Nothing else enters the hash, so the
/// aggregate depends only on the pairs, never on content ordering within
/// a child.
pub fn dir_aggregate(children: &[(String, ObjectId)]) -> ObjectId {
    let mut sorted: Vec<&(String, ObjectId)> = children.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut preimage = String::from("merkle_dir ");
    for (path, digest) in sorted {
        preimage.push_str(path);
        preimage.push(':');
        preimage.push_str(&digest.to_hex());
        preimage.push(';');
    }
    hash_bytes(preimage.as_bytes())
}

/// Recompute a node's digest from scratch.
///
/// Never trusts the cached `digest` field of a directory: the aggregate is
/// re-derived from the children recursively. This is the sole basis of
/// verification. File leaves have no children; their digest is the input.
pub fn structural_hash(tree: &MerkleTree, idx: NodeIdx) -> ObjectId {
    let node = tree.node(idx);
    if node.is_file {
        return node.digest;
    }
    let children: Vec<(String, ObjectId)> = node
        .children
        .iter()
        .map(|&child| {
            let path = tree.node(child).path.clone();
            (path, structural_hash(tree, child))
        })
        .collect();
    dir_aggregate(&children)
}

/// Recompute the root digest and compare it against an expected value.
pub fn verify(expected: &ObjectId, tree: &MerkleTree) -> bool {
    structural_hash(tree, tree.root_idx()) == *expected
}
