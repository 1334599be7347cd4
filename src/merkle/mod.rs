//! Merkle engine
//!
//! Builds a hash tree over either the live working tree or a stored tree
//! object, and drives verification, structural diffs, and inclusion
//! proofs. Hash equality at any node substitutes for full content
//! comparison below it.
//!
//! Nodes live in an index-addressable arena owned by [`node::MerkleTree`];
//! children are referenced by index, so the structure needs no shared
//! ownership.

pub mod builder;
pub mod diff;
pub mod hasher;
pub mod node;
pub mod proof;

pub use builder::{build_flat_from_working_tree, build_from_tree_object, build_from_working_tree};
pub use diff::{diff, ChangeKind};
pub use hasher::{structural_hash, verify};
pub use node::{MerkleNode, MerkleTree, NodeIdx};
pub use proof::{build_proof, verify_proof};
