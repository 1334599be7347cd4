//! Arena-backed Merkle tree nodes

use crate::hash::ObjectId;

/// Index of a node within its owning [`MerkleTree`] arena.
pub type NodeIdx = usize;

/// A single node: a file leaf or a directory.
///
/// For a file, `digest` is the blob-hash of its content. For a directory,
/// `digest` is a pure function of its children's (path, digest) pairs.
#[derive(Debug, Clone)]
pub struct MerkleNode {
    /// Repository-relative path; empty for the root.
    pub path: String,
    pub is_file: bool,
    pub digest: ObjectId,
    /// Child node indices, in sorted path order.
    pub children: Vec<NodeIdx>,
}

/// Single owning structure for a whole hash tree.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    nodes: Vec<MerkleNode>,
    root: NodeIdx,
}

impl MerkleTree {
    /// Assemble a tree from an arena and its root index.
    ///
    /// Every index in any node's `children` must be valid in `nodes`.
    pub fn new(nodes: Vec<MerkleNode>, root: NodeIdx) -> Self {
        debug_assert!(root < nodes.len());
        Self { nodes, root }
    }

    pub fn root_idx(&self) -> NodeIdx {
        self.root
    }

    pub fn root(&self) -> &MerkleNode {
        &self.nodes[self.root]
    }

    /// Aggregate digest of the whole tree.
    pub fn root_digest(&self) -> ObjectId {
        self.root().digest
    }

    pub fn node(&self, idx: NodeIdx) -> &MerkleNode {
        &self.nodes[idx]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Find a file leaf by its repository-relative path.
    pub fn find_file(&self, path: &str) -> Option<NodeIdx> {
        self.nodes
            .iter()
            .position(|n| n.is_file && n.path == path)
    }

    /// All file leaves as (path, digest), in arena order.
    pub fn files(&self) -> Vec<(String, ObjectId)> {
        self.nodes
            .iter()
            .filter(|n| n.is_file)
            .map(|n| (n.path.clone(), n.digest))
            .collect()
    }

    /// Render the structure as indented text, files and directories marked.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_node(self.root, 0, &mut out);
        out
    }

    fn render_node(&self, idx: NodeIdx, depth: usize, out: &mut String) {
        let node = &self.nodes[idx];
        let indent = "  ".repeat(depth);
        let label = if node.path.is_empty() { "." } else { &node.path };
        let marker = if node.is_file { "f" } else { "d" };
        out.push_str(&format!(
            "{}{} {} [{}]\n",
            indent,
            marker,
            label,
            node.digest.short()
        ));
        for &child in &node.children {
            self.render_node(child, depth + 1, out);
        }
    }
}
