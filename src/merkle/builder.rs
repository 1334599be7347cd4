//! Merkle tree construction
//!
//! Two deliberately asymmetric construction modes: a recursive walk of the
//! live working tree, and a single flat level read from a stored tree
//! object. Stored trees are flat path lists, so they cannot reconstruct
//! true subdirectory nesting the way a filesystem scan can; callers
//! comparing the two see subdirectory content only through digests.

use crate::error::{RelicError, Result};
use crate::hash::{hash_bytes, ObjectId};
use crate::merkle::hasher::dir_aggregate;
use crate::merkle::node::{MerkleNode, MerkleTree, NodeIdx};
use crate::objects::{self, ObjectKind};
use crate::store::ObjectStore;
use crate::CONTROL_DIR;
use std::fs;
use std::path::Path;
use tracing::{debug, instrument};

/// Build a tree from the live filesystem under `root`.
///
/// Depth-first, directory entries visited in lexicographic path order for
/// determinism. Files become leaves whose digest is the blob-hash of
/// their current on-disk content. The repository's own control directory
/// is excluded. Filesystem failures surface as errors; a missing or
/// unreadable entry is never silently treated as an empty subtree.
#[instrument(skip(root), fields(root = %root.as_ref().display()))]
pub fn build_from_working_tree(root: impl AsRef<Path>) -> Result<MerkleTree> {
    let root = root.as_ref();
    let mut nodes = Vec::new();
    let root_idx = build_directory(root, root, &mut nodes)?;
    debug!(node_count = nodes.len(), "built working-tree merkle tree");
    Ok(MerkleTree::new(nodes, root_idx))
}

fn build_directory(
    root: &Path,
    dir: &Path,
    nodes: &mut Vec<MerkleNode>,
) -> Result<NodeIdx> {
    let mut entries: Vec<std::path::PathBuf> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy() == CONTROL_DIR {
            continue;
        }
        entries.push(entry.path());
    }
    entries.sort();

    let mut children: Vec<NodeIdx> = Vec::new();
    for entry in entries {
        let meta = fs::metadata(&entry)?;
        if meta.is_dir() {
            children.push(build_directory(root, &entry, nodes)?);
        } else if meta.is_file() {
            let content = fs::read(&entry)?;
            let digest = hash_bytes(&objects::serialize(ObjectKind::Blob, &content));
            nodes.push(MerkleNode {
                path: relative_path(root, &entry),
                is_file: true,
                digest,
                children: vec![],
            });
            children.push(nodes.len() - 1);
        }
        // Other entry kinds (symlinks, sockets) are not tracked.
    }

    let pairs: Vec<(String, ObjectId)> = children
        .iter()
        .map(|&idx| (nodes[idx].path.clone(), nodes[idx].digest))
        .collect();
    let digest = dir_aggregate(&pairs);

    nodes.push(MerkleNode {
        path: relative_path(root, dir),
        is_file: false,
        digest,
        children,
    });
    Ok(nodes.len() - 1)
}

fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Build a flat single-level tree from the working directory.
///
/// Mirrors the shape [`build_from_tree_object`] produces, so the two
/// sides of a diff line up leaf for leaf. Paths come from the working-dir
/// lister (ignore patterns and the control directory excluded) and each
/// leaf digest is the blob-hash of the file's current content.
pub fn build_flat_from_working_tree(root: &Path) -> Result<MerkleTree> {
    let mut nodes: Vec<MerkleNode> = Vec::new();
    let mut children: Vec<NodeIdx> = Vec::new();
    let mut pairs: Vec<(String, ObjectId)> = Vec::new();

    for path in crate::workdir::list_files(root)? {
        let digest = ObjectStore::file_blob_id(&root.join(&path))?;
        nodes.push(MerkleNode {
            path: path.clone(),
            is_file: true,
            digest,
            children: vec![],
        });
        children.push(nodes.len() - 1);
        pairs.push((path, digest));
    }

    let digest = dir_aggregate(&pairs);
    nodes.push(MerkleNode {
        path: String::new(),
        is_file: false,
        digest,
        children,
    });
    let root_idx = nodes.len() - 1;
    Ok(MerkleTree::new(nodes, root_idx))
}

/// Build a tree from a stored tree object.
///
/// Produces a single flat level of file leaves taken directly from the
/// tree object's entries. A missing object is `NotFound` and a corrupt
/// one is `Malformed`; neither is ever reported as an empty tree.
#[instrument(skip(store))]
pub fn build_from_tree_object(store: &ObjectStore, tree_id: &ObjectId) -> Result<MerkleTree> {
    let entries = store.get_tree(tree_id)?;

    let mut nodes: Vec<MerkleNode> = Vec::new();
    let mut children: Vec<NodeIdx> = Vec::new();
    for entry in &entries {
        nodes.push(MerkleNode {
            path: entry.path.clone(),
            is_file: true,
            digest: entry.blob,
            children: vec![],
        });
        children.push(nodes.len() - 1);
    }

    let pairs: Vec<(String, ObjectId)> = entries
        .iter()
        .map(|e| (e.path.clone(), e.blob))
        .collect();
    let digest = dir_aggregate(&pairs);

    nodes.push(MerkleNode {
        path: String::new(),
        is_file: false,
        digest,
        children,
    });
    let root_idx = nodes.len() - 1;
    debug!(leaf_count = root_idx, "built merkle tree from tree object");
    Ok(MerkleTree::new(nodes, root_idx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merkle::hasher::{structural_hash, verify};
    use tempfile::TempDir;

    #[test]
    fn test_working_tree_deterministic() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.txt"), "bee").unwrap();
        fs::write(temp.path().join("a.txt"), "ay").unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("sub/c.txt"), "sea").unwrap();

        let t1 = build_from_working_tree(temp.path()).unwrap();
        let t2 = build_from_working_tree(temp.path()).unwrap();
        assert_eq!(t1.root_digest(), t2.root_digest());
    }

    #[test]
    fn test_working_tree_excludes_control_dir() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "ay").unwrap();
        let before = build_from_working_tree(temp.path()).unwrap();

        fs::create_dir_all(temp.path().join(".relic/objects")).unwrap();
        fs::write(temp.path().join(".relic/index"), "junk").unwrap();
        let after = build_from_working_tree(temp.path()).unwrap();

        assert_eq!(before.root_digest(), after.root_digest());
    }

    #[test]
    fn test_file_leaf_uses_blob_hash() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("hello.txt"), "hello").unwrap();

        let tree = build_from_working_tree(temp.path()).unwrap();
        let leaf = tree.node(tree.find_file("hello.txt").unwrap());
        assert_eq!(leaf.digest, hash_bytes(b"blob 5\0hello"));
    }

    #[test]
    fn test_content_change_propagates_to_root() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("deep")).unwrap();
        fs::write(temp.path().join("deep/f.txt"), "one").unwrap();
        let r1 = build_from_working_tree(temp.path()).unwrap().root_digest();

        fs::write(temp.path().join("deep/f.txt"), "two").unwrap();
        let r2 = build_from_working_tree(temp.path()).unwrap().root_digest();
        assert_ne!(r1, r2);
    }

    #[test]
    fn test_built_tree_verifies() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();
        fs::create_dir(temp.path().join("d")).unwrap();
        fs::write(temp.path().join("d/b.txt"), "b").unwrap();

        let tree = build_from_working_tree(temp.path()).unwrap();
        assert!(verify(&tree.root_digest(), &tree));
        assert_eq!(
            structural_hash(&tree, tree.root_idx()),
            tree.root_digest()
        );
    }

    #[test]
    fn test_tree_object_mode_is_flat() {
        let temp = TempDir::new().unwrap();
        let control = temp.path().join(".relic");
        fs::create_dir_all(&control).unwrap();
        let store = ObjectStore::new(&control);

        let blob = store.put(ObjectKind::Blob, b"content").unwrap();
        let entries = vec![crate::objects::TreeEntry {
            mode: crate::objects::MODE_FILE.to_string(),
            path: "nested/deep/file.txt".to_string(),
            blob,
        }];
        let tree_id = store
            .put(ObjectKind::Tree, &objects::encode_tree(&entries))
            .unwrap();

        let tree = build_from_tree_object(&store, &tree_id).unwrap();
        // One leaf plus the synthetic root: stored trees stay flat even
        // for paths with directory separators.
        assert_eq!(tree.len(), 2);
        assert!(tree.find_file("nested/deep/file.txt").is_some());
    }

    #[test]
    fn test_flat_working_tree_matches_tree_object_shape() {
        let temp = TempDir::new().unwrap();
        let control = temp.path().join(".relic");
        fs::create_dir_all(&control).unwrap();
        let store = ObjectStore::new(&control);

        fs::create_dir(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("a.txt"), "ay").unwrap();
        fs::write(temp.path().join("sub/b.txt"), "bee").unwrap();

        let flat = build_flat_from_working_tree(temp.path()).unwrap();
        // Two leaves plus the synthetic root, no nested directories.
        assert_eq!(flat.len(), 3);
        assert!(flat.find_file("sub/b.txt").is_some());

        // The same file set stored as a tree object yields the same root.
        let mut entries = Vec::new();
        for (path, content) in [("a.txt", "ay"), ("sub/b.txt", "bee")] {
            let blob = store.put(ObjectKind::Blob, content.as_bytes()).unwrap();
            entries.push(crate::objects::TreeEntry {
                mode: crate::objects::MODE_FILE.to_string(),
                path: path.to_string(),
                blob,
            });
        }
        let tree_id = store
            .put(ObjectKind::Tree, &objects::encode_tree(&entries))
            .unwrap();
        let stored = build_from_tree_object(&store, &tree_id).unwrap();
        assert_eq!(flat.root_digest(), stored.root_digest());
    }

    #[test]
    fn test_tree_object_missing_is_not_found() {
        let temp = TempDir::new().unwrap();
        let control = temp.path().join(".relic");
        fs::create_dir_all(&control).unwrap();
        let store = ObjectStore::new(&control);

        let ghost = hash_bytes(b"no such tree");
        assert!(matches!(
            build_from_tree_object(&store, &ghost),
            Err(RelicError::NotFound(_))
        ));
    }
}
