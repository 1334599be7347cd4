//! Object model and wire codec
//!
//! The three object kinds (blob, tree, commit) share one serialized form:
//! `"<kind> <byteLength>\0<payload>"`. The digest of an object is always
//! the hash of that entire serialized buffer, header included, which is
//! what makes the store content-addressed.

use crate::error::{RelicError, Result};
use crate::hash::ObjectId;

/// File mode recorded for every tracked regular file.
pub const MODE_FILE: &str = "100644";

/// One entry in a tree object: `(mode, path, blob digest)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: String,
    pub path: String,
    pub blob: ObjectId,
}

/// A commit: snapshot pointer plus parent links and metadata.
///
/// Ordinary commits carry one parent, merge commits two (first parent
/// first), the root commit none.
#[derive(Debug, Clone)]
pub struct Commit {
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
    pub author: String,
    pub committer: String,
    pub message: String,
}

impl Commit {
    /// First-parent link, the one history walks follow.
    pub fn first_parent(&self) -> Option<ObjectId> {
        self.parents.first().copied()
    }
}

/// Object kind tag as it appears in the serialized header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
}

impl ObjectKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "blob" => Ok(ObjectKind::Blob),
            "tree" => Ok(ObjectKind::Tree),
            "commit" => Ok(ObjectKind::Commit),
            other => Err(RelicError::Malformed(format!(
                "unrecognized object kind: {:?}",
                other
            ))),
        }
    }
}

/// Prepend the object header to a payload, producing the stored byte form.
pub fn serialize(kind: ObjectKind, payload: &[u8]) -> Vec<u8> {
    let header = format!("{} {}\0", kind.tag(), payload.len());
    let mut buf = Vec::with_capacity(header.len() + payload.len());
    buf.extend_from_slice(header.as_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Split a stored buffer into its kind and payload.
///
/// Fails with `Malformed` if the header separator is absent, the kind tag
/// is unrecognized, or the declared length disagrees with the payload.
pub fn parse_header(raw: &[u8]) -> Result<(ObjectKind, &[u8])> {
    let nul = raw
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| RelicError::Malformed("object header separator missing".to_string()))?;
    let header = std::str::from_utf8(&raw[..nul])
        .map_err(|_| RelicError::Malformed("object header is not UTF-8".to_string()))?;
    let (tag, len_str) = header
        .split_once(' ')
        .ok_or_else(|| RelicError::Malformed(format!("invalid object header: {:?}", header)))?;
    let kind = ObjectKind::from_tag(tag)?;
    let declared: usize = len_str
        .parse()
        .map_err(|_| RelicError::Malformed(format!("invalid object length: {:?}", len_str)))?;
    let payload = &raw[nul + 1..];
    if payload.len() != declared {
        return Err(RelicError::Malformed(format!(
            "object length mismatch: header says {}, payload is {}",
            declared,
            payload.len()
        )));
    }
    Ok((kind, payload))
}

/// Encode tree entries into the tree payload.
///
/// One line per entry, `"<mode> blob <digest> <path>\n"`, in the order
/// given. Callers pass entries in path-sorted index order; that
/// determinism is load-bearing, it is what makes tree digests a valid
/// proxy for "same file set".
pub fn encode_tree(entries: &[TreeEntry]) -> Vec<u8> {
    let mut payload = String::new();
    for entry in entries {
        payload.push_str(&format!(
            "{} blob {} {}\n",
            entry.mode, entry.blob, entry.path
        ));
    }
    payload.into_bytes()
}

/// Decode a tree payload back into entries.
pub fn decode_tree(payload: &[u8]) -> Result<Vec<TreeEntry>> {
    let text = std::str::from_utf8(payload)
        .map_err(|_| RelicError::Malformed("tree payload is not UTF-8".to_string()))?;
    let mut entries = Vec::new();
    for line in text.lines() {
        if line.is_empty() {
            continue;
        }
        let mut parts = line.splitn(4, ' ');
        let (mode, kind, hash, path) = match (parts.next(), parts.next(), parts.next(), parts.next())
        {
            (Some(m), Some(k), Some(h), Some(p)) => (m, k, h, p),
            _ => {
                return Err(RelicError::Malformed(format!(
                    "invalid tree entry: {:?}",
                    line
                )))
            }
        };
        if kind != "blob" {
            return Err(RelicError::Malformed(format!(
                "unexpected tree entry kind: {:?}",
                kind
            )));
        }
        entries.push(TreeEntry {
            mode: mode.to_string(),
            path: path.to_string(),
            blob: ObjectId::from_hex(hash)?,
        });
    }
    Ok(entries)
}

/// Encode a commit into its payload form.
///
/// `"tree <digest>\n"`, zero or more `"parent <digest>\n"` (first parent
/// first), author, committer, blank line, message, trailing newline.
pub fn encode_commit(commit: &Commit) -> Vec<u8> {
    let mut payload = String::new();
    payload.push_str(&format!("tree {}\n", commit.tree));
    for parent in &commit.parents {
        payload.push_str(&format!("parent {}\n", parent));
    }
    payload.push_str(&format!("author {}\n", commit.author));
    payload.push_str(&format!("committer {}\n", commit.committer));
    payload.push('\n');
    payload.push_str(&commit.message);
    payload.push('\n');
    payload.into_bytes()
}

/// Decode a commit payload.
pub fn decode_commit(payload: &[u8]) -> Result<Commit> {
    let text = std::str::from_utf8(payload)
        .map_err(|_| RelicError::Malformed("commit payload is not UTF-8".to_string()))?;

    let mut tree = None;
    let mut parents = Vec::new();
    let mut author = String::new();
    let mut committer = String::new();
    let mut lines = text.lines();

    for line in lines.by_ref() {
        if line.is_empty() {
            break;
        }
        if let Some(rest) = line.strip_prefix("tree ") {
            tree = Some(ObjectId::from_hex(rest)?);
        } else if let Some(rest) = line.strip_prefix("parent ") {
            parents.push(ObjectId::from_hex(rest)?);
        } else if let Some(rest) = line.strip_prefix("author ") {
            author = rest.to_string();
        } else if let Some(rest) = line.strip_prefix("committer ") {
            committer = rest.to_string();
        } else {
            return Err(RelicError::Malformed(format!(
                "unexpected commit header line: {:?}",
                line
            )));
        }
    }

    let message = lines.collect::<Vec<_>>().join("\n");
    let tree = tree
        .ok_or_else(|| RelicError::Malformed("commit has no tree line".to_string()))?;

    Ok(Commit {
        tree,
        parents,
        author,
        committer,
        message,
    })
}
