//! Content-addressed object store
//!
//! Append-only storage of typed objects under a two-level directory keyed
//! by digest prefix: `objects/<hex[0:2]>/<hex[2:]>`. Objects are immutable
//! once written and deduplicated by digest; writing identical content
//! twice is a no-op.

use crate::error::{RelicError, Result};
use crate::hash::{hash_bytes, ObjectId};
use crate::objects::{self, Commit, ObjectKind, TreeEntry};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Handle on an on-disk object database.
pub struct ObjectStore {
    objects_dir: PathBuf,
}

impl ObjectStore {
    /// Open the store rooted at `<control_dir>/objects`.
    pub fn new(control_dir: &Path) -> Self {
        Self {
            objects_dir: control_dir.join("objects"),
        }
    }

    /// Path of the object file for a digest.
    pub fn object_path(&self, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        self.objects_dir.join(&hex[..2]).join(&hex[2..])
    }

    /// Serialize a payload with its header, write it, and return its digest.
    ///
    /// The digest covers the entire serialized buffer, header included. If
    /// the target file already exists the write is skipped and the digest
    /// returned unchanged. Writes go through a temporary file and rename so
    /// a reader never observes a partially-written object.
    pub fn put(&self, kind: ObjectKind, payload: &[u8]) -> Result<ObjectId> {
        let raw = objects::serialize(kind, payload);
        let id = hash_bytes(&raw);
        let path = self.object_path(&id);

        if path.exists() {
            trace!(id = %id, "object already stored, skipping write");
            return Ok(id);
        }

        let dir = path
            .parent()
            .expect("object path always has a fan-out parent");
        fs::create_dir_all(dir)?;

        let temp_path = dir.join(format!("{}.tmp", std::process::id()));
        fs::write(&temp_path, &raw)?;
        fs::rename(&temp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            RelicError::Io(e)
        })?;

        debug!(id = %id, kind = kind.tag(), bytes = raw.len(), "stored object");
        Ok(id)
    }

    /// Read the raw serialized bytes of an object (header included).
    pub fn get(&self, id: &ObjectId) -> Result<Vec<u8>> {
        let path = self.object_path(id);
        if !path.exists() {
            return Err(RelicError::NotFound(format!("object {}", id)));
        }
        Ok(fs::read(&path)?)
    }

    /// Whether an object with this digest is present.
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.object_path(id).exists()
    }

    /// Read a blob's content (payload without header).
    pub fn get_blob(&self, id: &ObjectId) -> Result<Vec<u8>> {
        let raw = self.get(id)?;
        let (kind, payload) = objects::parse_header(&raw)?;
        if kind != ObjectKind::Blob {
            return Err(RelicError::Malformed(format!(
                "object {} is a {}, expected blob",
                id,
                kind.tag()
            )));
        }
        Ok(payload.to_vec())
    }

    /// Read and decode a tree object.
    pub fn get_tree(&self, id: &ObjectId) -> Result<Vec<TreeEntry>> {
        let raw = self.get(id)?;
        let (kind, payload) = objects::parse_header(&raw)?;
        if kind != ObjectKind::Tree {
            return Err(RelicError::Malformed(format!(
                "object {} is a {}, expected tree",
                id,
                kind.tag()
            )));
        }
        objects::decode_tree(payload)
    }

    /// Read and decode a commit object.
    pub fn get_commit(&self, id: &ObjectId) -> Result<Commit> {
        let raw = self.get(id)?;
        let (kind, payload) = objects::parse_header(&raw)?;
        if kind != ObjectKind::Commit {
            return Err(RelicError::Malformed(format!(
                "object {} is a {}, expected commit",
                id,
                kind.tag()
            )));
        }
        objects::decode_commit(payload)
    }

    /// Hash a working-tree file and store it as a blob.
    pub fn put_file_as_blob(&self, file_path: &Path) -> Result<ObjectId> {
        let content = fs::read(file_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RelicError::NotFound(format!("file {}", file_path.display()))
            } else {
                RelicError::Io(e)
            }
        })?;
        self.put(ObjectKind::Blob, &content)
    }

    /// Compute a file's blob digest without writing anything.
    pub fn file_blob_id(file_path: &Path) -> Result<ObjectId> {
        let content = fs::read(file_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RelicError::NotFound(format!("file {}", file_path.display()))
            } else {
                RelicError::Io(e)
            }
        })?;
        Ok(hash_bytes(&objects::serialize(ObjectKind::Blob, &content)))
    }
}
