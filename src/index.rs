//! Index (staging area)
//!
//! Ordered mapping of path to (mode, blob digest), persisted as one line
//! per entry sorted by path: `"<mode> <digest> <path>\n"`. Sorted, unique
//! paths guarantee that the same file set always serializes to the same
//! tree bytes regardless of insertion order.
//!
//! There is no read-through cache here: the repository session owns the
//! in-memory copy and every mutating call persists in the same step, so a
//! read immediately following a write always observes the write.

use crate::error::{RelicError, Result};
use crate::hash::ObjectId;
use crate::objects::{TreeEntry, MODE_FILE};
use crate::store::ObjectStore;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One staged entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub mode: String,
    pub blob: ObjectId,
}

/// The staging area: sorted path → entry mapping plus its on-disk home.
#[derive(Debug)]
pub struct Index {
    path: PathBuf,
    entries: BTreeMap<String, IndexEntry>,
}

impl Index {
    /// Load the index from `<control_dir>/index`.
    ///
    /// An absent file yields an empty mapping, not an error.
    pub fn load(control_dir: &Path) -> Result<Self> {
        let path = control_dir.join("index");
        let mut entries = BTreeMap::new();

        if path.exists() {
            let text = fs::read_to_string(&path)?;
            for line in text.lines() {
                if line.is_empty() {
                    continue;
                }
                let mut parts = line.splitn(3, ' ');
                let (mode, hash, filepath) = match (parts.next(), parts.next(), parts.next()) {
                    (Some(m), Some(h), Some(p)) => (m, h, p),
                    _ => {
                        return Err(RelicError::Malformed(format!(
                            "invalid index line: {:?}",
                            line
                        )))
                    }
                };
                entries.insert(
                    filepath.to_string(),
                    IndexEntry {
                        mode: mode.to_string(),
                        blob: ObjectId::from_hex(hash)?,
                    },
                );
            }
        }

        Ok(Self { path, entries })
    }

    /// Persist the current mapping, sorted by path, atomically.
    pub fn save(&self) -> Result<()> {
        let mut text = String::new();
        for (filepath, entry) in &self.entries {
            text.push_str(&format!("{} {} {}\n", entry.mode, entry.blob, filepath));
        }

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, text)?;
        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            RelicError::Io(e)
        })?;

        debug!(entries = self.entries.len(), "saved index");
        Ok(())
    }

    /// Stage a working-tree file: hash it into the store and upsert the
    /// entry, persisting immediately.
    ///
    /// Fails with `NotFound` if the path does not exist on disk.
    pub fn stage(&mut self, workdir: &Path, rel_path: &str, store: &ObjectStore) -> Result<ObjectId> {
        let file = workdir.join(rel_path);
        let blob = store.put_file_as_blob(&file)?;
        self.entries.insert(
            rel_path.to_string(),
            IndexEntry {
                mode: MODE_FILE.to_string(),
                blob,
            },
        );
        self.save()?;
        Ok(blob)
    }

    /// Replace the whole mapping and persist.
    pub fn replace(&mut self, entries: BTreeMap<String, IndexEntry>) -> Result<()> {
        self.entries = entries;
        self.save()
    }

    /// Empty both the persisted and in-memory representations.
    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.save()
    }

    pub fn get(&self, rel_path: &str) -> Option<&IndexEntry> {
        self.entries.get(rel_path)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate entries in sorted path order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &IndexEntry)> {
        self.entries.iter()
    }

    /// Snapshot of the mapping, for callers that rewrite it wholesale.
    pub fn entries(&self) -> BTreeMap<String, IndexEntry> {
        self.entries.clone()
    }

    /// Tree entries in index order, ready for tree serialization.
    pub fn to_tree_entries(&self) -> Vec<TreeEntry> {
        self.entries
            .iter()
            .map(|(path, entry)| TreeEntry {
                mode: entry.mode.clone(),
                path: path.clone(),
                blob: entry.blob,
            })
            .collect()
    }
}
