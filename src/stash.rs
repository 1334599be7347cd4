//! Stash persistence
//!
//! Stash entries live under `<control>/stash/<id>` in the same line
//! format as the index. Identifiers are `<zero-padded unix secs>-<seq>`;
//! the sequence number is bumped until the path is free, so two saves in
//! the same second still get distinct, ordered identifiers.

use crate::error::{RelicError, Result};
use crate::hash::ObjectId;
use crate::index::IndexEntry;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Handle on the stash area.
pub struct StashStore {
    stash_dir: PathBuf,
}

impl StashStore {
    pub fn new(control_dir: &Path) -> Self {
        Self {
            stash_dir: control_dir.join("stash"),
        }
    }

    /// Persist a staged mapping as a new stash entry and return its id.
    pub fn save(&self, entries: &BTreeMap<String, IndexEntry>) -> Result<String> {
        fs::create_dir_all(&self.stash_dir)?;

        let id = self.next_id()?;
        let mut text = String::new();
        for (path, entry) in entries {
            text.push_str(&format!("{} {} {}\n", entry.mode, entry.blob, path));
        }

        let final_path = self.stash_dir.join(&id);
        let temp_path = self.stash_dir.join(format!("{}.tmp", id));
        fs::write(&temp_path, text)?;
        fs::rename(&temp_path, &final_path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            RelicError::Io(e)
        })?;

        debug!(id = %id, entries = entries.len(), "saved stash entry");
        Ok(id)
    }

    /// Read a stash entry back into a mapping.
    pub fn read(&self, id: &str) -> Result<BTreeMap<String, IndexEntry>> {
        let path = self.stash_dir.join(id);
        if !path.exists() {
            return Err(RelicError::NotFound(format!("stash entry {}", id)));
        }
        let text = fs::read_to_string(&path)?;
        let mut entries = BTreeMap::new();
        for line in text.lines() {
            if line.is_empty() {
                continue;
            }
            let mut parts = line.splitn(3, ' ');
            let (mode, hash, filepath) = match (parts.next(), parts.next(), parts.next()) {
                (Some(m), Some(h), Some(p)) => (m, h, p),
                _ => {
                    return Err(RelicError::Malformed(format!(
                        "invalid stash line: {:?}",
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
        Ok(entries)
    }

    /// Identifier of the most recent entry, if any.
    pub fn latest(&self) -> Result<Option<String>> {
        Ok(self.list()?.into_iter().next())
    }

    /// All entry identifiers, newest first.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        if self.stash_dir.exists() {
            for entry in fs::read_dir(&self.stash_dir)? {
                let entry = entry?;
                if entry.file_type()?.is_file() {
                    ids.push(entry.file_name().to_string_lossy().to_string());
                }
            }
        }
        // Zero-padded ids sort lexicographically by age; newest first.
        ids.sort_by(|a, b| b.cmp(a));
        Ok(ids)
    }

    /// Remove a stash entry.
    pub fn drop_entry(&self, id: &str) -> Result<()> {
        let path = self.stash_dir.join(id);
        if !path.exists() {
            return Err(RelicError::NotFound(format!("stash entry {}", id)));
        }
        fs::remove_file(&path)?;
        Ok(())
    }

    fn next_id(&self) -> Result<String> {
        let secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let mut seq = 0u32;
        loop {
            let id = format!("{:010}-{:03}", secs, seq);
            if !self.stash_dir.join(&id).exists() {
                return Ok(id);
            }
            seq += 1;
            if seq > 999 {
                return Err(RelicError::InvalidState(
                    "exhausted stash identifiers for this second".to_string(),
                ));
            }
        }
    }
}
