//! Reference resolver
//!
//! Resolves HEAD and branch names to commit digests and tracks the
//! attached/detached state. HEAD is either symbolic
//! (`"ref: refs/heads/<name>\n"`) or detached (a literal digest). A branch
//! named in HEAD that has no ref file yet is unborn: the state of a fresh
//! repository before its first commit.

use crate::error::{RelicError, Result};
use crate::hash::ObjectId;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const SYMBOLIC_PREFIX: &str = "ref: ";
const HEADS_NAMESPACE: &str = "refs/heads/";

/// Where HEAD currently points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadState {
    /// Attached to a branch that has at least one commit.
    OnBranch(String),
    /// Pointing at a literal commit digest.
    Detached(ObjectId),
    /// Attached to a branch with no commits yet.
    Unborn(String),
}

/// Handle on the refs area of a repository control directory.
pub struct RefStore {
    control_dir: PathBuf,
}

impl RefStore {
    pub fn new(control_dir: &Path) -> Self {
        Self {
            control_dir: control_dir.to_path_buf(),
        }
    }

    fn head_path(&self) -> PathBuf {
        self.control_dir.join("HEAD")
    }

    fn heads_dir(&self) -> PathBuf {
        self.control_dir.join("refs").join("heads")
    }

    fn branch_path(&self, name: &str) -> PathBuf {
        self.heads_dir().join(name)
    }

    /// Resolve a ref path relative to the control dir (e.g.
    /// `refs/heads/main`) to a digest, or `None` if the ref is absent.
    pub fn resolve_ref(&self, ref_path: &str) -> Result<Option<ObjectId>> {
        let path = self.control_dir.join(ref_path);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)?;
        let line = text.lines().next().unwrap_or("").trim();
        if line.is_empty() {
            return Ok(None);
        }
        Ok(Some(ObjectId::from_hex(line)?))
    }

    /// Resolve a branch name to its tip commit.
    pub fn branch_tip(&self, name: &str) -> Result<Option<ObjectId>> {
        self.resolve_ref(&format!("{}{}", HEADS_NAMESPACE, name))
    }

    /// Whether a branch ref exists.
    pub fn branch_exists(&self, name: &str) -> bool {
        self.branch_path(name).exists()
    }

    /// The current HEAD state.
    pub fn head_state(&self) -> Result<HeadState> {
        let path = self.head_path();
        if !path.exists() {
            return Err(RelicError::NotFound("HEAD".to_string()));
        }
        let text = fs::read_to_string(&path)?;
        let line = text.lines().next().unwrap_or("").trim();

        if let Some(ref_path) = line.strip_prefix(SYMBOLIC_PREFIX) {
            let name = ref_path
                .strip_prefix(HEADS_NAMESPACE)
                .unwrap_or(ref_path)
                .to_string();
            match self.resolve_ref(ref_path)? {
                Some(_) => Ok(HeadState::OnBranch(name)),
                None => Ok(HeadState::Unborn(name)),
            }
        } else {
            Ok(HeadState::Detached(ObjectId::from_hex(line)?))
        }
    }

    /// The commit HEAD ultimately points at, or `None` before any commit.
    pub fn head_commit(&self) -> Result<Option<ObjectId>> {
        match self.head_state()? {
            HeadState::OnBranch(name) => self.branch_tip(&name),
            HeadState::Detached(id) => Ok(Some(id)),
            HeadState::Unborn(_) => Ok(None),
        }
    }

    /// Name of the current branch, or `None` when detached.
    pub fn current_branch(&self) -> Result<Option<String>> {
        match self.head_state()? {
            HeadState::OnBranch(name) | HeadState::Unborn(name) => Ok(Some(name)),
            HeadState::Detached(_) => Ok(None),
        }
    }

    /// Attach HEAD to a branch name.
    pub fn set_head_to_branch(&self, name: &str) -> Result<()> {
        self.write_atomic(
            &self.head_path(),
            &format!("{}{}{}\n", SYMBOLIC_PREFIX, HEADS_NAMESPACE, name),
        )
    }

    /// Detach HEAD at a literal commit digest.
    pub fn set_head_detached(&self, id: &ObjectId) -> Result<()> {
        self.write_atomic(&self.head_path(), &format!("{}\n", id))
    }

    /// Advance a branch ref to a new tip.
    pub fn advance_branch(&self, name: &str, id: &ObjectId) -> Result<()> {
        fs::create_dir_all(self.heads_dir())?;
        self.write_atomic(&self.branch_path(name), &format!("{}\n", id))?;
        debug!(branch = name, tip = %id, "advanced branch ref");
        Ok(())
    }

    /// Create a new branch at the current tip without moving HEAD.
    ///
    /// Fails if the name is taken or there is no commit to point at yet.
    pub fn create_branch(&self, name: &str) -> Result<ObjectId> {
        if self.branch_exists(name) {
            return Err(RelicError::InvalidState(format!(
                "branch '{}' already exists",
                name
            )));
        }
        let tip = self.head_commit()?.ok_or_else(|| {
            RelicError::InvalidState("no commits yet, cannot create branch".to_string())
        })?;
        self.advance_branch(name, &tip)?;
        Ok(tip)
    }

    /// List branch names, sorted.
    pub fn list_branches(&self) -> Result<Vec<String>> {
        let dir = self.heads_dir();
        let mut names = Vec::new();
        if dir.exists() {
            for entry in fs::read_dir(&dir)? {
                let entry = entry?;
                if entry.file_type()?.is_file() {
                    names.push(entry.file_name().to_string_lossy().to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Crash-safe single-file write: temp file in the same directory, then
    /// rename over the target.
    fn write_atomic(&self, path: &Path, content: &str) -> Result<()> {
        let dir = path
            .parent()
            .ok_or_else(|| RelicError::InvalidState(format!("bad ref path {:?}", path)))?;
        let temp_path = dir.join(format!(
            ".{}.tmp",
            path.file_name().unwrap_or_default().to_string_lossy()
        ));
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            RelicError::Io(e)
        })?;
        Ok(())
    }
}
