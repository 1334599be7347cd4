//! Repository lock
//!
//! A scoped advisory lock file under the control directory, held for the
//! duration of any mutating command, so two concurrently-run commands
//! cannot interleave writes to refs or the index. The guard removes the
//! file on drop. A lock whose recorded process is no longer alive is
//! treated as stale, removed, and acquisition retried once.

use crate::error::{RelicError, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

const LOCK_FILE: &str = "lock";

/// Lock file payload: enough to identify the holder.
#[derive(Serialize, Deserialize)]
struct LockContent {
    pid: u32,
    acquired_at: u64,
}

/// Guard for the repository-wide exclusive lock.
pub struct RepoLock {
    path: PathBuf,
}

impl RepoLock {
    /// Acquire the lock, failing with `InvalidState` if another live
    /// process holds it.
    pub fn acquire(control_dir: &Path) -> Result<Self> {
        Self::acquire_inner(control_dir, true)
    }

    fn acquire_inner(control_dir: &Path, retry_on_stale: bool) -> Result<Self> {
        let path = control_dir.join(LOCK_FILE);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                let content = LockContent {
                    pid: std::process::id(),
                    acquired_at: std::time::SystemTime::now()
                        .duration_since(std::time::UNIX_EPOCH)
                        .map(|d| d.as_secs())
                        .unwrap_or(0),
                };
                let payload = serde_json::to_string(&content).map_err(|e| {
                    RelicError::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
                })?;
                file.write_all(payload.as_bytes())?;
                file.sync_all()?;
                Ok(Self { path })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                if retry_on_stale && is_stale(&path) {
                    warn!("removing stale repository lock");
                    let _ = fs::remove_file(&path);
                    return Self::acquire_inner(control_dir, false);
                }
                Err(RelicError::InvalidState(format!(
                    "repository is locked by another process ({})",
                    holder_description(&path)
                )))
            }
            Err(e) => Err(RelicError::Io(e)),
        }
    }
}

impl Drop for RepoLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn read_content(path: &Path) -> Option<LockContent> {
    let text = fs::read_to_string(path).ok()?;
    serde_json::from_str(&text).ok()
}

fn holder_description(path: &Path) -> String {
    match read_content(path) {
        Some(content) => format!("pid {}", content.pid),
        None => "unknown holder".to_string(),
    }
}

fn is_stale(path: &Path) -> bool {
    match read_content(path) {
        Some(content) => !process_alive(content.pid),
        // Unreadable lock content means a torn write; treat as stale.
        None => true,
    }
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    // Without a /proc filesystem we cannot tell; assume alive.
    if !Path::new("/proc").exists() {
        return true;
    }
    Path::new(&format!("/proc/{}", pid)).exists()
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    true
}
