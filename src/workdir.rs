//! Working-directory file lister
//!
//! A collaborator, not core: enumerates tracked-candidate files under the
//! repository root, honoring `.relicignore` prefix patterns and always
//! excluding the control directory. Output is sorted by path for
//! determinism.

use crate::error::Result;
use crate::CONTROL_DIR;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Name of the ignore file read from the repository root.
pub const IGNORE_FILE: &str = ".relicignore";

/// List regular files under `root` as repository-relative paths, sorted.
///
/// A path is skipped when it starts with the control directory or with
/// any pattern listed in `.relicignore` (one prefix per line).
pub fn list_files(root: &Path) -> Result<Vec<String>> {
    let patterns = load_ignore_patterns(root)?;
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("failed to walk working directory: {}", e),
            )
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");

        if rel.starts_with(CONTROL_DIR) {
            continue;
        }
        if patterns.iter().any(|p| rel.starts_with(p.as_str())) {
            continue;
        }
        files.push(rel);
    }

    files.sort();
    Ok(files)
}

fn load_ignore_patterns(root: &Path) -> Result<Vec<String>> {
    let path = root.join(IGNORE_FILE);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(&path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}
