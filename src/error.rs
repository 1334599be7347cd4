//! Error types for the relic version-control engine.

use thiserror::Error;

/// Engine-wide error taxonomy.
///
/// Every command-level operation either completes fully or leaves no new
/// partial state; lower-level failures surface here with enough context
/// (digest, path) to report precisely.
#[derive(Debug, Error)]
pub enum RelicError {
    /// Missing object, ref, branch, or working-tree file.
    #[error("not found: {0}")]
    NotFound(String),

    /// Header or parse failure on a stored object or index line.
    #[error("malformed: {0}")]
    Malformed(String),

    /// Merge produced divergent content on the listed paths.
    #[error("merge conflicts in {} path(s)", .0.len())]
    Conflict(Vec<String>),

    /// Operation not valid in the current repository state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Filesystem failure reading or writing storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Common result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RelicError>;
