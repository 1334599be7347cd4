//! Relic: a minimal content-addressed version-control engine.
//!
//! Three layers: an append-only object store keyed by digest, a Merkle
//! integrity/diff layer where hash equality substitutes for content
//! comparison, and a merge engine reconciling two branch snapshots by
//! path. The [`repo::Repository`] session ties them together for the
//! CLI in `src/bin/relic.rs`.

/// Name of the repository control directory.
pub const CONTROL_DIR: &str = ".relic";

pub mod cli;
pub mod config;
pub mod error;
pub mod hash;
pub mod index;
pub mod lock;
pub mod logging;
pub mod merge;
pub mod merkle;
pub mod objects;
pub mod refs;
pub mod repo;
pub mod stash;
pub mod store;
pub mod verify;
pub mod workdir;

pub use error::{RelicError, Result};
pub use hash::ObjectId;
pub use repo::Repository;
