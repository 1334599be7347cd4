//! CLI parse: clap types for relic. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Relic CLI - content-addressed version control
#[derive(Parser)]
#[command(name = "relic")]
#[command(about = "Content-addressed version control with Merkle-tree verification")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Working directory holding the repository
    #[arg(long, default_value = ".")]
    pub workdir: PathBuf,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an empty repository
    Init,
    /// Stage a file, a directory subtree, or `.` for everything
    Add {
        /// Path to stage, relative to the working directory
        path: String,
    },
    /// Record the staged snapshot as a commit
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,
    },
    /// Show staged, unstaged, and untracked changes
    Status,
    /// Show first-parent history from HEAD
    Log {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List branches, or create one at the current tip
    Branch {
        /// Branch to create (omit to list)
        name: Option<String>,
    },
    /// Switch to a branch, updating the working directory
    Switch {
        /// Branch name
        branch: String,
    },
    /// Check out a branch or a commit digest (detaches HEAD)
    Checkout {
        /// Branch name or 40-hex commit digest
        refspec: String,
    },
    /// Merge a branch into the current one
    Merge {
        /// Branch to merge in
        branch: String,
    },
    /// Shelve and restore staged changes
    Stash {
        #[command(subcommand)]
        command: StashCommands,
    },
    /// Build a Merkle tree and verify its structural hash
    VerifyTree {
        /// Build from the live working directory
        #[arg(long)]
        working_dir: bool,
        /// Tree object digest to build from instead
        hash: Option<String>,
    },
    /// Structural diff between two stored trees, or a commit against the
    /// working directory
    DiffTree {
        /// Diff the working directory against a commit digest
        #[arg(long)]
        working_dir: bool,
        /// First tree digest, or the commit digest with --working-dir
        a: String,
        /// Second tree digest (omit with --working-dir)
        b: Option<String>,
    },
    /// Re-derive and check every digest on the first-parent chain
    VerifyIntegrity,
    /// Compare two branches by Merkle root
    CompareBranches {
        /// First branch
        branch_a: String,
        /// Second branch
        branch_b: String,
    },
    /// Hash a file into the object store
    HashObject {
        /// File path, relative to the working directory
        file: String,
    },
    /// Print a stored object's payload
    CatFile {
        /// 40-hex object digest
        hash: String,
    },
}

#[derive(Subcommand)]
pub enum StashCommands {
    /// Save the staged entries and clear them from the working tree
    Save,
    /// Restore the newest stash entry and drop it
    Pop,
    /// List stash entries, newest first
    List,
}
