//! CLI route: single route table dispatching to the repository session.

use crate::cli::parse::{Commands, StashCommands};
use crate::error::{RelicError, Result};
use crate::repo::Repository;
use std::path::PathBuf;
use tracing::debug;

/// Runtime context for CLI execution: just the working directory; a fresh
/// repository session is opened per command.
pub struct RunContext {
    workdir: PathBuf,
}

impl RunContext {
    pub fn new(workdir: PathBuf) -> Self {
        Self { workdir }
    }

    fn open(&self) -> Result<Repository> {
        Repository::open(&self.workdir)
    }

    /// Execute a CLI command, returning its stdout text.
    pub fn execute(&self, command: &Commands) -> Result<String> {
        debug!(workdir = %self.workdir.display(), "executing command");
        match command {
            Commands::Init => {
                Repository::init(&self.workdir)?;
                Ok(format!(
                    "Initialized empty repository in {}\n",
                    self.workdir.join(crate::CONTROL_DIR).display()
                ))
            }
            Commands::Add { path } => {
                let mut repo = self.open()?;
                let staged = repo.add(path)?;
                let mut out = String::new();
                for path in &staged {
                    out.push_str(&format!("added {}\n", path));
                }
                Ok(out)
            }
            Commands::Commit { message } => {
                let mut repo = self.open()?;
                let id = repo.commit(message)?;
                Ok(format!("[{}] {}\n", id.short(), message))
            }
            Commands::Status => self.open()?.status(),
            Commands::Log { format } => {
                let repo = self.open()?;
                match format.as_str() {
                    "json" => repo.log_json(),
                    "text" => repo.log(),
                    other => Err(RelicError::InvalidState(format!(
                        "unknown log format {:?} (expected text or json)",
                        other
                    ))),
                }
            }
            Commands::Branch { name } => match name {
                Some(name) => {
                    let repo = self.open()?;
                    let tip = repo.create_branch(name)?;
                    Ok(format!("branch '{}' created at {}\n", name, tip.short()))
                }
                None => self.open()?.branch_list(),
            },
            Commands::Switch { branch } => {
                let mut repo = self.open()?;
                repo.switch(branch)?;
                Ok(format!("Switched to branch '{}'\n", branch))
            }
            Commands::Checkout { refspec } => self.open()?.checkout(refspec),
            Commands::Merge { branch } => {
                let mut repo = self.open()?;
                match repo.merge(branch) {
                    Ok(id) => Ok(format!("Merge successful: {}\n", id)),
                    // Conflicts are a reported outcome, not a process
                    // failure; the index and working tree hold the markers.
                    Err(RelicError::Conflict(paths)) => {
                        let mut out = String::from("Merge conflicts in:\n");
                        for path in &paths {
                            out.push_str(&format!("\t{}\n", path));
                        }
                        out.push_str("resolve the conflicts and commit the result\n");
                        Ok(out)
                    }
                    Err(e) => Err(e),
                }
            }
            Commands::Stash { command } => {
                let mut repo = self.open()?;
                match command {
                    StashCommands::Save => {
                        let id = repo.stash_save()?;
                        Ok(format!("saved stash {}\n", id))
                    }
                    StashCommands::Pop => {
                        let id = repo.stash_pop()?;
                        Ok(format!("popped stash {}\n", id))
                    }
                    StashCommands::List => repo.stash_list(),
                }
            }
            Commands::VerifyTree { working_dir, hash } => {
                let repo = self.open()?;
                match (working_dir, hash) {
                    (true, None) => repo.verify_working_tree(),
                    (false, Some(hash)) => repo.verify_tree_object(hash),
                    _ => Err(RelicError::InvalidState(
                        "pass either --working-dir or a tree digest".to_string(),
                    )),
                }
            }
            Commands::DiffTree { working_dir, a, b } => {
                let repo = self.open()?;
                match (working_dir, b) {
                    (false, Some(b)) => repo.diff_trees(a, b),
                    (true, None) => repo.diff_workdir_against_commit(a),
                    _ => Err(RelicError::InvalidState(
                        "pass two tree digests, or --working-dir and a commit digest".to_string(),
                    )),
                }
            }
            Commands::VerifyIntegrity => {
                let report = self.open()?.verify_integrity()?;
                Ok(format!(
                    "verified {} commit(s), {} object(s): OK\n",
                    report.commits_checked, report.objects_checked
                ))
            }
            Commands::CompareBranches { branch_a, branch_b } => {
                self.open()?.compare_branches(branch_a, branch_b)
            }
            Commands::HashObject { file } => {
                let id = self.open()?.hash_object(file)?;
                Ok(format!("{}\n", id))
            }
            Commands::CatFile { hash } => self.open()?.cat_file(hash),
        }
    }
}
