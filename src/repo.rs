//! Repository session
//!
//! One `Repository` value per command invocation: it owns the object
//! store, ref store, index, stash, and configuration for a single
//! working directory. Mutating operations take the repository-wide lock
//! for their duration and persist through the owned index, so every
//! read in the same session observes prior writes.

use crate::config::{ConfigLoader, RelicConfig};
use crate::error::{RelicError, Result};
use crate::hash::ObjectId;
use crate::index::{Index, IndexEntry};
use crate::lock::RepoLock;
use crate::merge;
use crate::merkle;
use crate::objects::{encode_commit, encode_tree, Commit, ObjectKind};
use crate::refs::{HeadState, RefStore};
use crate::stash::StashStore;
use crate::store::ObjectStore;
use crate::verify::{self, IntegrityReport};
use crate::workdir;
use crate::CONTROL_DIR;
use chrono::{TimeZone, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// An open repository rooted at a working directory.
pub struct Repository {
    root: PathBuf,
    control_dir: PathBuf,
    config: RelicConfig,
    store: ObjectStore,
    refs: RefStore,
    index: Index,
    stash: StashStore,
}

impl Repository {
    /// Create a fresh repository under `root`.
    ///
    /// Lays out the control directory (objects, refs, stash) and points
    /// HEAD at the configured default branch, unborn until the first
    /// commit. Fails if a repository already exists here.
    pub fn init(root: &Path) -> Result<Self> {
        let control_dir = root.join(CONTROL_DIR);
        if control_dir.exists() {
            return Err(RelicError::InvalidState(format!(
                "repository already initialized at {}",
                control_dir.display()
            )));
        }
        fs::create_dir_all(control_dir.join("objects"))?;
        fs::create_dir_all(control_dir.join("refs").join("heads"))?;
        fs::create_dir_all(control_dir.join("refs").join("tags"))?;
        fs::create_dir_all(control_dir.join("stash"))?;

        let config = ConfigLoader::load(&control_dir)?;
        let refs = RefStore::new(&control_dir);
        refs.set_head_to_branch(&config.core.default_branch)?;

        info!(root = %root.display(), "initialized repository");
        Self::open(root)
    }

    /// Open an existing repository rooted at `root`.
    pub fn open(root: &Path) -> Result<Self> {
        let control_dir = root.join(CONTROL_DIR);
        if !control_dir.exists() {
            return Err(RelicError::NotFound(format!(
                "no repository at {} (run init first)",
                root.display()
            )));
        }
        let config = ConfigLoader::load(&control_dir)?;
        Ok(Self {
            root: root.to_path_buf(),
            store: ObjectStore::new(&control_dir),
            refs: RefStore::new(&control_dir),
            index: Index::load(&control_dir)?,
            stash: StashStore::new(&control_dir),
            control_dir,
            config,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn refs(&self) -> &RefStore {
        &self.refs
    }

    /// Author/committer line value: identity plus current timestamp.
    fn signature(&self) -> String {
        format!("{} {} +0000", self.config.identity(), Utc::now().timestamp())
    }

    /// Stage a file, a directory subtree, or `.` for everything.
    ///
    /// Returns the staged paths in sorted order.
    pub fn add(&mut self, spec: &str) -> Result<Vec<String>> {
        let _lock = RepoLock::acquire(&self.control_dir)?;

        let spec = spec.trim_end_matches('/');
        let paths: Vec<String> = if spec == "." {
            workdir::list_files(&self.root)?
        } else if self.root.join(spec).is_dir() {
            let prefix = format!("{}/", spec);
            workdir::list_files(&self.root)?
                .into_iter()
                .filter(|p| p.starts_with(&prefix))
                .collect()
        } else {
            vec![spec.to_string()]
        };

        if paths.is_empty() {
            return Err(RelicError::NotFound(format!("nothing to add under {:?}", spec)));
        }
        for path in &paths {
            self.index.stage(&self.root, path, &self.store)?;
        }
        debug!(count = paths.len(), "staged paths");
        Ok(paths)
    }

    /// Record the index as a commit, advancing the current branch (or
    /// HEAD itself when detached).
    pub fn commit(&mut self, message: &str) -> Result<ObjectId> {
        let _lock = RepoLock::acquire(&self.control_dir)?;

        if self.index.is_empty() {
            return Err(RelicError::InvalidState("nothing to commit".to_string()));
        }

        let tree = self
            .store
            .put(ObjectKind::Tree, &encode_tree(&self.index.to_tree_entries()))?;
        let signature = self.signature();
        let commit = Commit {
            tree,
            parents: self.refs.head_commit()?.map(|p| vec![p]).unwrap_or_default(),
            author: signature.clone(),
            committer: signature,
            message: message.to_string(),
        };
        let commit_id = self.store.put(ObjectKind::Commit, &encode_commit(&commit))?;

        match self.refs.head_state()? {
            HeadState::OnBranch(name) | HeadState::Unborn(name) => {
                self.refs.advance_branch(&name, &commit_id)?;
            }
            HeadState::Detached(_) => {
                self.refs.set_head_detached(&commit_id)?;
            }
        }

        info!(commit = %commit_id, "created commit");
        Ok(commit_id)
    }

    /// Flat path → entry snapshot of the tree behind a commit.
    fn snapshot_of(&self, commit_id: &ObjectId) -> Result<BTreeMap<String, IndexEntry>> {
        let commit = self.store.get_commit(commit_id)?;
        Ok(self
            .store
            .get_tree(&commit.tree)?
            .into_iter()
            .map(|e| {
                (
                    e.path,
                    IndexEntry {
                        mode: e.mode,
                        blob: e.blob,
                    },
                )
            })
            .collect())
    }

    fn head_snapshot(&self) -> Result<BTreeMap<String, IndexEntry>> {
        match self.refs.head_commit()? {
            Some(tip) => self.snapshot_of(&tip),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Human-readable working-tree status.
    pub fn status(&self) -> Result<String> {
        let mut out = String::new();
        match self.refs.head_state()? {
            HeadState::OnBranch(name) => out.push_str(&format!("On branch {}\n", name)),
            HeadState::Unborn(name) => {
                out.push_str(&format!("On branch {}\n\nNo commits yet\n", name))
            }
            HeadState::Detached(id) => {
                out.push_str(&format!("HEAD detached at {}\n", id.short()))
            }
        }

        let head = self.head_snapshot()?;
        let mut staged = Vec::new();
        for (path, entry) in self.index.iter() {
            match head.get(path) {
                None => staged.push(format!("\tnew file:   {}", path)),
                Some(h) if h.blob != entry.blob => {
                    staged.push(format!("\tmodified:   {}", path))
                }
                Some(_) => {}
            }
        }
        for path in head.keys() {
            if self.index.get(path).is_none() {
                staged.push(format!("\tdeleted:    {}", path));
            }
        }

        let mut unstaged = Vec::new();
        for (path, entry) in self.index.iter() {
            let file = self.root.join(path);
            if !file.exists() {
                unstaged.push(format!("\tdeleted:    {}", path));
            } else if ObjectStore::file_blob_id(&file)? != entry.blob {
                unstaged.push(format!("\tmodified:   {}", path));
            }
        }

        let mut untracked = Vec::new();
        for path in workdir::list_files(&self.root)? {
            if self.index.get(&path).is_none() && !head.contains_key(&path) {
                untracked.push(format!("\t{}", path));
            }
        }

        if !staged.is_empty() {
            out.push_str("\nChanges to be committed:\n");
            out.push_str(&staged.join("\n"));
            out.push('\n');
        }
        if !unstaged.is_empty() {
            out.push_str("\nChanges not staged for commit:\n");
            out.push_str(&unstaged.join("\n"));
            out.push('\n');
        }
        if !untracked.is_empty() {
            out.push_str("\nUntracked files:\n");
            out.push_str(&untracked.join("\n"));
            out.push('\n');
        }
        if staged.is_empty() && unstaged.is_empty() && untracked.is_empty() {
            out.push_str("\nnothing to commit, working tree clean\n");
        }
        Ok(out)
    }

    /// First-parent history listing from HEAD.
    pub fn log(&self) -> Result<String> {
        let mut cursor = self.refs.head_commit()?;
        if cursor.is_none() {
            return Ok("no commits yet\n".to_string());
        }

        let mut out = String::new();
        while let Some(commit_id) = cursor {
            let commit = self.store.get_commit(&commit_id)?;
            out.push_str(&format!("commit {}\n", commit_id));
            let (identity, date) = split_signature(&commit.author);
            out.push_str(&format!("Author: {}\n", identity));
            if let Some(date) = date {
                out.push_str(&format!("Date:   {}\n", date));
            }
            out.push('\n');
            for line in commit.message.lines() {
                out.push_str(&format!("    {}\n", line));
            }
            out.push('\n');
            cursor = commit.first_parent();
        }
        Ok(out)
    }

    /// First-parent history as a JSON array, newest first.
    pub fn log_json(&self) -> Result<String> {
        let mut commits = Vec::new();
        let mut cursor = self.refs.head_commit()?;
        while let Some(commit_id) = cursor {
            let commit = self.store.get_commit(&commit_id)?;
            let (identity, date) = split_signature(&commit.author);
            commits.push(serde_json::json!({
                "commit": commit_id.to_hex(),
                "tree": commit.tree.to_hex(),
                "parents": commit.parents.iter().map(|p| p.to_hex()).collect::<Vec<_>>(),
                "author": identity,
                "date": date,
                "message": commit.message,
            }));
            cursor = commit.first_parent();
        }
        let rendered = serde_json::to_string_pretty(&commits).map_err(|e| {
            RelicError::Malformed(format!("failed to render log as json: {}", e))
        })?;
        Ok(format!("{}\n", rendered))
    }

    /// Branch listing with the current branch marked.
    pub fn branch_list(&self) -> Result<String> {
        let current = self.refs.current_branch()?;
        let mut out = String::new();
        for name in self.refs.list_branches()? {
            if Some(&name) == current.as_ref() {
                out.push_str(&format!("* {}\n", name));
            } else {
                out.push_str(&format!("  {}\n", name));
            }
        }
        if out.is_empty() {
            out.push_str("no branches yet\n");
        }
        Ok(out)
    }

    /// Create a branch at the current tip without moving HEAD.
    pub fn create_branch(&self, name: &str) -> Result<ObjectId> {
        let _lock = RepoLock::acquire(&self.control_dir)?;
        self.refs.create_branch(name)
    }

    /// Switch to a branch, materializing its tree into the working
    /// directory and rewriting the index to match.
    pub fn switch(&mut self, branch: &str) -> Result<()> {
        let _lock = RepoLock::acquire(&self.control_dir)?;
        let tip = self
            .refs
            .branch_tip(branch)?
            .ok_or_else(|| RelicError::NotFound(format!("branch {}", branch)))?;
        let target = self.snapshot_of(&tip)?;
        self.materialize(target)?;
        self.refs.set_head_to_branch(branch)?;
        info!(branch, "switched branch");
        Ok(())
    }

    /// Check out a branch or a literal commit digest (detaching HEAD).
    pub fn checkout(&mut self, refspec: &str) -> Result<String> {
        if self.refs.branch_exists(refspec) {
            self.switch(refspec)?;
            return Ok(format!("Switched to branch '{}'\n", refspec));
        }

        let _lock = RepoLock::acquire(&self.control_dir)?;
        let commit_id = ObjectId::from_hex(refspec)?;
        let target = self.snapshot_of(&commit_id)?;
        self.materialize(target)?;
        self.refs.set_head_detached(&commit_id)?;
        info!(commit = %commit_id, "detached HEAD");
        Ok(format!("HEAD is now at {}\n", commit_id.short()))
    }

    /// Rewrite the working directory and index to a target snapshot.
    ///
    /// Files tracked now but absent from the target are removed; every
    /// target file is written out (parent directories created as needed).
    fn materialize(&mut self, target: BTreeMap<String, IndexEntry>) -> Result<()> {
        let current: Vec<String> = self.index.iter().map(|(p, _)| p.clone()).collect();
        for path in current {
            if !target.contains_key(&path) {
                let file = self.root.join(&path);
                if file.exists() {
                    fs::remove_file(&file)?;
                }
            }
        }
        for (path, entry) in &target {
            let file = self.root.join(path);
            if let Some(parent) = file.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&file, self.store.get_blob(&entry.blob)?)?;
        }
        self.index.replace(target)
    }

    /// Merge a branch into the current one.
    pub fn merge(&mut self, target_branch: &str) -> Result<ObjectId> {
        let _lock = RepoLock::acquire(&self.control_dir)?;
        let signature = self.signature();
        merge::merge_branch(
            &self.root,
            &self.store,
            &self.refs,
            &mut self.index,
            target_branch,
            &signature,
        )
    }

    /// Stash the staged entries: save them, clear the index, and remove
    /// the stashed files from the working tree.
    pub fn stash_save(&mut self) -> Result<String> {
        let _lock = RepoLock::acquire(&self.control_dir)?;
        if self.index.is_empty() {
            return Err(RelicError::InvalidState(
                "no staged changes to stash".to_string(),
            ));
        }
        let entries = self.index.entries();
        let id = self.stash.save(&entries)?;
        for path in entries.keys() {
            let file = self.root.join(path);
            if file.exists() {
                fs::remove_file(&file)?;
            }
        }
        self.index.clear()?;
        info!(id = %id, "stashed staged changes");
        Ok(id)
    }

    /// Restore the newest stash entry and drop it.
    pub fn stash_pop(&mut self) -> Result<String> {
        let _lock = RepoLock::acquire(&self.control_dir)?;
        let id = self
            .stash
            .latest()?
            .ok_or_else(|| RelicError::NotFound("stash entries".to_string()))?;
        let entries = self.stash.read(&id)?;
        for (path, entry) in &entries {
            let file = self.root.join(path);
            if let Some(parent) = file.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&file, self.store.get_blob(&entry.blob)?)?;
        }
        self.index.replace(entries)?;
        self.stash.drop_entry(&id)?;
        info!(id = %id, "popped stash entry");
        Ok(id)
    }

    /// Stash listing, newest first.
    pub fn stash_list(&self) -> Result<String> {
        let ids = self.stash.list()?;
        if ids.is_empty() {
            return Ok("no stash entries\n".to_string());
        }
        let mut out = String::new();
        for (n, id) in ids.iter().enumerate() {
            out.push_str(&format!("stash@{{{}}}: {}\n", n, id));
        }
        Ok(out)
    }

    /// Build and verify a Merkle tree over the live working directory.
    pub fn verify_working_tree(&self) -> Result<String> {
        let tree = merkle::build_from_working_tree(&self.root)?;
        Ok(render_verified_tree(&tree))
    }

    /// Build and verify a Merkle tree from a stored tree object.
    pub fn verify_tree_object(&self, tree_hex: &str) -> Result<String> {
        let tree_id = ObjectId::from_hex(tree_hex)?;
        let tree = merkle::build_from_tree_object(&self.store, &tree_id)?;
        Ok(render_verified_tree(&tree))
    }

    /// Structural diff between two stored tree objects.
    pub fn diff_trees(&self, a_hex: &str, b_hex: &str) -> Result<String> {
        let a = merkle::build_from_tree_object(&self.store, &ObjectId::from_hex(a_hex)?)?;
        let b = merkle::build_from_tree_object(&self.store, &ObjectId::from_hex(b_hex)?)?;
        Ok(render_tree_diff(&a, &b))
    }

    /// Diff a commit's tree against the live working directory.
    ///
    /// The working side is flattened to the single-level shape stored
    /// trees have, so added/deleted/modified read relative to the commit:
    /// `A` is a file present only in the working directory.
    pub fn diff_workdir_against_commit(&self, commit_hex: &str) -> Result<String> {
        let commit = self.store.get_commit(&ObjectId::from_hex(commit_hex)?)?;
        let a = merkle::build_from_tree_object(&self.store, &commit.tree)?;
        let b = merkle::build_flat_from_working_tree(&self.root)?;
        Ok(render_tree_diff(&a, &b))
    }

    /// Compare two branches by Merkle root, listing file-level
    /// differences when they diverge.
    pub fn compare_branches(&self, b1: &str, b2: &str) -> Result<String> {
        let tree_of = |branch: &str| -> Result<merkle::MerkleTree> {
            let tip = self
                .refs
                .branch_tip(branch)?
                .ok_or_else(|| RelicError::NotFound(format!("branch {}", branch)))?;
            let commit = self.store.get_commit(&tip)?;
            merkle::build_from_tree_object(&self.store, &commit.tree)
        };
        let a = tree_of(b1)?;
        let b = tree_of(b2)?;

        let mut out = String::new();
        out.push_str(&format!("{}: {}\n", b1, a.root_digest()));
        out.push_str(&format!("{}: {}\n", b2, b.root_digest()));
        if a.root_digest() == b.root_digest() {
            out.push_str("branches are identical\n");
        } else {
            for (path, kind) in merkle::diff(&a, &b) {
                out.push_str(&format!("{}\t{}\n", kind.letter(), path));
            }
        }
        Ok(out)
    }

    /// Hash a working-tree file into the store, returning its digest.
    pub fn hash_object(&self, file: &str) -> Result<ObjectId> {
        let _lock = RepoLock::acquire(&self.control_dir)?;
        self.store.put_file_as_blob(&self.root.join(file))
    }

    /// Print a stored object's payload. All three kinds carry textual
    /// payloads here (blob content, tree lines, commit headers).
    pub fn cat_file(&self, hex: &str) -> Result<String> {
        let id = ObjectId::from_hex(hex)?;
        let raw = self.store.get(&id)?;
        let (_kind, payload) = crate::objects::parse_header(&raw)?;
        Ok(String::from_utf8_lossy(payload).into_owned())
    }

    /// First-parent integrity walk from HEAD.
    pub fn verify_integrity(&self) -> Result<IntegrityReport> {
        verify::verify_repository(&self.store, &self.refs)
    }
}

/// Render a freshly built tree with its recomputed root and verdict.
fn render_verified_tree(tree: &merkle::MerkleTree) -> String {
    let recomputed = merkle::structural_hash(tree, tree.root_idx());
    let verdict = if merkle::verify(&tree.root_digest(), tree) {
        "OK"
    } else {
        "FAILED"
    };
    format!(
        "{}root: {}\nverification: {}\n",
        tree.render(),
        recomputed,
        verdict
    )
}

/// One `"<letter>\t<path>"` line per change, or the identical-roots fast
/// path with no detailed walk; that is the point of carrying the
/// aggregate digests.
fn render_tree_diff(a: &merkle::MerkleTree, b: &merkle::MerkleTree) -> String {
    if a.root_digest() == b.root_digest() {
        return "trees are identical\n".to_string();
    }
    let mut out = String::new();
    for (path, kind) in merkle::diff(a, b) {
        out.push_str(&format!("{}\t{}\n", kind.letter(), path));
    }
    out
}

/// Split `"Name <email> <secs> +0000"` into identity and formatted date.
fn split_signature(signature: &str) -> (String, Option<String>) {
    let mut parts = signature.rsplitn(3, ' ');
    let tz = parts.next();
    let secs = parts.next().and_then(|s| s.parse::<i64>().ok());
    let identity = parts.next();

    match (identity, secs, tz) {
        (Some(identity), Some(secs), Some(tz)) => {
            if let chrono::LocalResult::Single(when) = Utc.timestamp_opt(secs, 0) {
                let date = format!("{} {}", when.format("%a %b %e %H:%M:%S %Y"), tz);
                return (identity.to_string(), Some(date));
            }
            (signature.to_string(), None)
        }
        _ => (signature.to_string(), None),
    }
}
