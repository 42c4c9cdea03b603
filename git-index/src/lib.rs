//! The staging area: an ordered collection of `(path, stage)`
//! entries supporting conflict stages, editor transactions, and tree
//! materialization. Kept free of a dependency on `git-odb` so it can be
//! tested in isolation; [`TreeWriter`]/[`TreeReader`] are the seams a
//! caller wires up to an actual object store.

#![deny(rust_2018_idioms)]

use std::collections::BTreeMap;

use git_hash::ObjectId;
use git_object::{Mode, TreeEntry};

/// A stage as defined by : 0 is the merged/normal state; 1/2/3 are the
/// base/ours/theirs sides of an unresolved conflict.
pub const STAGE_MERGED: u8 = 0;
pub const STAGE_BASE: u8 = 1;
pub const STAGE_OURS: u8 = 2;
pub const STAGE_THEIRS: u8 = 3;

/// One row of the staging area. `path` is a `/`-separated relative
/// path, stored as raw bytes to match [`TreeEntry::name`]'s representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingEntry {
    pub path: Vec<u8>,
    pub mode: Mode,
    pub id: ObjectId,
    pub stage: u8,
    pub size: Option<u64>,
    pub mtime: Option<i64>,
}

impl StagingEntry {
    fn sort_key(&self) -> (&[u8], u8) {
        (&self.path, self.stage)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `writeTree` was invoked while conflict entries (stage > 0) remained
    /// unresolved.
    #[error("cannot write a tree while paths remain unmerged: {0:?}")]
    UnmergedPaths(Vec<Vec<u8>>),
    #[error(transparent)]
    Store(Box<dyn std::error::Error + Send + Sync>),
}

/// The seam between the staging area and an object store's tree facade;
/// implemented by callers (typically a thin wrapper over
/// `git_odb::Trees`) so this crate never depends on `git-odb` directly.
pub trait TreeWriter {
    type Error: std::error::Error + Send + Sync + 'static;
    fn store_tree(&mut self, entries: Vec<TreeEntry>) -> Result<ObjectId, Self::Error>;
}

pub trait TreeReader {
    type Error: std::error::Error + Send + Sync + 'static;
    fn load_tree(&self, id: &ObjectId) -> Result<Vec<TreeEntry>, Self::Error>;
}

/// The staging area, ordered by `(path, stage)`.
#[derive(Debug, Default)]
pub struct Index {
    entries: Vec<StagingEntry>,
}

impl Index {
    pub fn new() -> Self {
        Index::default()
    }

    pub fn entries(&self) -> &[StagingEntry] {
        &self.entries
    }

    /// The stage-0 entry for `path`, if any (conflict stages are never
    /// returned here; see [`Index::conflict_paths`]).
    pub fn get_entry(&self, path: &[u8]) -> Option<&StagingEntry> {
        self.entries.iter().find(|e| e.stage == STAGE_MERGED && e.path == path)
    }

    pub fn has_conflicts(&self) -> bool {
        self.entries.iter().any(|e| e.stage != STAGE_MERGED)
    }

    /// Every distinct path with at least one conflict-stage row, in
    /// ascending order.
    pub fn conflict_paths(&self) -> Vec<Vec<u8>> {
        let mut paths: Vec<Vec<u8>> = self
            .entries
            .iter()
            .filter(|e| e.stage != STAGE_MERGED)
            .map(|e| e.path.clone())
            .collect();
        paths.dedup();
        paths
    }

    pub fn editor(&mut self) -> Editor<'_> {
        Editor {
            scratch: self.entries.clone(),
            index: self,
        }
    }

    /// Materialize stage-0 entries into a nested tree: group by
    /// path prefix, recursively build subtrees, store each level via
    /// `trees`, and return the root id. Fails with
    /// [`Error::UnmergedPaths`] if any conflict remains.
    pub fn write_tree<W: TreeWriter>(&self, trees: &mut W) -> Result<ObjectId, Error> {
        if self.has_conflicts() {
            return Err(Error::UnmergedPaths(self.conflict_paths()));
        }
        let rows: Vec<(Vec<u8>, &StagingEntry)> = self
            .entries
            .iter()
            .filter(|e| e.stage == STAGE_MERGED)
            .map(|e| (e.path.clone(), e))
            .collect();
        build_subtree(rows, trees)
    }

    /// Replace the current state with the flattened entries of the tree
    /// `id`, recursively walking subtrees via `trees`. All resulting
    /// entries land at stage 0.
    pub fn read_tree<R: TreeReader>(&mut self, trees: &R, id: ObjectId) -> Result<(), Error> {
        let mut out = Vec::new();
        flatten_tree(trees, id, Vec::new(), &mut out)?;
        out.sort_by(|a: &StagingEntry, b: &StagingEntry| a.sort_key().cmp(&b.sort_key()));
        self.entries = out;
        Ok(())
    }
}

/// Groups `rows` by their first `/`-delimited path component, recursing
/// into subgroups with more than one distinct remaining path, and storing
/// each resulting level through `trees`.
fn build_subtree<W: TreeWriter>(rows: Vec<(Vec<u8>, &StagingEntry)>, trees: &mut W) -> Result<ObjectId, Error> {
    let mut groups: BTreeMap<Vec<u8>, Vec<(Vec<u8>, &StagingEntry)>> = BTreeMap::new();
    for (path, entry) in rows {
        match path.iter().position(|&b| b == b'/') {
            Some(slash) => {
                let head = path[..slash].to_vec();
                let rest = path[slash + 1..].to_vec();
                groups.entry(head).or_default().push((rest, entry));
            }
            None => {
                groups.entry(path).or_default().push((Vec::new(), entry));
            }
        }
    }

    let mut tree_entries = Vec::with_capacity(groups.len());
    for (name, children) in groups {
        if children.len() == 1 && children[0].0.is_empty() {
            let entry = children[0].1;
            tree_entries.push(TreeEntry {
                name,
                mode: entry.mode,
                id: entry.id,
            });
        } else {
            let id = build_subtree(children, trees)?;
            tree_entries.push(TreeEntry {
                name,
                mode: Mode::Tree,
                id,
            });
        }
    }
    trees.store_tree(tree_entries).map_err(|e| Error::Store(Box::new(e)))
}

fn flatten_tree<R: TreeReader>(trees: &R, id: ObjectId, prefix: Vec<u8>, out: &mut Vec<StagingEntry>) -> Result<(), Error> {
    let entries = trees.load_tree(&id).map_err(|e| Error::Store(Box::new(e)))?;
    for entry in entries {
        let mut path = prefix.clone();
        if !path.is_empty() {
            path.push(b'/');
        }
        path.extend_from_slice(&entry.name);
        if entry.mode.is_tree() {
            flatten_tree(trees, entry.id, path, out)?;
        } else {
            out.push(StagingEntry {
                path,
                mode: entry.mode,
                id: entry.id,
                stage: STAGE_MERGED,
                size: None,
                mtime: None,
            });
        }
    }
    Ok(())
}

/// A single pending change within an [`Editor`] transaction: a path, the
/// stage it targets, and a function computing the new row (or removal)
/// from whatever row currently occupies that `(path, stage)` slot.
pub struct Edit {
    pub path: Vec<u8>,
    pub stage: u8,
    pub apply: Box<dyn FnOnce(Option<&StagingEntry>) -> Option<StagingEntry>>,
}

/// An editor transaction: edits apply to a private scratch copy of
/// the index in order, and nothing is visible to readers of the original
/// [`Index`] until [`Editor::finish`] commits it.
pub struct Editor<'a> {
    index: &'a mut Index,
    scratch: Vec<StagingEntry>,
}

impl<'a> Editor<'a> {
    /// Apply one edit. `edit.apply` receives the row currently at
    /// `(edit.path, edit.stage)`, if any, and returns the row that should
    /// replace it, or `None` to remove it.
    pub fn add(&mut self, edit: Edit) {
        let slot = self.scratch.iter().position(|e| e.path == edit.path && e.stage == edit.stage);
        let current = slot.map(|i| self.scratch[i].clone());
        let outcome = (edit.apply)(current.as_ref());
        if let Some(i) = slot {
            self.scratch.remove(i);
        }
        if let Some(entry) = outcome {
            let pos = self
                .scratch
                .binary_search_by(|e| e.sort_key().cmp(&entry.sort_key()))
                .unwrap_or_else(|i| i);
            self.scratch.insert(pos, entry);
        }
    }

    /// Remove every row (any stage) at `path`.
    pub fn remove(&mut self, path: &[u8]) {
        self.scratch.retain(|e| e.path != path);
    }

    /// Persist the scratch state back into the index.
    pub fn finish(self) {
        self.index.entries = self.scratch;
    }
}
