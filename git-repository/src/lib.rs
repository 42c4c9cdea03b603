//! The repository facade: the single entry point the transport
//! layer is meant to bind to. It wraps an object store backend (typically
//! [`git_odb::compound::Db`]) and a ref store backend (typically
//! [`git_ref::file::Backend`]) behind the narrow contract the transport
//! actually needs: object read/write, a ref adapter (`get`/`update`/
//! `listAll`/`getSymrefTarget`/`isRefTip`), reachability enumeration,
//! pack serialization and pack ingest.
//!
//! This crate is deliberately thin.

#![deny(rust_2018_idioms)]

use git_hash::{oid, ObjectId};
use git_object::Kind;
use git_odb::ancestry::{find_merge_base, is_ancestor, walk_ancestry, WalkAncestryOptions};
use git_odb::store::GitObjectStore;
use git_features::progress::Progress;
use git_odb::{Commits, Trees};
use git_pack::pack::{AssembledObject, ExternalObjects};
use git_pack::reachability::collect_reachable_trees;
use git_ref::{Backend as RefBackend, CasOutcome, Ref, RefStore};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Odb(#[from] git_odb::Error),
    #[error(transparent)]
    Ref(#[from] git_ref::Error),
    #[error(transparent)]
    Pack(#[from] git_pack::pack::Error),
    #[error(transparent)]
    Traverse(#[from] git_traverse::tree::Error),
}

/// The outcome of [`Repository::ingest_pack`]: every object id
/// the pack contributed, and the pack's own trailing checksum. Nothing is
/// rolled back on success since ingest itself never mutates the store
/// until parsing and checksum verification have both already succeeded
///.
#[derive(Debug, Clone)]
pub struct IngestSummary {
    pub trailer: ObjectId,
    pub ids: Vec<ObjectId>,
}

/// The repository facade, generic over its two storage backends so the
/// same logic serves an in-memory test fixture and an on-disk repository
/// alike.
pub struct Repository<O, B> {
    pub objects: O,
    refs: RefStore<B>,
}

impl<O, B> Repository<O, B>
where
    O: GitObjectStore,
    B: RefBackend,
{
    pub fn new(objects: O, refs: RefStore<B>) -> Self {
        Repository { objects, refs }
    }

    /// `get` of the ref adapter: the ref's raw stored value,
    /// direct or symbolic, without following any chain.
    pub fn ref_get(&self, name: &str) -> Result<Option<Ref>, Error> {
        Ok(self.refs.get(name)?)
    }

    /// `update` of the ref adapter: point `name` directly at `id`,
    /// unconditionally. Callers that need atomicity use
    /// [`Repository::ref_compare_and_swap`] instead.
    pub fn ref_update(&mut self, name: &str, id: ObjectId) -> Result<(), Error> {
        Ok(self.refs.set(name, id)?)
    }

    pub fn ref_compare_and_swap(&mut self, name: &str, expected: Option<ObjectId>, new_value: ObjectId) -> Result<CasOutcome, Error> {
        Ok(self.refs.compare_and_swap(name, expected, new_value)?)
    }

    /// `listAll` of the ref adapter: every ref name, in the store's
    /// unspecified-but-stable order.
    pub fn list_all_refs(&self) -> Result<Vec<String>, Error> {
        Ok(self.refs.list("")?)
    }

    /// `getSymrefTarget` of the ref adapter: `name`'s target ref name if
    /// it is currently symbolic, `None` if it's direct, missing, or
    /// dangling.
    pub fn symref_target(&self, name: &str) -> Result<Option<String>, Error> {
        Ok(match self.refs.get(name)? {
            Some(Ref::Symbolic(target)) => Some(target),
            _ => None,
        })
    }

    /// `isRefTip` of the ref adapter: whether any ref resolves (following
    /// symbolic chains) to `id`.
    pub fn is_ref_tip(&self, id: ObjectId) -> Result<bool, Error> {
        for name in self.refs.list("")? {
            if self.refs.resolve(&name)? == Some(id) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn is_ancestor(&mut self, candidate: ObjectId, descendant: ObjectId) -> Result<bool, Error> {
        Ok(is_ancestor(&Commits::new(&mut self.objects), candidate, descendant)?)
    }

    pub fn find_merge_base(&mut self, a: ObjectId, b: ObjectId) -> Result<Vec<ObjectId>, Error> {
        Ok(find_merge_base(&Commits::new(&mut self.objects), a, b)?)
    }

    /// Reachability enumeration for outgoing packs: every commit
    /// reachable from `wants` that is not reachable from `excludes`,
    /// together with every tree and blob those commits' snapshots
    /// introduce beyond what the `excludes` commits' snapshots already
    /// cover. `wants`/`excludes` are commit ids,'s contract.
    pub fn collect_reachable_objects(
        &mut self,
        wants: impl IntoIterator<Item = ObjectId>,
        excludes: impl IntoIterator<Item = ObjectId>,
    ) -> Result<Vec<ObjectId>, Error> {
        let excludes: Vec<ObjectId> = excludes.into_iter().collect();

        let excluded_commits = walk_ancestry(&Commits::new(&mut self.objects), excludes.clone(), &WalkAncestryOptions::default())?;
        let included_commits = walk_ancestry(
            &Commits::new(&mut self.objects),
            wants,
            &WalkAncestryOptions {
                stop_at: excludes,
                ..Default::default()
            },
        )?;

        let commits = Commits::new(&mut self.objects);
        let excluded_trees: Result<Vec<ObjectId>, git_odb::Error> = excluded_commits.iter().map(|id| commits.get_tree(id.as_oid())).collect();
        let excluded_trees = excluded_trees?;
        let included_trees: Result<Vec<ObjectId>, git_odb::Error> = included_commits.iter().map(|id| commits.get_tree(id.as_oid())).collect();
        let included_trees = included_trees?;

        let trees = Trees::new(&mut self.objects);
        let tree_and_blob_ids = collect_reachable_trees(included_trees, excluded_trees, |id| trees.load(id).ok())?;

        let mut result = included_commits;
        result.extend(tree_and_blob_ids);
        Ok(result)
    }

    /// Serialize `ids` into a pack byte stream. Every object is
    /// written as a base entry; this facade never attempts delta
    /// compression between pack entries (see DESIGN.md).
    pub fn serialize_to_pack(&self, ids: impl IntoIterator<Item = ObjectId>) -> Result<Vec<u8>, Error> {
        self.serialize_to_pack_with_progress(ids, &mut git_features::progress::Discard)
    }

    /// [`Repository::serialize_to_pack`], reporting one tick per object
    /// written through `progress`.
    pub fn serialize_to_pack_with_progress(
        &self,
        ids: impl IntoIterator<Item = ObjectId>,
        progress: &mut impl Progress,
    ) -> Result<Vec<u8>, Error> {
        let mut loaded: Vec<(ObjectId, Kind, Vec<u8>)> = Vec::new();
        for id in ids {
            let (kind, _) = self.objects.header(id.as_oid())?;
            let payload = self.objects.load(id.as_oid())?;
            loaded.push((id, kind, payload));
        }
        let assembled = loaded.iter().map(|(id, kind, payload)| AssembledObject {
            id: *id,
            kind: *kind,
            payload,
        });
        Ok(git_pack::pack::assemble_with_progress(assembled, progress)?)
    }
}

impl<O, B> Repository<O, B>
where
    O: GitObjectStore + ExternalObjects,
    B: RefBackend,
{
    /// Parse and fully resolve `data` as a pack, then insert every
    /// object it contains into the store. Parsing, delta resolution and
    /// trailing-checksum verification all happen before anything is
    /// written, so a corrupt pack leaves the store untouched.
    pub fn ingest_pack(&mut self, data: &[u8]) -> Result<IngestSummary, Error> {
        self.ingest_pack_with_progress(data, &mut git_features::progress::Discard)
    }

    /// [`Repository::ingest_pack`], reporting one tick per entry resolved
    /// through `progress`.
    pub fn ingest_pack_with_progress(&mut self, data: &[u8], progress: &mut impl Progress) -> Result<IngestSummary, Error> {
        let summary = git_pack::pack::ingest_with_progress(data, &self.objects, progress)?;
        let mut ids = Vec::with_capacity(summary.objects.len());
        for (id, kind, payload) in &summary.objects {
            let stored = self.objects.store(*kind, payload)?;
            debug_assert_eq!(stored, *id, "content addressing guarantees the id matches");
            ids.push(*id);
        }
        Ok(IngestSummary {
            trailer: summary.trailer,
            ids,
        })
    }
}
