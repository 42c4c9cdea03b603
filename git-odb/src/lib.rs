//! The content-addressed object store: the raw [`store::GitObjectStore`]
//! contract, the [`loose`] and [`compound`] backends that satisfy it, and
//! the typed [`blobs`]/[`trees`]/[`commits`]/[`tags`] facades built on top.
//! Commit ancestry ([`ancestry`]) completes the facade since it's typed
//! over [`git_object::Commit`].

#![deny(rust_2018_idioms)]

pub mod ancestry;
pub mod blobs;
pub mod commits;
pub mod compound;
pub mod loose;
pub mod store;
pub mod tags;
pub mod trees;

pub use ancestry::{find_merge_base, is_ancestor, walk_ancestry, WalkAncestryOptions};
pub use blobs::Blobs;
pub use commits::Commits;
pub use git_hash::ObjectId;
pub use store::GitObjectStore;
pub use tags::Tags;
pub use trees::Trees;

/// Errors surfaced by any object store backend or facade: `NotFound`
/// and `CorruptObject` are never retried internally.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("object {0} not found")]
    NotFound(ObjectId),
    #[error("object {id} is corrupt: {reason}")]
    CorruptObject { id: ObjectId, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Pack(#[from] git_pack::pack::Error),
    #[error(transparent)]
    RealPath(#[from] git_path::Error),
}
