//! Value types for the four object kinds plus Git's object framing: the
//! bit-exact `"<type> <size>\0<payload>"` wrapper that every stored object
//! is hashed as.
#![deny(rust_2018_idioms)]

mod blob;
mod commit;
pub mod framing;
mod kind;
mod mode;
mod person_ident;
mod tag;
mod tree;

pub use blob::Blob;
pub use commit::Commit;
pub use kind::Kind;
pub use mode::Mode;
pub use person_ident::{PersonIdent, Time};
pub use tag::Tag;
pub use tree::{Tree, TreeEntry};

use git_hash::ObjectId;

/// Any one of the four object kinds, with its kind tag alongside the
/// decoded value. The raw object store deals in framed bytes; this is the
/// typed view the facades in `git-odb` hand back to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
    Tag(Tag),
}

impl Object {
    pub fn kind(&self) -> Kind {
        match self {
            Object::Blob(_) => Kind::Blob,
            Object::Tree(_) => Kind::Tree,
            Object::Commit(_) => Kind::Commit,
            Object::Tag(_) => Kind::Tag,
        }
    }

    /// Serialize the inner value's own byte representation (not the framed
    /// `"<type> <size>\0"` wrapper).
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Object::Blob(b) => b.as_bytes().to_vec(),
            Object::Tree(t) => t.to_bytes(),
            Object::Commit(c) => c.to_bytes(),
            Object::Tag(t) => t.to_bytes(),
        }
    }

    /// Decode `payload` according to `kind`.
    pub fn parse(kind: Kind, payload: &[u8]) -> Result<Self, Error> {
        Ok(match kind {
            Kind::Blob => Object::Blob(Blob(payload.to_vec())),
            Kind::Tree => Object::Tree(Tree::parse(payload)?),
            Kind::Commit => Object::Commit(Commit::parse(payload)?),
            Kind::Tag => Object::Tag(Tag::parse(payload)?),
        })
    }

    pub fn as_commit(&self) -> Option<&Commit> {
        match self {
            Object::Commit(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&Tree> {
        match self {
            Object::Tree(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_tag(&self) -> Option<&Tag> {
        match self {
            Object::Tag(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&Blob> {
        match self {
            Object::Blob(b) => Some(b),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Framing(#[from] framing::Error),
    #[error(transparent)]
    Tree(#[from] tree::Error),
}

/// Frame and hash `object` in one step, the way every store-side facade
/// does before handing bytes to the raw object store.
pub fn frame(object: &Object) -> (ObjectId, Vec<u8>) {
    let payload = object.to_bytes();
    let id = framing::hash_of(object.kind(), &payload);
    let framed = framing::frame(object.kind(), &payload);
    (id, framed)
}
