//! The raw object store contract. Every backend — `loose`, the
//! `compound` loose+packed store — answers to this trait; the typed
//! facades in `blobs`/`trees`/`commits`/`tags` are built entirely on top of
//! it and never know which concrete backend they're talking to.

use git_hash::{oid, ObjectId};
use git_object::Kind;

use crate::Error;

pub trait GitObjectStore {
    /// Compute the id of `payload` framed as `kind` and insert it if
    /// absent. Idempotent.
    fn store(&mut self, kind: Kind, payload: &[u8]) -> Result<ObjectId, Error>;

    /// The object's payload, framing stripped.
    fn load(&self, id: &oid) -> Result<Vec<u8>, Error>;

    /// The object's framed bytes, exactly as it would be re-hashed or
    /// emitted into a pack.
    fn load_raw(&self, id: &oid) -> Result<Vec<u8>, Error>;

    /// Cheap metadata read: kind and payload size, without decompressing
    /// the payload itself where a backend can avoid it.
    fn header(&self, id: &oid) -> Result<(Kind, usize), Error>;

    fn has(&self, id: &oid) -> bool;

    /// `true` if the object existed and was removed. Backends that cannot
    /// remove an object (e.g. one embedded in a read-only pack) return
    /// `false` rather than erroring.
    fn delete(&mut self, id: &oid) -> Result<bool, Error>;

    fn list(&self) -> Result<Vec<ObjectId>, Error>;
}
