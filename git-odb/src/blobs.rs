//! The `Blobs` facade: typed constructors over the raw store for
//! opaque content payloads.

use git_hash::{oid, ObjectId};
use git_object::Kind;

use crate::store::GitObjectStore;
use crate::Error;

pub struct Blobs<'s, S> {
    store: &'s mut S,
}

impl<'s, S: GitObjectStore> Blobs<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Blobs { store }
    }

    pub fn store(&mut self, data: &[u8]) -> Result<ObjectId, Error> {
        self.store.store(Kind::Blob, data)
    }

    pub fn load(&self, id: &oid) -> Result<Vec<u8>, Error> {
        self.store.load(id)
    }

    /// The blob's size, or `-1` if it isn't present.
    pub fn size(&self, id: &oid) -> i64 {
        match self.store.header(id) {
            Ok((Kind::Blob, size)) => size as i64,
            _ => -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loose;

    #[test]
    fn store_then_load_roundtrips_and_hashes_to_the_well_known_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = loose::Store::at(dir.path()).unwrap();
        let mut blobs = Blobs::new(&mut store);
        let id = blobs.store(b"Hello, World!").unwrap();
        assert_eq!(id.to_hex(), "b45ef6fec89518d314f546fd6c3025367b721684");
        assert_eq!(blobs.load(id.as_oid()).unwrap(), b"Hello, World!");
        assert_eq!(blobs.size(id.as_oid()), 13);
    }

    #[test]
    fn size_of_a_missing_blob_is_negative_one() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = loose::Store::at(dir.path()).unwrap();
        let blobs = Blobs::new(&mut store);
        assert_eq!(blobs.size(git_hash::EMPTY_BLOB.as_oid()), -1);
    }
}
