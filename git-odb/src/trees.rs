//! The `Trees` facade: canonical sorting happens here, once, before
//! anything is hashed.

use git_hash::{oid, ObjectId};
use git_object::{Kind, Tree, TreeEntry};

use crate::store::GitObjectStore;
use crate::Error;

pub struct Trees<'s, S> {
    store: &'s mut S,
}

impl<'s, S: GitObjectStore> Trees<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Trees { store }
    }

    /// Canonically sort `entries` and store the serialized tree.
    pub fn store(&mut self, entries: Vec<TreeEntry>) -> Result<ObjectId, Error> {
        let tree = Tree::from_entries(entries);
        self.store.store(Kind::Tree, &tree.to_bytes())
    }

    pub fn load(&self, id: &oid) -> Result<Tree, Error> {
        let payload = self.store.load(id)?;
        Tree::parse(&payload).map_err(|e| Error::CorruptObject {
            id: id.to_owned(),
            reason: e.to_string(),
        })
    }
}
