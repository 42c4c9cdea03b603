//! The `Commits` facade: serialization, plus `getParents`/
//! `getTree` convenience reads. The ancestry walk and merge-base live in
//! [`crate::ancestry`], built on top of [`Commits::load`].

use git_hash::{oid, ObjectId};
use git_object::{Commit, Kind};

use crate::store::GitObjectStore;
use crate::Error;

pub struct Commits<'s, S> {
    store: &'s mut S,
}

impl<'s, S: GitObjectStore> Commits<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Commits { store }
    }

    pub fn store(&mut self, commit: &Commit) -> Result<ObjectId, Error> {
        self.store.store(Kind::Commit, &commit.to_bytes())
    }

    pub fn load(&self, id: &oid) -> Result<Commit, Error> {
        let payload = self.store.load(id)?;
        Commit::parse(&payload).map_err(|e| Error::CorruptObject {
            id: id.to_owned(),
            reason: e.to_string(),
        })
    }

    pub fn get_parents(&self, id: &oid) -> Result<Vec<ObjectId>, Error> {
        Ok(self.load(id)?.parents)
    }

    pub fn get_tree(&self, id: &oid) -> Result<ObjectId, Error> {
        Ok(self.load(id)?.tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loose;
    use git_object::{PersonIdent, Time};

    fn ident(name: &str) -> PersonIdent {
        PersonIdent {
            name: name.into(),
            email: format!("{name}@example.com"),
            time: Time {
                seconds_since_epoch: 1_700_000_000,
                offset_minutes: 0,
            },
        }
    }

    #[test]
    fn store_then_load_roundtrips_byte_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = loose::Store::at(dir.path()).unwrap();
        let mut commits = Commits::new(&mut store);

        let commit = Commit {
            tree: git_hash::EMPTY_TREE,
            parents: vec![],
            author: ident("a"),
            committer: ident("c"),
            encoding: None,
            gpg_signature: None,
            message: "initial\n".into(),
        };
        let id = commits.store(&commit).unwrap();
        let loaded = commits.load(id.as_oid()).unwrap();
        assert_eq!(loaded, commit);
        assert_eq!(commits.get_tree(id.as_oid()).unwrap(), git_hash::EMPTY_TREE);
        assert!(commits.get_parents(id.as_oid()).unwrap().is_empty());
    }
}
