//! The `Tags` facade: annotated tag objects, distinct from the
//! lightweight tags that are just refs (see `git-ref`).

use git_hash::{oid, ObjectId};
use git_object::{Kind, Tag};

use crate::store::GitObjectStore;
use crate::Error;

pub struct Tags<'s, S> {
    store: &'s mut S,
}

impl<'s, S: GitObjectStore> Tags<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Tags { store }
    }

    pub fn store(&mut self, tag: &Tag) -> Result<ObjectId, Error> {
        self.store.store(Kind::Tag, &tag.to_bytes())
    }

    pub fn load(&self, id: &oid) -> Result<Tag, Error> {
        let payload = self.store.load(id)?;
        Tag::parse(&payload).map_err(|e| Error::CorruptObject {
            id: id.to_owned(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loose;
    use git_object::{PersonIdent, Time};

    #[test]
    fn store_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = loose::Store::at(dir.path()).unwrap();
        let mut tags = Tags::new(&mut store);

        let tag = Tag {
            target: git_hash::EMPTY_TREE,
            target_kind: Kind::Tree,
            name: "v1.0.0".into(),
            tagger: Some(PersonIdent {
                name: "Release Bot".into(),
                email: "bot@example.com".into(),
                time: Time {
                    seconds_since_epoch: 1_700_000_000,
                    offset_minutes: 0,
                },
            }),
            message: "Release v1.0.0\n".into(),
        };
        let id = tags.store(&tag).unwrap();
        assert_eq!(tags.load(id.as_oid()).unwrap(), tag);
    }
}
