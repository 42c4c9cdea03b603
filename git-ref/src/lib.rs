//! The reference store: named mutable pointers to object ids, with
//! symbolic indirection, bounded-depth resolve, prefix listing and
//! compare-and-swap. Storage is abstracted behind [`Backend`]; [`memory`]
//! and [`file`] supply the two concrete backends.

#![deny(rust_2018_idioms)]

pub mod file;
pub mod memory;

use git_hash::ObjectId;

/// How many symbolic indirections [`RefStore::resolve`] will follow before
/// reporting [`Error::SymbolicCycle`].
pub const MAX_SYMBOLIC_DEPTH: usize = 5;

/// A ref's stored value: either a direct pointer to an object, or a
/// pointer to another ref by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ref {
    Direct(ObjectId),
    Symbolic(String),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("symbolic ref chain starting at {start:?} exceeds the maximum resolve depth of {MAX_SYMBOLIC_DEPTH}")]
    SymbolicCycle { start: String },
    #[error("ref file for {0:?} could not be parsed")]
    Corrupt(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Storage backends conform to this capability set; `RefStore` is generic
/// over it so the same facade logic (resolve, compare-and-swap) works
/// identically over memory or disk.
pub trait Backend {
    fn read(&self, name: &str) -> Result<Option<Ref>, Error>;
    fn write(&mut self, name: &str, value: Ref) -> Result<(), Error>;
    /// `true` if a ref existed (loose or packed) and was removed.
    fn remove(&mut self, name: &str) -> Result<bool, Error>;
    /// Every ref name starting with `prefix` (empty prefix matches all),
    /// each appearing once; order unspecified beyond that.
    fn list(&self, prefix: &str) -> Result<Vec<String>, Error>;
}

/// The outcome of [`RefStore::compare_and_swap`]: either the swap
/// applied, or it didn't and the ref's actual current value is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasOutcome {
    Success,
    Conflict { previous: Option<ObjectId> },
}

/// The reference store facade, generic over a [`Backend`].
pub struct RefStore<B> {
    backend: B,
}

impl<B: Backend> RefStore<B> {
    pub fn new(backend: B) -> Self {
        RefStore { backend }
    }

    pub fn get(&self, name: &str) -> Result<Option<Ref>, Error> {
        self.backend.read(name)
    }

    pub fn set(&mut self, name: &str, id: ObjectId) -> Result<(), Error> {
        self.backend.write(name, Ref::Direct(id))
    }

    pub fn set_symbolic(&mut self, name: &str, target: &str) -> Result<(), Error> {
        self.backend.write(name, Ref::Symbolic(target.to_string()))
    }

    pub fn remove(&mut self, name: &str) -> Result<bool, Error> {
        self.backend.remove(name)
    }

    /// Follow a symbolic chain starting at `name` up to [`MAX_SYMBOLIC_DEPTH`]
    /// hops, returning the terminal direct id, `None` if `name` is absent
    /// or dangles at a missing target, or [`Error::SymbolicCycle`] if the
    /// chain doesn't bottom out in time.
    pub fn resolve(&self, name: &str) -> Result<Option<ObjectId>, Error> {
        let mut current = name.to_string();
        for _ in 0..MAX_SYMBOLIC_DEPTH {
            match self.backend.read(&current)? {
                None => return Ok(None),
                Some(Ref::Direct(id)) => return Ok(Some(id)),
                Some(Ref::Symbolic(target)) => current = target,
            }
        }
        Err(Error::SymbolicCycle { start: name.to_string() })
    }

    pub fn list(&self, prefix: &str) -> Result<Vec<String>, Error> {
        self.backend.list(prefix)
    }

    /// Atomically set `name` to `new_value` iff its current direct value
    /// equals `expected` (`None` meaning "must not already exist").
    pub fn compare_and_swap(&mut self, name: &str, expected: Option<ObjectId>, new_value: ObjectId) -> Result<CasOutcome, Error> {
        let current = self.resolve(name)?;
        if current != expected {
            return Ok(CasOutcome::Conflict { previous: current });
        }
        self.set(name, new_value)?;
        Ok(CasOutcome::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory;

    #[test]
    fn compare_and_swap_never_overwrites_an_unexpected_value() {
        let mut refs = RefStore::new(memory::Backend::new());
        let id1 = git_hash::EMPTY_BLOB;
        let id2 = git_hash::EMPTY_TREE;
        let id3 = ObjectId::from_hex("0000000000000000000000000000000000000a").unwrap();

        refs.set("refs/heads/x", id1).unwrap();
        assert_eq!(refs.compare_and_swap("refs/heads/x", Some(id1), id2).unwrap(), CasOutcome::Success);
        assert_eq!(
            refs.compare_and_swap("refs/heads/x", Some(id1), id3).unwrap(),
            CasOutcome::Conflict { previous: Some(id2) }
        );
        assert_eq!(refs.get("refs/heads/x").unwrap(), Some(Ref::Direct(id2)));
    }

    #[test]
    fn compare_and_swap_create_only_rejects_an_existing_ref() {
        let mut refs = RefStore::new(memory::Backend::new());
        let id = git_hash::EMPTY_BLOB;
        refs.set("refs/heads/main", id).unwrap();
        assert_eq!(
            refs.compare_and_swap("refs/heads/main", None, id).unwrap(),
            CasOutcome::Conflict { previous: Some(id) }
        );
    }

    #[test]
    fn symbolic_resolve_follows_the_chain_and_reports_dangling_targets() {
        let mut refs = RefStore::new(memory::Backend::new());
        let id = git_hash::EMPTY_BLOB;
        refs.set_symbolic("HEAD", "refs/heads/main").unwrap();
        refs.set("refs/heads/main", id).unwrap();
        assert_eq!(refs.resolve("HEAD").unwrap(), Some(id));

        refs.set_symbolic("HEAD", "refs/heads/missing").unwrap();
        assert_eq!(refs.resolve("HEAD").unwrap(), None);
    }

    #[test]
    fn a_self_referencing_symbolic_ref_is_reported_as_a_cycle() {
        let mut refs = RefStore::new(memory::Backend::new());
        refs.set_symbolic("refs/heads/a", "refs/heads/b").unwrap();
        refs.set_symbolic("refs/heads/b", "refs/heads/a").unwrap();
        assert!(matches!(refs.resolve("refs/heads/a"), Err(Error::SymbolicCycle { .. })));
    }
}
