//! An in-memory ref backend, useful for tests and for repositories that
//! don't need persistence.

use std::collections::HashMap;

use crate::{Error, Ref};

#[derive(Default)]
pub struct Backend {
    refs: HashMap<String, Ref>,
}

impl Backend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl crate::Backend for Backend {
    fn read(&self, name: &str) -> Result<Option<Ref>, Error> {
        Ok(self.refs.get(name).cloned())
    }

    fn write(&mut self, name: &str, value: Ref) -> Result<(), Error> {
        self.refs.insert(name.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<bool, Error> {
        Ok(self.refs.remove(name).is_some())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, Error> {
        let mut names: Vec<String> = self.refs.keys().filter(|name| name.starts_with(prefix)).cloned().collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Backend as _;

    #[test]
    fn list_filters_by_prefix() {
        let mut backend = Backend::new();
        backend.write("refs/heads/main", Ref::Direct(git_hash::EMPTY_BLOB)).unwrap();
        backend.write("refs/tags/v1", Ref::Direct(git_hash::EMPTY_TREE)).unwrap();
        assert_eq!(backend.list("refs/heads/").unwrap(), vec!["refs/heads/main".to_string()]);
        assert_eq!(backend.list("").unwrap().len(), 2);
    }
}
