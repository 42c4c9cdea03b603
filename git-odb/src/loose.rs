//! Loose object backend: one zlib-compressed, framed object per file,
//! sharded as `<root>/<2-hex>/<38-hex>` the way Git's own loose store lays
//! objects out on disk.

use std::fs;
use std::io;
use std::path::PathBuf;

use git_hash::{oid, ObjectId};
use git_object::Kind;

use crate::store::GitObjectStore;
use crate::Error;

pub struct Store {
    root: PathBuf,
}

impl Store {
    /// Open (creating if necessary) a loose store rooted at `root`. The
    /// root is resolved through [`git_path::realpath`] so a store opened
    /// via a symlinked worktree path still addresses the same files a
    /// store opened via the resolved path would.
    pub fn at(root: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let cwd = std::env::current_dir()?;
        let root = git_path::realpath(&root, &cwd, 8)?;
        Ok(Store { root })
    }

    fn path_for(&self, id: &oid) -> PathBuf {
        let hex = id.to_hex();
        self.root.join(&hex[..2]).join(&hex[2..])
    }

    fn read_framed(&self, id: &oid) -> Result<Vec<u8>, Error> {
        let path = self.path_for(id);
        let compressed = fs::read(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                Error::NotFound(id.to_owned())
            } else {
                Error::Io(e)
            }
        })?;
        inflate_all(&compressed).map_err(|e| Error::CorruptObject {
            id: id.to_owned(),
            reason: e.to_string(),
        })
    }
}

/// Inflate a zlib block of unknown decompressed length, growing the output
/// buffer until the stream reports its own end.
fn inflate_all(compressed: &[u8]) -> Result<Vec<u8>, git_features::zlib::Error> {
    let mut inflate = git_features::zlib::StreamingInflate::new();
    let mut out = Vec::new();
    let mut offset = 0usize;
    loop {
        let step = inflate.step(&compressed[offset..], 8192)?;
        out.extend_from_slice(&step.output);
        offset += step.input_consumed;
        if step.stream_ended {
            return Ok(out);
        }
        if step.input_consumed == 0 && step.output.is_empty() {
            return Err(git_features::zlib::Error::Truncated {
                expected: out.len() + 1,
                actual: out.len(),
            });
        }
    }
}

impl GitObjectStore for Store {
    fn store(&mut self, kind: Kind, payload: &[u8]) -> Result<ObjectId, Error> {
        let id = git_object::framing::hash_of(kind, payload);
        let path = self.path_for(id.as_oid());
        if path.exists() {
            return Ok(id);
        }
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let framed = git_object::framing::frame(kind, payload);
        let compressed = git_features::zlib::compress(&framed, flate2::Compression::default());
        // Write to a sibling temp file first so a half-written file is
        // never observed at the final, content-addressed path.
        let tmp = path.with_extension(format!("tmp-{}", std::process::id()));
        fs::write(&tmp, &compressed)?;
        fs::rename(&tmp, &path)?;
        Ok(id)
    }

    fn load(&self, id: &oid) -> Result<Vec<u8>, Error> {
        let framed = self.read_framed(id)?;
        let (_kind, payload) = git_object::framing::parse(&framed).map_err(|e| Error::CorruptObject {
            id: id.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(payload.to_vec())
    }

    fn load_raw(&self, id: &oid) -> Result<Vec<u8>, Error> {
        self.read_framed(id)
    }

    fn header(&self, id: &oid) -> Result<(Kind, usize), Error> {
        let framed = self.read_framed(id)?;
        let (kind, payload) = git_object::framing::parse(&framed).map_err(|e| Error::CorruptObject {
            id: id.to_owned(),
            reason: e.to_string(),
        })?;
        Ok((kind, payload.len()))
    }

    fn has(&self, id: &oid) -> bool {
        self.path_for(id).exists()
    }

    fn delete(&mut self, id: &oid) -> Result<bool, Error> {
        let path = self.path_for(id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn list(&self) -> Result<Vec<ObjectId>, Error> {
        let mut ids = Vec::new();
        if !self.root.exists() {
            return Ok(ids);
        }
        for shard in fs::read_dir(&self.root)? {
            let shard = shard?;
            if !shard.file_type()?.is_dir() {
                continue;
            }
            let prefix = shard.file_name();
            let prefix = prefix.to_string_lossy();
            if prefix.len() != 2 {
                continue;
            }
            for file in fs::read_dir(shard.path())? {
                let file = file?;
                let name = file.file_name();
                let name = name.to_string_lossy();
                if name.starts_with("tmp-") {
                    continue;
                }
                let hex = format!("{prefix}{name}");
                if let Ok(id) = ObjectId::from_hex(&hex) {
                    ids.push(id);
                }
            }
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git_object::Kind;

    #[test]
    fn stores_and_loads_a_blob_by_content_address() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::at(dir.path()).unwrap();
        let id = store.store(Kind::Blob, b"Hello, World!").unwrap();
        assert_eq!(id.to_hex(), "b45ef6fec89518d314f546fd6c3025367b721684");
        assert!(store.has(id.as_oid()));
        assert_eq!(store.load(id.as_oid()).unwrap(), b"Hello, World!");
    }

    #[test]
    fn header_reports_kind_and_size_without_caller_decompressing() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::at(dir.path()).unwrap();
        let id = store.store(Kind::Tree, b"").unwrap();
        assert_eq!(store.header(id.as_oid()).unwrap(), (Kind::Tree, 0));
    }

    #[test]
    fn storing_identical_bytes_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::at(dir.path()).unwrap();
        let first = store.store(Kind::Blob, b"same").unwrap();
        let second = store.store(Kind::Blob, b"same").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_object_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::at(dir.path()).unwrap();
        assert!(matches!(store.load(git_hash::EMPTY_BLOB.as_oid()), Err(Error::NotFound(_))));
    }

    #[test]
    fn delete_removes_an_object_and_reports_prior_existence() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::at(dir.path()).unwrap();
        let id = store.store(Kind::Blob, b"gone soon").unwrap();
        assert!(store.delete(id.as_oid()).unwrap());
        assert!(!store.has(id.as_oid()));
        assert!(!store.delete(id.as_oid()).unwrap());
    }

    #[test]
    fn list_enumerates_every_stored_object() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::at(dir.path()).unwrap();
        let a = store.store(Kind::Blob, b"a").unwrap();
        let b = store.store(Kind::Blob, b"b").unwrap();
        let mut ids = store.list().unwrap();
        ids.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(ids, expected);
    }
}
