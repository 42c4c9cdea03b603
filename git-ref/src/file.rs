//! An on-disk ref backend: one loose file per ref under a root directory,
//! Git's own `"<hex>\n"` / `"ref: <target>\n"` conventions, with a
//! `packed-refs` file consulted as a fallback for any ref that has no
//! loose file of its own.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use git_hash::ObjectId;

use crate::{Error, Ref};

pub struct Backend {
    root: PathBuf,
    packed: BTreeMap<String, ObjectId>,
}

impl Backend {
    /// Open (creating if necessary) a ref store rooted at `root`, loading
    /// `root/packed-refs` if present.
    pub fn at(root: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let packed = read_packed_refs(&root.join("packed-refs"))?;
        Ok(Backend { root, packed })
    }

    fn loose_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn write_packed_refs(&self) -> Result<(), Error> {
        let mut contents = String::from("# pack-refs with: peeled fully-peeled sorted\n");
        for (name, id) in &self.packed {
            contents.push_str(&id.to_hex());
            contents.push(' ');
            contents.push_str(name);
            contents.push('\n');
        }
        let path = self.root.join("packed-refs");
        let tmp = self.root.join(format!("packed-refs.tmp-{}", std::process::id()));
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

fn read_packed_refs(path: &Path) -> Result<BTreeMap<String, ObjectId>, Error> {
    let mut entries = BTreeMap::new();
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(entries),
        Err(e) => return Err(Error::Io(e)),
    };
    for line in text.lines() {
        if line.starts_with('#') || line.starts_with('^') || line.is_empty() {
            continue;
        }
        let (hex, name) = line.split_once(' ').ok_or_else(|| Error::Corrupt("packed-refs".to_string()))?;
        let id = ObjectId::from_hex(hex).map_err(|_| Error::Corrupt("packed-refs".to_string()))?;
        entries.insert(name.to_string(), id);
    }
    Ok(entries)
}

fn parse_loose(name: &str, contents: &str) -> Result<Ref, Error> {
    let trimmed = contents.trim_end_matches('\n');
    if let Some(target) = trimmed.strip_prefix("ref: ") {
        return Ok(Ref::Symbolic(target.trim().to_string()));
    }
    ObjectId::from_hex(trimmed.trim())
        .map(Ref::Direct)
        .map_err(|_| Error::Corrupt(name.to_string()))
}

impl crate::Backend for Backend {
    fn read(&self, name: &str) -> Result<Option<Ref>, Error> {
        let path = self.loose_path(name);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(parse_loose(name, &contents)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(self.packed.get(name).map(|id| Ref::Direct(*id))),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn write(&mut self, name: &str, value: Ref) -> Result<(), Error> {
        let path = self.loose_path(name);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let contents = match &value {
            Ref::Direct(id) => format!("{}\n", id.to_hex()),
            Ref::Symbolic(target) => format!("ref: {target}\n"),
        };
        // Sibling temp file plus rename, so a reader never observes a
        // half-written ref.
        let tmp = path.with_extension(format!("tmp-{}", std::process::id()));
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<bool, Error> {
        let path = self.loose_path(name);
        let loose_removed = match fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => return Err(Error::Io(e)),
        };
        let packed_removed = self.packed.remove(name).is_some();
        if packed_removed {
            self.write_packed_refs()?;
        }
        Ok(loose_removed || packed_removed)
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, Error> {
        let mut names = std::collections::BTreeSet::new();
        names.extend(self.packed.keys().filter(|name| name.starts_with(prefix)).cloned());
        walk_loose_refs(&self.root, &self.root, prefix, &mut names)?;
        Ok(names.into_iter().collect())
    }
}

fn walk_loose_refs(root: &Path, dir: &Path, prefix: &str, out: &mut std::collections::BTreeSet<String>) -> Result<(), Error> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            walk_loose_refs(root, &path, prefix, out)?;
            continue;
        }
        let Ok(relative) = path.strip_prefix(root) else { continue };
        let name = relative.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/");
        if name == "packed-refs" || name.contains("tmp-") {
            continue;
        }
        if name.starts_with(prefix) {
            out.insert(name);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Backend as _;

    #[test]
    fn writes_and_reads_a_loose_direct_ref() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = Backend::at(dir.path()).unwrap();
        let id = git_hash::EMPTY_BLOB;
        backend.write("refs/heads/main", Ref::Direct(id)).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("refs/heads/main")).unwrap(), format!("{}\n", id.to_hex()));
        assert_eq!(backend.read("refs/heads/main").unwrap(), Some(Ref::Direct(id)));
    }

    #[test]
    fn writes_and_reads_a_symbolic_ref() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = Backend::at(dir.path()).unwrap();
        backend.write("HEAD", Ref::Symbolic("refs/heads/main".to_string())).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("HEAD")).unwrap(), "ref: refs/heads/main\n");
        assert_eq!(backend.read("HEAD").unwrap(), Some(Ref::Symbolic("refs/heads/main".to_string())));
    }

    #[test]
    fn falls_back_to_packed_refs_when_no_loose_file_exists() {
        let dir = tempfile::tempdir().unwrap();
        let id = git_hash::EMPTY_TREE;
        fs::write(dir.path().join("packed-refs"), format!("# comment\n{} refs/tags/v1\n", id.to_hex())).unwrap();
        let backend = Backend::at(dir.path()).unwrap();
        assert_eq!(backend.read("refs/tags/v1").unwrap(), Some(Ref::Direct(id)));
    }

    #[test]
    fn a_loose_ref_shadows_a_packed_ref_of_the_same_name() {
        let dir = tempfile::tempdir().unwrap();
        let packed_id = git_hash::EMPTY_TREE;
        let loose_id = git_hash::EMPTY_BLOB;
        fs::write(dir.path().join("packed-refs"), format!("{} refs/heads/main\n", packed_id.to_hex())).unwrap();
        let mut backend = Backend::at(dir.path()).unwrap();
        backend.write("refs/heads/main", Ref::Direct(loose_id)).unwrap();
        assert_eq!(backend.read("refs/heads/main").unwrap(), Some(Ref::Direct(loose_id)));
    }

    #[test]
    fn remove_deletes_both_the_loose_file_and_the_packed_entry() {
        let dir = tempfile::tempdir().unwrap();
        let id = git_hash::EMPTY_BLOB;
        fs::write(dir.path().join("packed-refs"), format!("{} refs/heads/main\n", id.to_hex())).unwrap();
        let mut backend = Backend::at(dir.path()).unwrap();
        backend.write("refs/heads/main", Ref::Direct(id)).unwrap();
        assert!(backend.remove("refs/heads/main").unwrap());
        assert_eq!(backend.read("refs/heads/main").unwrap(), None);
        assert!(!backend.remove("refs/heads/main").unwrap());
    }

    #[test]
    fn list_unions_loose_and_packed_names_under_a_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let id = git_hash::EMPTY_BLOB;
        fs::write(dir.path().join("packed-refs"), format!("{} refs/heads/packed-only\n", id.to_hex())).unwrap();
        let mut backend = Backend::at(dir.path()).unwrap();
        backend.write("refs/heads/main", Ref::Direct(id)).unwrap();
        backend.write("refs/tags/v1", Ref::Direct(id)).unwrap();
        let mut names = backend.list("refs/heads/").unwrap();
        names.sort();
        assert_eq!(names, vec!["refs/heads/main".to_string(), "refs/heads/packed-only".to_string()]);
    }
}
