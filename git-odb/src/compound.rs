//! The compound object store: a loose backend layered under zero-or-more
//! read-only packed backends (`Db::at`, `db.packs`, `db.locate`). New
//! objects are always written to the loose backend; packs are loaded once
//! at `Db::at` and never mutated.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use git_hash::{oid, ObjectId};
use git_object::Kind;
use git_pack::pack::ExternalObjects;

use crate::loose;
use crate::store::GitObjectStore;
use crate::Error;

/// One loaded pack, fully resolved at load time: every entry's
/// `OFS_DELTA`/`REF_DELTA` chain has already been applied, so individual
/// lookups are a single map access rather than a chain walk. Trades memory
/// for lookup simplicity compared to a lazily-resolved pack index.
pub struct PackFile {
    pub checksum: ObjectId,
    objects: HashMap<ObjectId, (Kind, Vec<u8>)>,
}

impl PackFile {
    fn load(path: &Path, earlier: &[PackFile], loose: &loose::Store) -> Result<Self, Error> {
        let bytes = fs::read(path)?;
        let external = CompoundExternal { loose, earlier };
        let summary = git_pack::pack::ingest(&bytes, &external)?;
        let objects = summary.objects.into_iter().map(|(id, kind, data)| (id, (kind, data))).collect();
        Ok(PackFile {
            checksum: summary.trailer,
            objects,
        })
    }
}

struct CompoundExternal<'a> {
    loose: &'a loose::Store,
    earlier: &'a [PackFile],
}

impl ExternalObjects for CompoundExternal<'_> {
    fn find(&self, id: &oid) -> Option<(Kind, Vec<u8>)> {
        if let Ok((kind, _)) = self.loose.header(id) {
            return self.loose.load(id).ok().map(|data| (kind, data));
        }
        self.earlier.iter().find_map(|pack| pack.objects.get(&id.to_owned()).cloned())
    }
}

pub struct Db {
    pub loose: loose::Store,
    pub packs: Vec<PackFile>,
}

/// An object as handed back from [`Db::locate`]: its kind plus payload
/// bytes (framing stripped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    pub kind: Kind,
    pub data: Vec<u8>,
}

impl Db {
    /// Open the compound store rooted at `objects_dir`: a loose store at
    /// `objects_dir` itself, plus every `*.pack` file under
    /// `objects_dir/pack`, loaded in sorted filename order for
    /// deterministic `packs` ordering across processes.
    pub fn at(objects_dir: impl Into<PathBuf>) -> Result<Self, Error> {
        let objects_dir = objects_dir.into();
        let loose = loose::Store::at(&objects_dir)?;

        let pack_dir = objects_dir.join("pack");
        let mut pack_paths = Vec::new();
        if pack_dir.is_dir() {
            for entry in fs::read_dir(&pack_dir)? {
                let entry = entry?;
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) == Some("pack") {
                    pack_paths.push(path);
                }
            }
        }
        pack_paths.sort();

        let mut packs = Vec::with_capacity(pack_paths.len());
        for path in pack_paths {
            let pack = PackFile::load(&path, &packs, &loose)?;
            packs.push(pack);
        }

        Ok(Db { loose, packs })
    }

    /// Look up `id` in the loose store first (the freshest state), falling
    /// back to each loaded pack in order. `buf` is scratch space the
    /// caller may reuse across calls.
    pub fn locate(&self, id: &oid, buf: &mut Vec<u8>) -> Result<Option<Object>, Error> {
        buf.clear();
        if self.loose.has(id) {
            let (kind, _) = self.loose.header(id)?;
            let data = self.loose.load(id)?;
            buf.extend_from_slice(&data);
            return Ok(Some(Object { kind, data }));
        }
        for pack in &self.packs {
            if let Some((kind, data)) = pack.objects.get(&id.to_owned()) {
                buf.extend_from_slice(data);
                return Ok(Some(Object { kind: *kind, data: data.clone() }));
            }
        }
        Ok(None)
    }
}

impl GitObjectStore for Db {
    fn store(&mut self, kind: Kind, payload: &[u8]) -> Result<ObjectId, Error> {
        self.loose.store(kind, payload)
    }

    fn load(&self, id: &oid) -> Result<Vec<u8>, Error> {
        if self.loose.has(id) {
            return self.loose.load(id);
        }
        for pack in &self.packs {
            if let Some((_, data)) = pack.objects.get(&id.to_owned()) {
                return Ok(data.clone());
            }
        }
        Err(Error::NotFound(id.to_owned()))
    }

    fn load_raw(&self, id: &oid) -> Result<Vec<u8>, Error> {
        if self.loose.has(id) {
            return self.loose.load_raw(id);
        }
        let (kind, _) = self.header(id)?;
        let payload = self.load(id)?;
        Ok(git_object::framing::frame(kind, &payload))
    }

    fn header(&self, id: &oid) -> Result<(Kind, usize), Error> {
        if self.loose.has(id) {
            return self.loose.header(id);
        }
        for pack in &self.packs {
            if let Some((kind, data)) = pack.objects.get(&id.to_owned()) {
                return Ok((*kind, data.len()));
            }
        }
        Err(Error::NotFound(id.to_owned()))
    }

    fn has(&self, id: &oid) -> bool {
        self.loose.has(id) || self.packs.iter().any(|pack| pack.objects.contains_key(&id.to_owned()))
    }

    fn delete(&mut self, id: &oid) -> Result<bool, Error> {
        // Packed objects are read-only; only loose copies can be removed.
        self.loose.delete(id)
    }

    fn list(&self) -> Result<Vec<ObjectId>, Error> {
        let mut seen: HashSet<ObjectId> = self.loose.list()?.into_iter().collect();
        for pack in &self.packs {
            seen.extend(pack.objects.keys().copied());
        }
        Ok(seen.into_iter().collect())
    }
}

impl ExternalObjects for Db {
    fn find(&self, id: &oid) -> Option<(Kind, Vec<u8>)> {
        self.header(id).ok().and_then(|(kind, _)| self.load(id).ok().map(|data| (kind, data)))
    }
}
