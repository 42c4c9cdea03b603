//! Pack byte stream assembly and parsing: `PACK` magic,
//! version, object count, entries, and a trailing SHA-1 covering every byte
//! before it.

use std::collections::HashMap;

use git_features::progress::{Discard, Progress};
use git_hash::{oid, Hasher, ObjectId};
use git_object::Kind;

use crate::data::{self, Header};

pub const MAGIC: &[u8; 4] = b"PACK";
pub const VERSION: u32 = 2;
const TRAILER_LEN: usize = git_hash::SIZE_OF_SHA1_DIGEST;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("pack is missing the 'PACK' magic header")]
    BadMagic,
    #[error("pack declares unsupported version {0}")]
    UnsupportedVersion(u32),
    #[error("pack ended after {actual} of its declared {expected} objects")]
    Truncated { expected: u32, actual: u32 },
    #[error("pack trailer checksum does not match its contents")]
    ChecksumMismatch,
    #[error(transparent)]
    Entry(#[from] data::Error),
    #[error(transparent)]
    Delta(#[from] crate::delta::Error),
    #[error("OFS_DELTA at pack offset {0} does not point at a preceding entry")]
    BadOfsDeltaBase(u64),
    #[error("REF_DELTA at pack offset {0} references {1}, which this ingest cannot resolve")]
    UnresolvedRefDelta(u64, ObjectId),
    #[error("a pack cannot hold more than u32::MAX objects ({0} requested)")]
    TooManyObjects(usize),
}

/// A fully-materialized object ready to be written as a pack entry. Pack
/// writing here never attempts delta compression between objects (see
/// DESIGN.md); every entry is written as a base object.
pub struct AssembledObject<'a> {
    pub id: ObjectId,
    pub kind: Kind,
    pub payload: &'a [u8],
}

/// Assemble a complete pack byte stream, / : magic, version,
/// count, entries, then a trailing SHA-1 over everything before it.
/// Progress ticks once per entry written; pass [`Discard`] via
/// [`assemble`] when the caller has no progress sink.
pub fn assemble_with_progress<'a>(
    objects: impl IntoIterator<Item = AssembledObject<'a>>,
    progress: &mut impl Progress,
) -> Result<Vec<u8>, Error> {
    let objects: Vec<_> = objects.into_iter().collect();
    let count: u32 = objects
        .len()
        .try_into()
        .map_err(|_| Error::TooManyObjects(objects.len()))?;

    progress.init(Some(objects.len()), Some("objects"));
    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&VERSION.to_be_bytes());
    out.extend_from_slice(&count.to_be_bytes());
    for object in &objects {
        let header = Header::from_kind(object.kind);
        out.extend_from_slice(&data::encode_entry(&header, object.payload));
        progress.inc();
    }
    let mut hasher = Hasher::default();
    hasher.update(&out);
    out.extend_from_slice(hasher.digest().as_bytes());
    Ok(out)
}

/// [`assemble_with_progress`] with progress reporting discarded.
pub fn assemble<'a>(objects: impl IntoIterator<Item = AssembledObject<'a>>) -> Result<Vec<u8>, Error> {
    assemble_with_progress(objects, &mut Discard)
}

/// Validate the 12-byte pack header and return `(version, declared count)`.
pub fn parse_header(data: &[u8]) -> Result<(u32, u32), Error> {
    if data.len() < 12 || &data[0..4] != MAGIC {
        return Err(Error::BadMagic);
    }
    let version = u32::from_be_bytes(data[4..8].try_into().expect("4 bytes"));
    if version != VERSION && version != 3 {
        return Err(Error::UnsupportedVersion(version));
    }
    let count = u32::from_be_bytes(data[8..12].try_into().expect("4 bytes"));
    Ok((version, count))
}

/// One parsed-but-unresolved pack entry: its header, its decompressed
/// payload (the object's bytes for a base entry, or the delta's bytes for
/// `OFS_DELTA`/`REF_DELTA`), and where it sits in the pack.
pub struct ParsedEntry {
    pub pack_offset: u64,
    pub header: Header,
    pub payload: Vec<u8>,
}

/// Parse every entry out of a full pack byte stream and verify the
/// trailing checksum, without resolving any deltas yet.
pub fn parse_entries(data: &[u8]) -> Result<(Vec<ParsedEntry>, ObjectId), Error> {
    let (_version, count) = parse_header(data)?;
    let mut pos = 12usize;
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        if pos >= data.len() {
            return Err(Error::Truncated {
                expected: count,
                actual: entries.len() as u32,
            });
        }
        let pack_offset = pos as u64;
        let (header, payload, used) = data::decode_entry(&data[pos..])?;
        pos += used;
        entries.push(ParsedEntry {
            pack_offset,
            header,
            payload,
        });
    }
    if pos + TRAILER_LEN > data.len() {
        return Err(Error::Truncated {
            expected: count,
            actual: entries.len() as u32,
        });
    }
    let trailer = ObjectId::from_bytes(&data[pos..pos + TRAILER_LEN]).expect("20 bytes");
    let mut hasher = Hasher::default();
    hasher.update(&data[..pos]);
    if hasher.digest() != trailer {
        return Err(Error::ChecksumMismatch);
    }
    Ok((entries, trailer))
}

/// Every object an ingest produced, keyed by the id it hashes to, plus the
/// pack's trailing checksum. Nothing is written to a store until the
/// caller consumes this value — ingest itself never mutates anything,
/// which is what makes it fail-atomic.
pub struct Summary {
    pub trailer: ObjectId,
    pub objects: Vec<(ObjectId, Kind, Vec<u8>)>,
}

impl Summary {
    pub fn object_ids(&self) -> impl Iterator<Item = &ObjectId> {
        self.objects.iter().map(|(id, _, _)| id)
    }
}

/// Looks up an already-stored object by id, for resolving `REF_DELTA` bases
/// that weren't defined earlier in the same pack. Thin packs (deltas whose
/// base the ingesting side doesn't have at all) are out of scope: such a pack fails ingest rather
/// than being buffered for a later retry (see DESIGN.md's Open Question
/// decision).
pub trait ExternalObjects {
    fn find(&self, id: &oid) -> Option<(Kind, Vec<u8>)>;
}

/// Parse a pack and resolve every `OFS_DELTA`/`REF_DELTA` chain against the
/// objects defined earlier in the same pack (for both kinds) or already
/// present in `external` (for `REF_DELTA` only). Progress ticks once per
/// entry resolved; pass [`Discard`] via [`ingest`] when the caller has no
/// progress sink.
pub fn ingest_with_progress(data: &[u8], external: &impl ExternalObjects, progress: &mut impl Progress) -> Result<Summary, Error> {
    let (entries, trailer) = parse_entries(data)?;
    progress.init(Some(entries.len()), Some("entries"));
    let mut by_offset: HashMap<u64, (Kind, Vec<u8>)> = HashMap::with_capacity(entries.len());
    let mut by_id: HashMap<ObjectId, (Kind, Vec<u8>)> = HashMap::with_capacity(entries.len());
    let mut objects = Vec::with_capacity(entries.len());

    for entry in &entries {
        let (kind, bytes) = match &entry.header {
            Header::Blob | Header::Tree | Header::Commit | Header::Tag => {
                (entry.header.to_kind().expect("base kind"), entry.payload.clone())
            }
            Header::OfsDelta { base_distance } => {
                let base_offset = Header::verified_base_pack_offset(entry.pack_offset, *base_distance)
                    .ok_or(Error::BadOfsDeltaBase(entry.pack_offset))?;
                let (base_kind, base_bytes) =
                    by_offset.get(&base_offset).cloned().ok_or(Error::BadOfsDeltaBase(entry.pack_offset))?;
                (base_kind, crate::delta::apply_git_delta(&base_bytes, &entry.payload)?)
            }
            Header::RefDelta { base_id } => {
                let (base_kind, base_bytes) = by_id
                    .get(base_id)
                    .cloned()
                    .or_else(|| external.find(base_id.as_oid()))
                    .ok_or_else(|| Error::UnresolvedRefDelta(entry.pack_offset, *base_id))?;
                (base_kind, crate::delta::apply_git_delta(&base_bytes, &entry.payload)?)
            }
        };
        let id = git_object::framing::hash_of(kind, &bytes);
        by_offset.insert(entry.pack_offset, (kind, bytes.clone()));
        by_id.insert(id, (kind, bytes.clone()));
        objects.push((id, kind, bytes));
        progress.inc();
    }

    Ok(Summary { trailer, objects })
}

/// [`ingest_with_progress`] with progress reporting discarded.
pub fn ingest(data: &[u8], external: &impl ExternalObjects) -> Result<Summary, Error> {
    ingest_with_progress(data, external, &mut Discard)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoExternal;
    impl ExternalObjects for NoExternal {
        fn find(&self, _id: &oid) -> Option<(Kind, Vec<u8>)> {
            None
        }
    }

    fn blob_payload(content: &[u8]) -> Vec<u8> {
        content.to_vec()
    }

    #[test]
    fn assemble_then_ingest_roundtrips_base_objects() {
        let blob = blob_payload(b"hello pack");
        let blob_id = git_object::framing::hash_of(Kind::Blob, &blob);
        let packed = assemble([AssembledObject {
            id: blob_id,
            kind: Kind::Blob,
            payload: &blob,
        }])
        .unwrap();

        let summary = ingest(&packed, &NoExternal).unwrap();
        assert_eq!(summary.objects.len(), 1);
        assert_eq!(summary.objects[0].0, blob_id);
        assert_eq!(summary.objects[0].2, blob);
    }

    #[test]
    fn corrupt_trailer_is_rejected() {
        let blob = blob_payload(b"data");
        let blob_id = git_object::framing::hash_of(Kind::Blob, &blob);
        let mut packed = assemble([AssembledObject {
            id: blob_id,
            kind: Kind::Blob,
            payload: &blob,
        }])
        .unwrap();
        let last = packed.len() - 1;
        packed[last] ^= 0xff;
        assert!(matches!(ingest(&packed, &NoExternal), Err(Error::ChecksumMismatch)));
    }

    #[test]
    fn ofs_delta_resolves_against_earlier_entry_in_same_pack() {
        let base = blob_payload(b"Hello, World!");
        let base_id = git_object::framing::hash_of(Kind::Blob, &base);
        let target = blob_payload(b"Hello, Universe!");
        let target_id = git_object::framing::hash_of(Kind::Blob, &target);

        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&VERSION.to_be_bytes());
        out.extend_from_slice(&2u32.to_be_bytes());

        let base_offset = out.len() as u64;
        out.extend_from_slice(&data::encode_entry(&Header::Blob, &base));

        let delta_offset = out.len() as u64;
        let delta_payload = crate::delta::create_git_delta(&base, &target);
        out.extend_from_slice(&data::encode_entry(
            &Header::OfsDelta {
                base_distance: delta_offset - base_offset,
            },
            &delta_payload,
        ));

        let mut hasher = Hasher::default();
        hasher.update(&out);
        out.extend_from_slice(hasher.digest().as_bytes());

        let summary = ingest(&out, &NoExternal).unwrap();
        assert_eq!(summary.objects.len(), 2);
        assert!(summary.object_ids().any(|id| *id == base_id));
        let resolved = summary.objects.iter().find(|(id, _, _)| *id == target_id);
        assert_eq!(resolved.map(|(_, _, bytes)| bytes.clone()), Some(target));
    }

    #[test]
    fn unresolvable_ref_delta_fails_ingest() {
        let missing_base = git_hash::EMPTY_BLOB;
        let delta_payload = crate::delta::create_git_delta(b"x", b"y");
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&VERSION.to_be_bytes());
        out.extend_from_slice(&1u32.to_be_bytes());
        out.extend_from_slice(&data::encode_entry(
            &Header::RefDelta { base_id: missing_base },
            &delta_payload,
        ));
        let mut hasher = Hasher::default();
        hasher.update(&out);
        out.extend_from_slice(hasher.digest().as_bytes());

        assert!(matches!(ingest(&out, &NoExternal), Err(Error::UnresolvedRefDelta(_, _))));
    }
}
