//! Content-addressing primitives shared by every other `git-*` crate: the
//! owned [`ObjectId`], the borrowed [`oid`], and a thin wrapper around SHA-1.
#![deny(rust_2018_idioms)]
#![deny(unsafe_code)]

use std::fmt;
use std::str::FromStr;

mod hasher;
pub use hasher::Hasher;

/// The number of bytes in a SHA-1 digest.
pub const SIZE_OF_SHA1_DIGEST: usize = 20;

/// Errors that can occur while parsing or decoding an [`ObjectId`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid hex digit at offset {offset}")]
    InvalidHex { offset: usize },
    #[error("expected a hex string of length {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// A content hash, owned and always SHA-1 sized for now.
///
/// This is I1's witness type: every object store operation produces or
/// consumes one of these, and two `ObjectId`s are equal iff the bytes they
/// were hashed from are equal.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; SIZE_OF_SHA1_DIGEST]);

/// The fixed id of the canonical empty tree.
pub const EMPTY_TREE: ObjectId = ObjectId(*b"\x4b\x82\x5d\xc6\x42\xcb\x6e\xb9\xa0\x60\xe5\x4b\xf8\xd6\x92\x88\xfb\xee\x49\x04");
/// The fixed id of the canonical empty blob.
pub const EMPTY_BLOB: ObjectId = ObjectId(*b"\xe6\x9d\xe2\x9b\xb2\xd1\xd6\x43\x4b\x8b\x29\xae\x77\x5a\xd8\xc2\xe4\x8c\x53\x91");

impl ObjectId {
    /// Create an id from a raw 20-byte digest.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != SIZE_OF_SHA1_DIGEST {
            return Err(Error::InvalidLength {
                expected: SIZE_OF_SHA1_DIGEST,
                actual: bytes.len(),
            });
        }
        let mut buf = [0u8; SIZE_OF_SHA1_DIGEST];
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }

    /// Create an id from an already correctly sized array. Infallible.
    pub fn from_array(bytes: [u8; SIZE_OF_SHA1_DIGEST]) -> Self {
        Self(bytes)
    }

    /// Parse a 40-character lowercase hex string into an id.
    pub fn from_hex(hex_str: impl AsRef<[u8]>) -> Result<Self, Error> {
        let hex_str = hex_str.as_ref();
        if hex_str.len() != SIZE_OF_SHA1_DIGEST * 2 {
            return Err(Error::InvalidLength {
                expected: SIZE_OF_SHA1_DIGEST * 2,
                actual: hex_str.len(),
            });
        }
        let mut buf = [0u8; SIZE_OF_SHA1_DIGEST];
        hex::decode_to_slice(hex_str, &mut buf).map_err(|_| Error::InvalidHex { offset: 0 })?;
        Ok(Self(buf))
    }

    /// Compute the id of `data` directly, without framing. Used internally
    /// by hashers that already produced framed bytes.
    pub fn compute_hash(data: &[u8]) -> Self {
        let mut hasher = Hasher::default();
        hasher.update(data);
        hasher.digest()
    }

    /// Borrow this id as an [`oid`].
    pub fn as_oid(&self) -> &oid {
        oid::from_bytes_unchecked(&self.0)
    }

    /// The raw 20 bytes of this id.
    pub fn as_bytes(&self) -> &[u8; SIZE_OF_SHA1_DIGEST] {
        &self.0
    }

    /// Hex-encode this id into a fresh `String`.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for ObjectId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::ops::Deref for ObjectId {
    type Target = oid;
    fn deref(&self) -> &Self::Target {
        self.as_oid()
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectId").field(&self.to_hex()).finish()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// A borrowed, unsized view of a 20-byte object id, analogous to how `str`
/// relates to `String`.
#[repr(transparent)]
pub struct oid([u8]);

impl oid {
    #[allow(unsafe_code)]
    fn from_bytes_unchecked(bytes: &[u8]) -> &Self {
        // SAFETY: `oid` is `#[repr(transparent)]` over `[u8]`.
        unsafe { &*(bytes as *const [u8] as *const Self) }
    }

    /// Borrow a byte slice as an `oid`, failing if its length isn't 20.
    pub fn try_from_bytes(bytes: &[u8]) -> Result<&Self, Error> {
        if bytes.len() != SIZE_OF_SHA1_DIGEST {
            return Err(Error::InvalidLength {
                expected: SIZE_OF_SHA1_DIGEST,
                actual: bytes.len(),
            });
        }
        Ok(Self::from_bytes_unchecked(bytes))
    }

    /// The raw bytes of this id.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Copy this borrowed id into an owned [`ObjectId`].
    pub fn to_owned(&self) -> ObjectId {
        ObjectId::from_bytes(&self.0).expect("oid is always 20 bytes")
    }

    /// Hex-encode this id into a fresh `String`.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl PartialEq for oid {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for oid {}

impl fmt::Debug for oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("oid").field(&self.to_hex()).finish()
    }
}

impl fmt::Display for oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl ToOwned for oid {
    type Owned = ObjectId;
    fn to_owned(&self) -> ObjectId {
        oid::to_owned(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tree_and_blob_hex_match_well_known_values() {
        assert_eq!(EMPTY_TREE.to_hex(), "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
        assert_eq!(EMPTY_BLOB.to_hex(), "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391");
    }

    #[test]
    fn hex_roundtrip() {
        let id = ObjectId::from_hex("4b825dc642cb6eb9a060e54bf8d69288fbee4904").unwrap();
        assert_eq!(id.to_hex(), "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
        assert_eq!(id, EMPTY_TREE);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(matches!(
            ObjectId::from_hex("abcd"),
            Err(Error::InvalidLength { expected: 40, actual: 4 })
        ));
    }
}
