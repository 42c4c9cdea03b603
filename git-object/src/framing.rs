//! The bit-exact object framing: `"<type> <size>\0<payload>"`, hashed with
//! SHA-1 to produce the object's id.

use git_hash::ObjectId;

use crate::Kind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("object header is missing its space separator")]
    MissingSpace,
    #[error("unknown object type {0:?}")]
    UnknownType(String),
    #[error("object header is missing its NUL terminator")]
    MissingNul,
    #[error("object header declares size {declared} but payload is {actual} bytes")]
    SizeMismatch { declared: usize, actual: usize },
    #[error("object size {0:?} is not a valid decimal number")]
    InvalidSize(String),
    #[error("object text is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("object header is missing its blank-line separator before the message")]
    MissingBlankLine,
    #[error("object is missing required field {0:?}")]
    MissingField(&'static str),
}

/// Frame `payload` as `"<kind> <len>\0<payload>"`.
pub fn frame(kind: Kind, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(kind.as_str().len() + 1 + 20 + 1 + payload.len());
    out.extend_from_slice(kind.as_str().as_bytes());
    out.push(b' ');
    out.extend_from_slice(payload.len().to_string().as_bytes());
    out.push(0);
    out.extend_from_slice(payload);
    out
}

/// Compute the id of `payload` as if it were framed with `kind` (invariant
/// I1), without materializing the framed bytes twice.
pub fn hash_of(kind: Kind, payload: &[u8]) -> ObjectId {
    let mut hasher = git_hash::Hasher::default();
    hasher.update(kind.as_str().as_bytes());
    hasher.update(b" ");
    hasher.update(payload.len().to_string().as_bytes());
    hasher.update(b"\0");
    hasher.update(payload);
    hasher.digest()
}

/// Split framed bytes into `(kind, payload)`, validating the declared size
/// against the actual payload length.
pub fn parse(framed: &[u8]) -> Result<(Kind, &[u8]), Error> {
    let space = framed.iter().position(|&b| b == b' ').ok_or(Error::MissingSpace)?;
    let kind = Kind::from_bytes(&framed[..space])
        .ok_or_else(|| Error::UnknownType(String::from_utf8_lossy(&framed[..space]).into_owned()))?;
    let nul = framed[space + 1..]
        .iter()
        .position(|&b| b == 0)
        .ok_or(Error::MissingNul)?
        + space
        + 1;
    let size_str = std::str::from_utf8(&framed[space + 1..nul])
        .map_err(|_| Error::InvalidSize(String::from_utf8_lossy(&framed[space + 1..nul]).into_owned()))?;
    let declared: usize = size_str
        .parse()
        .map_err(|_| Error::InvalidSize(size_str.to_owned()))?;
    let payload = &framed[nul + 1..];
    if payload.len() != declared {
        return Err(Error::SizeMismatch {
            declared,
            actual: payload.len(),
        });
    }
    Ok((kind, payload))
}
