//! Pack entry encoding: the varint-packed type+size header, the
//! zlib-compressed payload, and the two delta entry kinds (`OFS_DELTA`
//! addressing its base by pack-relative offset, `REF_DELTA` by object id).

use git_features::varint::offset as offset_varint;
use git_hash::ObjectId;
use git_object::Kind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("pack entry header is truncated")]
    Truncated,
    #[error("pack entry declares unknown type tag {0}")]
    UnknownType(u8),
    #[error(transparent)]
    Varint(#[from] git_features::varint::Error),
    #[error(transparent)]
    Zlib(#[from] git_features::zlib::Error),
}

/// A pack entry's header, decoded from the varint-packed type+size prefix
/// plus whatever extra bytes its kind requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    Blob,
    Tree,
    Commit,
    Tag,
    /// Base is `base_distance` bytes before this entry's own pack offset.
    OfsDelta { base_distance: u64 },
    /// Base is named by its object id directly.
    RefDelta { base_id: ObjectId },
}

impl Header {
    fn type_tag(&self) -> u8 {
        match self {
            Header::Blob => 1,
            Header::Tree => 2,
            Header::Commit => 3,
            Header::Tag => 4,
            Header::OfsDelta { .. } => 6,
            Header::RefDelta { .. } => 7,
        }
    }

    pub fn is_base(&self) -> bool {
        matches!(self, Header::Blob | Header::Tree | Header::Commit | Header::Tag)
    }

    pub fn to_kind(&self) -> Option<Kind> {
        match self {
            Header::Blob => Some(Kind::Blob),
            Header::Tree => Some(Kind::Tree),
            Header::Commit => Some(Kind::Commit),
            Header::Tag => Some(Kind::Tag),
            Header::OfsDelta { .. } | Header::RefDelta { .. } => None,
        }
    }

    pub fn from_kind(kind: Kind) -> Self {
        match kind {
            Kind::Blob => Header::Blob,
            Kind::Tree => Header::Tree,
            Kind::Commit => Header::Commit,
            Kind::Tag => Header::Tag,
        }
    }

    /// `base_pack_offset = entry_pack_offset - base_distance`, or `None` if
    /// that would underflow (a corrupt pack).
    pub fn verified_base_pack_offset(entry_pack_offset: u64, base_distance: u64) -> Option<u64> {
        entry_pack_offset.checked_sub(base_distance)
    }
}

/// Encode `(header, uncompressed_size)` as the bytes that precede a pack
/// entry's zlib-compressed payload.
pub fn encode_header(header: &Header, uncompressed_size: u64) -> Vec<u8> {
    let mut out = Vec::new();
    let type_tag = header.type_tag();
    let mut remaining = uncompressed_size >> 4;
    let mut first = (type_tag << 4) | (uncompressed_size & 0x0f) as u8;
    if remaining != 0 {
        first |= 0x80;
    }
    out.push(first);
    while remaining != 0 {
        let mut byte = (remaining & 0x7f) as u8;
        remaining >>= 7;
        if remaining != 0 {
            byte |= 0x80;
        }
        out.push(byte);
    }
    match header {
        Header::OfsDelta { base_distance } => offset_varint::encode(*base_distance, &mut out),
        Header::RefDelta { base_id } => out.extend_from_slice(base_id.as_bytes()),
        _ => {}
    }
    out
}

/// Decode a pack entry header from the start of `data`, returning the
/// header, the declared uncompressed payload size, and how many bytes were
/// consumed.
pub fn decode_header(data: &[u8]) -> Result<(Header, u64, usize), Error> {
    let first = *data.first().ok_or(Error::Truncated)?;
    let type_tag = (first >> 4) & 0x7;
    let mut size = (first & 0x0f) as u64;
    let mut shift = 4u32;
    let mut pos = 1usize;
    let mut more = first & 0x80 != 0;
    while more {
        let byte = *data.get(pos).ok_or(Error::Truncated)?;
        size |= ((byte & 0x7f) as u64) << shift;
        shift += 7;
        more = byte & 0x80 != 0;
        pos += 1;
    }

    let header = match type_tag {
        1 => Header::Blob,
        2 => Header::Tree,
        3 => Header::Commit,
        4 => Header::Tag,
        6 => {
            let (base_distance, used) = offset_varint::decode(&data[pos..])?;
            pos += used;
            Header::OfsDelta { base_distance }
        }
        7 => {
            let id_bytes = data.get(pos..pos + git_hash::SIZE_OF_SHA1_DIGEST).ok_or(Error::Truncated)?;
            let base_id = ObjectId::from_bytes(id_bytes).expect("slice is exactly 20 bytes");
            pos += git_hash::SIZE_OF_SHA1_DIGEST;
            Header::RefDelta { base_id }
        }
        other => return Err(Error::UnknownType(other)),
    };
    Ok((header, size, pos))
}

/// Encode one full pack entry: header bytes followed by the zlib-compressed
/// payload.
pub fn encode_entry(header: &Header, payload: &[u8]) -> Vec<u8> {
    let mut out = encode_header(header, payload.len() as u64);
    out.extend_from_slice(&git_features::zlib::compress(payload, flate2::Compression::default()));
    out
}

/// Decode one full pack entry starting at the beginning of `data`, returning
/// the header, the decompressed payload, and how many bytes of `data` the
/// entry (header + compressed payload) occupied.
pub fn decode_entry(data: &[u8]) -> Result<(Header, Vec<u8>, usize), Error> {
    let (header, uncompressed_size, header_len) = decode_header(data)?;
    let (payload, compressed_len) = git_features::zlib::decompress_prefix(&data[header_len..], uncompressed_size as usize)?;
    Ok((header, payload, header_len + compressed_len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_header_roundtrips() {
        for (header, size) in [(Header::Blob, 0u64), (Header::Tree, 13), (Header::Commit, 4096), (Header::Tag, 1)] {
            let bytes = encode_header(&header, size);
            let (decoded, decoded_size, consumed) = decode_header(&bytes).unwrap();
            assert_eq!(decoded, header);
            assert_eq!(decoded_size, size);
            assert_eq!(consumed, bytes.len());
        }
    }

    #[test]
    fn ofs_delta_header_roundtrips() {
        let header = Header::OfsDelta { base_distance: 123_456 };
        let bytes = encode_header(&header, 222);
        let (decoded, size, _) = decode_header(&bytes).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(size, 222);
    }

    #[test]
    fn ref_delta_header_roundtrips() {
        let base_id = git_hash::EMPTY_BLOB;
        let header = Header::RefDelta { base_id };
        let bytes = encode_header(&header, 50);
        let (decoded, size, consumed) = decode_header(&bytes).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(size, 50);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn entry_roundtrips_through_compression() {
        let payload = b"tree deadbeef\nauthor a <a@b> 1 +0000\n\nhi\n".to_vec();
        let bytes = encode_entry(&Header::Commit, &payload);
        let (header, decoded_payload, consumed) = decode_entry(&bytes).unwrap();
        assert_eq!(header, Header::Commit);
        assert_eq!(decoded_payload, payload);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn decode_entry_reports_bytes_consumed_not_trailing_garbage() {
        let payload = b"blob payload".to_vec();
        let mut bytes = encode_entry(&Header::Blob, &payload);
        bytes.extend_from_slice(b"NEXT-ENTRY-HEADER");
        let (_, decoded, consumed) = decode_entry(&bytes).unwrap();
        assert_eq!(decoded, payload);
        assert!(consumed < bytes.len());
    }
}
