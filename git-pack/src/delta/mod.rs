//! The delta codec: range computation shared by both wire formats,
//! the two wire formats themselves, and block/streaming application.

pub mod apply;
pub mod fossil_format;
pub mod git_format;
pub mod instruction;
pub mod range;

pub use instruction::Instruction;
pub use range::Range;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("delta instruction stream ended before the expected length")]
    Truncated,
    #[error("delta instruction byte was invalid")]
    InvalidInstruction,
    #[error("delta copy instruction addresses bytes outside the base")]
    CopyOutOfBounds,
    #[error("applying the delta produced {actual} bytes, expected {expected}")]
    TruncatedDelta { expected: usize, actual: usize },
    #[error("delta checksum did not match the reconstructed target")]
    ChecksumMismatch,
}

/// Compute ranges, turn them into instructions, and encode as a format-A
/// delta in one call — the common path for producing a pack entry's delta
/// payload.
pub fn create_git_delta(source: &[u8], target: &[u8]) -> Vec<u8> {
    let ranges = range::compute_ranges(source, target);
    let instructions = instruction::from_ranges(target, &ranges);
    git_format::encode(source.len() as u64, target.len() as u64, &instructions)
}

/// Apply a format-A delta to `source`, returning the reconstructed target.
pub fn apply_git_delta(source: &[u8], delta: &[u8]) -> Result<Vec<u8>, Error> {
    let (_base_size, result_size, instructions) = git_format::decode(delta)?;
    let result = apply::apply_block(source, &instructions)?;
    if result.len() as u64 != result_size {
        return Err(Error::TruncatedDelta {
            expected: result_size as usize,
            actual: result.len(),
        });
    }
    Ok(result)
}

/// Convert a format-A delta to format B. `target` is needed to compute the
/// trailing checksum Fossil-style deltas carry instead of an upfront size.
pub fn git_to_fossil(git_delta: &[u8], target: &[u8]) -> Result<Vec<u8>, Error> {
    let (_base_size, _result_size, instructions) = git_format::decode(git_delta)?;
    Ok(fossil_format::encode(&instructions, target))
}

/// Convert a format-B delta back to format A. Format B never carries
/// `baseSize`, so it must be supplied explicitly by the caller.
pub fn fossil_to_git(fossil_delta: &[u8], base_size: u64) -> Result<Vec<u8>, Error> {
    let (instructions, _checksum) = fossil_format::decode(fossil_delta)?;
    let result_size = instruction::result_len(&instructions) as u64;
    Ok(git_format::encode(base_size, result_size, &instructions))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_reproduces_target_byte_exactly() {
        let source = b"Hello, World!".to_vec();
        let target = b"Hello, Universe!".to_vec();
        let delta = create_git_delta(&source, &target);
        let result = apply_git_delta(&source, &delta).unwrap();
        assert_eq!(result, target);
        assert_eq!(
            git_object::framing::hash_of(git_object::Kind::Blob, &result),
            git_object::framing::hash_of(git_object::Kind::Blob, &target)
        );
    }

    #[test]
    fn format_a_converts_to_b_and_back() {
        let source = b"the quick brown fox jumps over the lazy dog".to_vec();
        let target = b"the quick brown fox leaps over two lazy dogs".to_vec();
        let delta_a = create_git_delta(&source, &target);

        let delta_b = git_to_fossil(&delta_a, &target).unwrap();
        let (instructions_b, checksum) = fossil_format::decode(&delta_b).unwrap();
        let reconstructed = apply::apply_block(&source, &instructions_b).unwrap();
        assert_eq!(reconstructed, target);
        fossil_format::verify_checksum(checksum, &reconstructed).unwrap();

        let delta_a_again = fossil_to_git(&delta_b, source.len() as u64).unwrap();
        let result = apply_git_delta(&source, &delta_a_again).unwrap();
        assert_eq!(result, target);
    }

    #[test]
    fn hash_is_preserved_across_application() {
        let source = vec![0u8; 4096];
        let mut target = source.clone();
        target.extend_from_slice(b"appended tail content");
        let delta = create_git_delta(&source, &target);
        let result = apply_git_delta(&source, &delta).unwrap();
        assert_eq!(
            git_object::framing::hash_of(git_object::Kind::Blob, &result),
            git_object::framing::hash_of(git_object::Kind::Blob, &target)
        );
    }
}
