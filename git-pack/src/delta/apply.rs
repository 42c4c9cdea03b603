//! Applying a decoded instruction stream back onto a base: a block
//! form that addresses the base by a plain slice, and a streaming form
//! that reads the base through random access and emits output
//! incrementally, the way a pack reader resolving a delta chain does
//! without materializing the whole base in memory twice.

use super::instruction::Instruction;
use super::{git_format, Error};

/// Apply `instructions` against `base` in one shot.
pub fn apply_block(base: &[u8], instructions: &[Instruction]) -> Result<Vec<u8>, Error> {
    let mut out = Vec::with_capacity(base.len());
    for instruction in instructions {
        match instruction {
            Instruction::Copy { offset, len } => {
                let end = offset.checked_add(*len).ok_or(Error::CopyOutOfBounds)?;
                let slice = base.get(*offset..end).ok_or(Error::CopyOutOfBounds)?;
                out.extend_from_slice(slice);
            }
            Instruction::Insert(bytes) => out.extend_from_slice(bytes),
        }
    }
    Ok(out)
}

/// A random-access view of the delta's base, as `applyGitDeltaStreaming`
/// needs: each copy instruction asks for an arbitrary byte window
/// rather than requiring the whole base to be buffered up front.
pub trait RandomAccessSource {
    fn read_at(&mut self, start: usize, len: usize) -> Result<Vec<u8>, Error>;
}

impl RandomAccessSource for &[u8] {
    fn read_at(&mut self, start: usize, len: usize) -> Result<Vec<u8>, Error> {
        let end = start.checked_add(len).ok_or(Error::CopyOutOfBounds)?;
        self.get(start..end).map(<[u8]>::to_vec).ok_or(Error::CopyOutOfBounds)
    }
}

/// Apply a format-A delta instruction-by-instruction, issuing a
/// random-access read against `base` for each copy and emitting the
/// reconstructed target as a sequence of chunks. Fails with
/// [`Error::TruncatedDelta`] if the total emitted length doesn't match the
/// delta's declared `resultSize`.
pub fn apply_git_delta_streaming(mut base: impl RandomAccessSource, delta: &[u8]) -> Result<Vec<Vec<u8>>, Error> {
    let (_base_size, result_size, instructions) = git_format::decode(delta)?;
    let mut chunks = Vec::with_capacity(instructions.len());
    let mut emitted: u64 = 0;
    for instruction in instructions {
        let chunk = match instruction {
            Instruction::Copy { offset, len } => base.read_at(offset, len)?,
            Instruction::Insert(bytes) => bytes,
        };
        emitted += chunk.len() as u64;
        chunks.push(chunk);
    }
    if emitted != result_size {
        return Err(Error::TruncatedDelta {
            expected: result_size as usize,
            actual: emitted as usize,
        });
    }
    Ok(chunks)
}

/// Flatten the chunks [`apply_git_delta_streaming`] yields into one buffer,
/// for callers that don't need the incremental form.
pub fn merge_chunks(chunks: Vec<Vec<u8>>) -> Vec<u8> {
    chunks.concat()
}
