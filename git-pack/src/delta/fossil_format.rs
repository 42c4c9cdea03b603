//! Wire format B: a Fossil-style framed sequence of copy/insert
//! blocks with a trailing checksum over the reconstructed target, used
//! when a reader doesn't know base/result sizes up front. Each block is
//! self-delimiting (a tag byte plus LEB128 length(s)), so the only thing
//! that needs to be known ahead of decoding is where the 4-byte trailing
//! checksum begins — which is simply "the last 4 bytes of the buffer".

use super::instruction::Instruction;
use super::Error;
use git_features::varint::leb128;

const TAG_COPY: u8 = 0;
const TAG_INSERT: u8 = 1;
const CHECKSUM_LEN: usize = 4;

/// Encode `instructions` as a format-B delta, with a trailing CRC32 of
/// `target` (the bytes the instructions are expected to reconstruct).
pub fn encode(instructions: &[Instruction], target: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    for instruction in instructions {
        match instruction {
            Instruction::Copy { offset, len } => {
                out.push(TAG_COPY);
                leb128::encode(*offset as u64, &mut out);
                leb128::encode(*len as u64, &mut out);
            }
            Instruction::Insert(bytes) => {
                out.push(TAG_INSERT);
                leb128::encode(bytes.len() as u64, &mut out);
                out.extend_from_slice(bytes);
            }
        }
    }
    let checksum = git_features::hash::crc32(target);
    out.extend_from_slice(&checksum.to_be_bytes());
    out
}

/// Decode a format-B delta into its instructions and the trailing checksum.
/// Does not itself verify the checksum — call [`verify_checksum`] against
/// the actually-reconstructed bytes once the instructions have been
/// applied.
pub fn decode(data: &[u8]) -> Result<(Vec<Instruction>, u32), Error> {
    if data.len() < CHECKSUM_LEN {
        return Err(Error::Truncated);
    }
    let body_len = data.len() - CHECKSUM_LEN;
    let checksum = u32::from_be_bytes(data[body_len..].try_into().expect("4 bytes"));

    let mut pos = 0;
    let mut instructions = Vec::new();
    while pos < body_len {
        let tag = data[pos];
        pos += 1;
        match tag {
            TAG_COPY => {
                let (offset, used) = leb128::decode(&data[pos..body_len]).map_err(|_| Error::Truncated)?;
                pos += used;
                let (len, used) = leb128::decode(&data[pos..body_len]).map_err(|_| Error::Truncated)?;
                pos += used;
                instructions.push(Instruction::Copy {
                    offset: offset as usize,
                    len: len as usize,
                });
            }
            TAG_INSERT => {
                let (len, used) = leb128::decode(&data[pos..body_len]).map_err(|_| Error::Truncated)?;
                pos += used;
                let end = pos.checked_add(len as usize).ok_or(Error::Truncated)?;
                if end > body_len {
                    return Err(Error::Truncated);
                }
                instructions.push(Instruction::Insert(data[pos..end].to_vec()));
                pos = end;
            }
            _ => return Err(Error::InvalidInstruction),
        }
    }
    Ok((instructions, checksum))
}

/// Verify a decoded checksum against the bytes actually reconstructed.
pub fn verify_checksum(checksum: u32, reconstructed_target: &[u8]) -> Result<(), Error> {
    let actual = git_features::hash::crc32(reconstructed_target);
    if actual == checksum {
        Ok(())
    } else {
        Err(Error::ChecksumMismatch)
    }
}
