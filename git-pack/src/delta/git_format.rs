//! Wire format A: `varint(baseSize) | varint(resultSize) |
//! instructions*`. Copy instructions address the base by absolute offset
//! and are capped at 64 KiB each; insert instructions carry their literal
//! bytes inline and are capped at 127 B each. Larger ranges are chunked by
//! the encoder.

use super::instruction::Instruction;
use super::Error;
use git_features::varint::leb128;

/// Maximum bytes a single copy instruction can address.
pub const MAX_COPY_LEN: usize = 0x1_0000;
/// Maximum bytes a single insert instruction can carry inline.
pub const MAX_INSERT_LEN: usize = 0x7f;

/// Encode `instructions` as a complete format-A delta, given the base and
/// result sizes the reader needs up front.
pub fn encode(base_size: u64, result_size: u64, instructions: &[Instruction]) -> Vec<u8> {
    let mut out = Vec::new();
    leb128::encode(base_size, &mut out);
    leb128::encode(result_size, &mut out);
    for instruction in instructions {
        match instruction {
            Instruction::Copy { offset, len } => encode_copy_chunked(&mut out, *offset, *len),
            Instruction::Insert(bytes) => encode_insert_chunked(&mut out, bytes),
        }
    }
    out
}

fn encode_copy_chunked(out: &mut Vec<u8>, offset: usize, len: usize) {
    let mut remaining = len;
    let mut current_offset = offset;
    while remaining > 0 {
        let chunk_len = remaining.min(MAX_COPY_LEN);
        encode_copy(out, current_offset as u32, chunk_len as u32);
        current_offset += chunk_len;
        remaining -= chunk_len;
    }
}

fn encode_insert_chunked(out: &mut Vec<u8>, bytes: &[u8]) {
    for chunk in bytes.chunks(MAX_INSERT_LEN) {
        if chunk.is_empty() {
            continue;
        }
        out.push(chunk.len() as u8);
        out.extend_from_slice(chunk);
    }
}

fn encode_copy(out: &mut Vec<u8>, offset: u32, len: u32) {
    let offset_bytes = offset.to_le_bytes();
    // A declared size of 0 means 64 KiB; represent a real 64 KiB copy with
    // all size bytes absent.
    let encoded_len = if len == MAX_COPY_LEN as u32 { 0 } else { len };
    let len_bytes = encoded_len.to_le_bytes();

    let mut cmd: u8 = 0x80;
    let mut payload = Vec::with_capacity(7);
    for (i, &byte) in offset_bytes.iter().enumerate() {
        if byte != 0 {
            cmd |= 1 << i;
            payload.push(byte);
        }
    }
    for (i, &byte) in len_bytes[..3].iter().enumerate() {
        if byte != 0 {
            cmd |= 1 << (4 + i);
            payload.push(byte);
        }
    }
    out.push(cmd);
    out.extend_from_slice(&payload);
}

fn decode_copy(cmd: u8, data: &[u8]) -> Result<(Instruction, usize), Error> {
    let mut consumed = 0usize;
    let mut offset_bytes = [0u8; 4];
    for i in 0..4 {
        if cmd & (1 << i) != 0 {
            offset_bytes[i] = *data.get(consumed).ok_or(Error::Truncated)?;
            consumed += 1;
        }
    }
    let mut len_bytes = [0u8; 4];
    for i in 0..3 {
        if cmd & (1 << (4 + i)) != 0 {
            len_bytes[i] = *data.get(consumed).ok_or(Error::Truncated)?;
            consumed += 1;
        }
    }
    let offset = u32::from_le_bytes(offset_bytes);
    let mut len = u32::from_le_bytes(len_bytes);
    if len == 0 {
        len = MAX_COPY_LEN as u32;
    }
    Ok((
        Instruction::Copy {
            offset: offset as usize,
            len: len as usize,
        },
        consumed,
    ))
}

/// Decode a complete format-A delta into `(baseSize, resultSize,
/// instructions)`.
pub fn decode(data: &[u8]) -> Result<(u64, u64, Vec<Instruction>), Error> {
    let (base_size, consumed1) = leb128::decode(data).map_err(|_| Error::Truncated)?;
    let rest = &data[consumed1..];
    let (result_size, consumed2) = leb128::decode(rest).map_err(|_| Error::Truncated)?;
    let mut pos = consumed1 + consumed2;
    let mut instructions = Vec::new();
    while pos < data.len() {
        let cmd = data[pos];
        pos += 1;
        if cmd & 0x80 != 0 {
            let (instruction, used) = decode_copy(cmd, &data[pos..])?;
            pos += used;
            instructions.push(instruction);
        } else {
            let count = (cmd & 0x7f) as usize;
            if count == 0 {
                return Err(Error::InvalidInstruction);
            }
            let end = pos.checked_add(count).ok_or(Error::Truncated)?;
            if end > data.len() {
                return Err(Error::Truncated);
            }
            instructions.push(Instruction::Insert(data[pos..end].to_vec()));
            pos = end;
        }
    }
    Ok((base_size, result_size, instructions))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_simple_instructions() {
        let instructions = vec![
            Instruction::Copy { offset: 0, len: 5 },
            Instruction::Insert(b"hi".to_vec()),
            Instruction::Copy { offset: 100, len: 10 },
        ];
        let bytes = encode(13, 17, &instructions);
        let (base_size, result_size, decoded) = decode(&bytes).unwrap();
        assert_eq!(base_size, 13);
        assert_eq!(result_size, 17);
        assert_eq!(decoded, instructions);
    }

    #[test]
    fn chunks_copy_instructions_over_64kib() {
        let instructions = vec![Instruction::Copy { offset: 0, len: MAX_COPY_LEN * 2 + 5 }];
        let bytes = encode(0, MAX_COPY_LEN as u64 * 2 + 5, &instructions);
        let (_, _, decoded) = decode(&bytes).unwrap();
        assert_eq!(decoded.len(), 3);
        assert_eq!(super::super::instruction::result_len(&decoded), MAX_COPY_LEN * 2 + 5);
    }

    #[test]
    fn chunks_insert_instructions_over_127_bytes() {
        let payload = vec![b'x'; 300];
        let instructions = vec![Instruction::Insert(payload.clone())];
        let bytes = encode(0, 300, &instructions);
        let (_, _, decoded) = decode(&bytes).unwrap();
        assert_eq!(decoded.len(), 3);
        let rebuilt: Vec<u8> = decoded
            .into_iter()
            .flat_map(|i| match i {
                Instruction::Insert(b) => b,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(rebuilt, payload);
    }

    #[test]
    fn rejects_zero_length_insert_as_invalid() {
        assert!(matches!(decode(&[0, 0, 0x00]), Err(Error::InvalidInstruction)));
    }

    #[test]
    fn a_copy_declaring_zero_size_means_64kib() {
        let mut bytes = vec![0, 0]; // base/result size placeholders (leb128 zero)
        // cmd byte: copy with no offset bytes, no size bytes present -> offset=0, len=0 -> 64KiB
        bytes.push(0x80);
        let (_, _, decoded) = decode(&bytes).unwrap();
        assert_eq!(decoded, vec![Instruction::Copy { offset: 0, len: MAX_COPY_LEN }]);
    }
}
