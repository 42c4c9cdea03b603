//! The instruction stream both wire formats ultimately encode: a sequence
//! of copies from the base and literal inserts, independent of how either
//! format frames them on the wire.

/// One reconstruction step: copy `len` bytes from the base starting at
/// `offset`, or insert literal bytes taken directly from the instruction
/// stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Copy { offset: usize, len: usize },
    Insert(Vec<u8>),
}

/// Turn computed [`super::range::Range`]s into instructions against
/// `source`/`target`, with no wire-specific chunking applied yet.
pub fn from_ranges(target: &[u8], ranges: &[super::range::Range]) -> Vec<Instruction> {
    ranges
        .iter()
        .map(|range| match *range {
            super::range::Range::Source { start, len } => Instruction::Copy { offset: start, len },
            super::range::Range::Target { start, len } => Instruction::Insert(target[start..start + len].to_vec()),
        })
        .collect()
}

/// Total bytes the instructions would produce when applied.
pub fn result_len(instructions: &[Instruction]) -> usize {
    instructions
        .iter()
        .map(|i| match i {
            Instruction::Copy { len, .. } => *len,
            Instruction::Insert(bytes) => bytes.len(),
        })
        .sum()
}
