//! Range computation: given source bytes `S` and target bytes `T`,
//! find an ordered sequence of [`Range`]s that reconstruct `T` out of
//! copies from `S` and literal runs taken from `T` itself.
//!
//! Uses the classic rsync two-level hash: a cheap rolling checksum over
//! aligned `S` blocks to probe an index in O(1) amortized per byte of `T`,
//! confirmed by a short strong digest (and then the literal bytes
//! themselves) before trusting a match.

use std::collections::HashMap;

/// The default aligned-block size the index is built at.
pub const BLOCK_SIZE: usize = 16;

/// One piece of the reconstruction of `T`: either a copy from `S`, or a
/// literal run whose bytes are `T[start..start+len]` itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Range {
    Source { start: usize, len: usize },
    Target { start: usize, len: usize },
}

impl Range {
    pub fn len(&self) -> usize {
        match *self {
            Range::Source { len, .. } | Range::Target { len, .. } => len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Rolling weak checksum over a fixed-size window, in the spirit of
/// Tridgell's rsync algorithm: `a` is a running byte sum, `b` is a running
/// weighted sum, both updatable in O(1) as the window slides by one byte.
#[derive(Clone, Copy)]
struct RollingHash {
    a: u32,
    b: u32,
    len: u32,
}

impl RollingHash {
    fn new(window: &[u8]) -> Self {
        let len = window.len() as u32;
        let mut a = 0u32;
        let mut b = 0u32;
        for (i, &byte) in window.iter().enumerate() {
            a = a.wrapping_add(byte as u32);
            b = b.wrapping_add((len - i as u32) * byte as u32);
        }
        Self { a, b, len }
    }

    fn value(&self) -> u32 {
        (self.b << 16) | (self.a & 0xffff)
    }

    /// Slide the window forward by one byte: `old` leaves, `new` enters.
    fn roll(&mut self, old: u8, new: u8) {
        self.a = self.a.wrapping_sub(old as u32).wrapping_add(new as u32);
        self.b = self.b.wrapping_sub(self.len * old as u32).wrapping_add(self.a);
    }
}

/// A short, cheap-to-compare digest used to confirm a weak-hash hit before
/// falling back to a byte-by-byte comparison.
fn strong_hash(bytes: &[u8]) -> u64 {
    let mut hasher = git_hash::Hasher::default();
    hasher.update(bytes);
    let digest = hasher.digest();
    u64::from_be_bytes(digest.as_bytes()[..8].try_into().expect("8 bytes"))
}

/// Index of `source`'s non-overlapping, block-aligned chunks, keyed by weak
/// hash with a list of (strong hash, offset) candidates to disambiguate
/// collisions.
struct SourceIndex {
    block: usize,
    table: HashMap<u32, Vec<(u64, usize)>>,
}

impl SourceIndex {
    fn build(source: &[u8], block: usize) -> Self {
        let mut table: HashMap<u32, Vec<(u64, usize)>> = HashMap::new();
        let mut offset = 0;
        while offset + block <= source.len() {
            let chunk = &source[offset..offset + block];
            let weak = RollingHash::new(chunk).value();
            table.entry(weak).or_default().push((strong_hash(chunk), offset));
            offset += block;
        }
        Self { block, table }
    }

    /// Find a confirmed source offset whose first `self.block` bytes equal
    /// `window`, if the weak hash has any candidates at all.
    fn confirm(&self, weak: u32, window: &[u8], source: &[u8]) -> Option<usize> {
        let candidates = self.table.get(&weak)?;
        let strong = strong_hash(window);
        candidates
            .iter()
            .find(|&&(cand_strong, offset)| cand_strong == strong && &source[offset..offset + self.block] == window)
            .map(|&(_, offset)| offset)
    }
}

/// Compute the ranges that reconstruct `target` out of `source`,
pub fn compute_ranges(source: &[u8], target: &[u8]) -> Vec<Range> {
    compute_ranges_with_block(source, target, BLOCK_SIZE)
}

fn compute_ranges_with_block(source: &[u8], target: &[u8], block: usize) -> Vec<Range> {
    if target.is_empty() {
        return Vec::new();
    }
    if source.is_empty() || source.len() < block {
        return vec![Range::Target { start: 0, len: target.len() }];
    }

    let index = SourceIndex::build(source, block);
    let mut ranges = Vec::new();
    let mut literal_start = 0usize;
    let mut i = 0usize;
    let mut rolling: Option<RollingHash> = None;

    while i + block <= target.len() {
        let window = &target[i..i + block];
        let hash = match rolling {
            Some(h) => h,
            None => RollingHash::new(window),
        };
        rolling = Some(hash);

        if let Some(src_off) = index.confirm(hash.value(), window, source) {
            // Extend backward into the pending literal run.
            let mut back = 0usize;
            while back < i - literal_start && src_off > back && source[src_off - back - 1] == target[i - back - 1] {
                back += 1;
            }
            let match_src_start = src_off - back;
            let match_tgt_start = i - back;

            // Extend forward past the confirmed window.
            let mut fwd = block;
            while match_src_start + fwd < source.len()
                && match_tgt_start + fwd < target.len()
                && source[match_src_start + fwd] == target[match_tgt_start + fwd]
            {
                fwd += 1;
            }

            if match_tgt_start > literal_start {
                ranges.push(Range::Target {
                    start: literal_start,
                    len: match_tgt_start - literal_start,
                });
            }
            ranges.push(Range::Source {
                start: match_src_start,
                len: fwd,
            });

            i = match_tgt_start + fwd;
            literal_start = i;
            rolling = None; // resync: the window no longer slides contiguously
            continue;
        }

        // No match: slide the window by one byte, rolling the checksum
        // forward rather than recomputing it from scratch.
        if i + block < target.len() {
            let mut next = hash;
            next.roll(target[i], target[i + block]);
            rolling = Some(next);
        }
        i += 1;
    }

    if literal_start < target.len() {
        ranges.push(Range::Target {
            start: literal_start,
            len: target.len() - literal_start,
        });
    }

    merge_adjacent(ranges)
}

/// Merge adjacent ranges of the same kind whose coordinates are contiguous
///.
fn merge_adjacent(ranges: Vec<Range>) -> Vec<Range> {
    let mut out: Vec<Range> = Vec::with_capacity(ranges.len());
    for range in ranges {
        if let Some(last) = out.last_mut() {
            match (*last, range) {
                (Range::Source { start: s0, len: l0 }, Range::Source { start: s1, len: l1 }) if s0 + l0 == s1 => {
                    *last = Range::Source { start: s0, len: l0 + l1 };
                    continue;
                }
                (Range::Target { start: s0, len: l0 }, Range::Target { start: s1, len: l1 }) if s0 + l0 == s1 => {
                    *last = Range::Target { start: s0, len: l0 + l1 };
                    continue;
                }
                _ => {}
            }
        }
        out.push(range);
    }
    out
}

/// Reconstruct `target` given `source`, the original `target` bytes (for
/// resolving `Range::Target` literal runs) and `ranges`.
pub fn reconstruct_from(source: &[u8], original_target: &[u8], ranges: &[Range]) -> Vec<u8> {
    let mut out = Vec::with_capacity(original_target.len());
    for range in ranges {
        match *range {
            Range::Source { start, len } => out.extend_from_slice(&source[start..start + len]),
            Range::Target { start, len } => out.extend_from_slice(&original_target[start..start + len]),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_target_yields_no_ranges() {
        assert!(compute_ranges(b"anything", b"").is_empty());
    }

    #[test]
    fn empty_source_yields_single_target_range() {
        let ranges = compute_ranges(b"", b"hello");
        assert_eq!(ranges, vec![Range::Target { start: 0, len: 5 }]);
    }

    #[test]
    fn source_shorter_than_block_falls_back_to_single_target_range() {
        let ranges = compute_ranges(b"hi", b"hello world");
        assert_eq!(ranges, vec![Range::Target { start: 0, len: 11 }]);
    }

    #[test]
    fn identical_buffers_yield_one_source_range() {
        let data = b"the quick brown fox jumps over the lazy dog, twice over".to_vec();
        let ranges = compute_ranges(&data, &data);
        assert_eq!(ranges, vec![Range::Source { start: 0, len: data.len() }]);
    }

    #[test]
    fn small_edit_produces_copy_and_insert_ranges() {
        let source = b"Hello, World!".to_vec();
        let target = b"Hello, Universe!".to_vec();
        let ranges = compute_ranges(&source, &target);
        let rebuilt = reconstruct_from(&source, &target, &ranges);
        assert_eq!(rebuilt, target);
        // Expect at least one copy from source alongside the inserted text.
        assert!(ranges.iter().any(|r| matches!(r, Range::Source { .. })));
    }

    #[test]
    fn roundtrips_on_randomish_edits() {
        let source: Vec<u8> = (0u8..=255).cycle().take(2000).collect();
        let mut target = source.clone();
        target.splice(500..520, b"INSERTED-CONTENT-HERE------".iter().copied());
        target.truncate(1800);
        let ranges = compute_ranges(&source, &target);
        let rebuilt = reconstruct_from(&source, &target, &ranges);
        assert_eq!(rebuilt, target);
    }
}
