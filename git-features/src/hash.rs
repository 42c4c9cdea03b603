//! CRC32 helpers (`crc32`/`crc32_update`) used to verify copied
//! pack-to-pack entries and Fossil-format delta trailers.

/// Compute the CRC32 of `data` from a fresh state.
pub fn crc32(data: &[u8]) -> u32 {
    crc32_update(0, data)
}

/// Continue a CRC32 computation from a previous `state`.
pub fn crc32_update(state: u32, data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new_with_initial(state);
    hasher.update(data);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc32_update_is_associative_across_splits() {
        let data = b"0123456789abcdef";
        let whole = crc32(data);
        let (a, b) = data.split_at(6);
        let split = crc32_update(crc32_update(0, a), b);
        assert_eq!(whole, split);
    }
}
