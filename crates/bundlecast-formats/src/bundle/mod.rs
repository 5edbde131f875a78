//! Bundle layout constants and submodules.

pub mod header;
pub mod locator;
pub mod plan;

/// Size of one uncompressed block, in bytes.
pub const BLOCK_SIZE: u64 = 0x40000;

/// Length of the fixed header prefix that precedes the block table.
pub const FIXED_PREFIX_LEN: u64 = 59;

/// Byte offset where the block table's u32 entries begin.
pub const BLOCK_TABLE_OFFSET: u64 = 60;

/// Number of blocks a bundle of `total_size` decompressed bytes holds.
pub fn block_count(total_size: u64) -> u64 {
    total_size.div_ceil(BLOCK_SIZE)
}

/// Inclusive end of the header byte range for a bundle with `blocks` blocks.
///
/// A ranged fetch of `bytes=0-{header_range_end}` returns the full fixed
/// prefix plus the block table.
pub fn header_range_end(blocks: u64) -> u64 {
    FIXED_PREFIX_LEN + blocks * 4
}

/// Stream offset of the first block's compressed payload.
///
/// This is the computed header length; the header also carries a declared
/// value, which is advisory only.
pub fn body_offset(blocks: u64) -> u64 {
    header_range_end(blocks) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_count_rounds_up() {
        assert_eq!(block_count(0), 0);
        assert_eq!(block_count(1), 1);
        assert_eq!(block_count(BLOCK_SIZE), 1);
        assert_eq!(block_count(BLOCK_SIZE + 1), 2);
        assert_eq!(block_count(0x50000), 2);
    }

    #[test]
    fn test_body_follows_header() {
        // One block: 59-byte prefix + 4-byte table, payload starts at 64.
        assert_eq!(header_range_end(1), 63);
        assert_eq!(body_offset(1), 64);
        assert_eq!(body_offset(2), BLOCK_TABLE_OFFSET + 2 * 4);
    }
}
