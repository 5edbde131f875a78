//! Block range planning.
//!
//! Maps a file's (offset, size) span onto the blocks that hold it: which
//! table entries to fetch, where each block's compressed payload starts in
//! the bundle body, and which window of each block's decompressed bytes the
//! file actually needs.

use super::{BLOCK_SIZE, body_offset};
use crate::bundle::header::BundleHeader;
use crate::bundle::locator::FileLocator;
use crate::error::{BundleError, BundleResult};

/// One block the file overlaps, with its fetch coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPlan {
    /// Block index within the bundle
    pub index: u64,
    /// Offset of this block's compressed payload within the bundle binary
    pub stream_offset: u64,
    /// Compressed payload length from the block table
    pub compressed_size: u32,
    /// Decompressed length of this block; the bundle's last block may be short
    pub extracted_size: u32,
    /// First decompressed byte of this block the file needs
    pub window_start: u32,
    /// One past the last decompressed byte the file needs
    pub window_end: u32,
}

impl BlockPlan {
    /// Length of the decompressed window this plan contributes.
    pub fn window_len(&self) -> u32 {
        self.window_end - self.window_start
    }

    /// True when the file needs this block's decompressed bytes in full.
    pub fn is_full(&self) -> bool {
        self.window_start == 0 && self.window_end == self.extracted_size
    }
}

/// Compute the ordered block plans for a file read.
///
/// Entries before the first overlapped block are skipped, but their
/// compressed sizes still advance the running stream offset; iteration stops
/// after the last overlapped block. The declared bundle size from the header
/// determines each block's decompressed length, so a short final block is
/// handled without special casing at the call site.
///
/// A file ending exactly on a block boundary consumes its last block in
/// full; the zero modulo there must not produce an empty window.
pub fn plan_blocks(locator: &FileLocator, header: &BundleHeader) -> BundleResult<Vec<BlockPlan>> {
    if locator.size == 0 {
        return Ok(Vec::new());
    }

    let first = locator.offset / BLOCK_SIZE;
    let last = (locator.offset + locator.size - 1) / BLOCK_SIZE;
    let blocks = header.block_count();
    if last >= blocks as u64 {
        return Err(BundleError::BlocksOutOfRange {
            first,
            last,
            block_count: blocks,
        });
    }

    let declared_total = u64::from(header.declared_total_size);
    let mut stream_offset = body_offset(blocks as u64);
    let mut plans = Vec::with_capacity((last - first + 1) as usize);

    for (index, &compressed_size) in header.block_sizes.iter().enumerate() {
        let index = index as u64;
        if index > last {
            break;
        }
        if index >= first {
            let extracted_size =
                BLOCK_SIZE.min(declared_total.saturating_sub(BLOCK_SIZE * index)) as u32;

            let window_start = if index == first {
                (locator.offset % BLOCK_SIZE) as u32
            } else {
                0
            };
            let window_end = if index == last {
                match ((locator.offset + locator.size) % BLOCK_SIZE) as u32 {
                    0 => extracted_size,
                    end => end,
                }
            } else {
                extracted_size
            };

            plans.push(BlockPlan {
                index,
                stream_offset,
                compressed_size,
                extracted_size,
                window_start,
                window_end,
            });
        }
        stream_offset += u64::from(compressed_size);
    }

    Ok(plans)
}
