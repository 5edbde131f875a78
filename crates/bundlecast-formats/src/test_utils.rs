//! Test helpers for building synthetic bundle headers.

use crate::bundle::BLOCK_TABLE_OFFSET;

/// Build a header buffer for the given declared size and block table, with
/// a declared header length consistent with the computed layout.
pub(crate) fn build_header(total_size: u32, block_sizes: &[u32]) -> Vec<u8> {
    let table_offset = BLOCK_TABLE_OFFSET as usize;
    let mut buf = vec![0u8; table_offset + block_sizes.len() * 4];
    buf[0..4].copy_from_slice(&total_size.to_le_bytes());
    let raw_header_len = (table_offset + block_sizes.len() * 4 - 12) as u32;
    buf[8..12].copy_from_slice(&raw_header_len.to_le_bytes());
    for (i, size) in block_sizes.iter().enumerate() {
        let at = table_offset + i * 4;
        buf[at..at + 4].copy_from_slice(&size.to_le_bytes());
    }
    buf
}
