//! Bundle header parsing.
//!
//! The header is a 59-byte little-endian prefix followed by one u32
//! compressed-size entry per block. Only two prefix fields are meaningful
//! here: the declared decompressed bundle size at offset 0 and the declared
//! header length at offset 8. Both are advisory; callers compare them
//! against computed values and carry on when they disagree.

use binrw::io::{Read, Seek, SeekFrom};
use binrw::{BinRead, BinResult};
use std::io::Cursor;

use super::BLOCK_TABLE_OFFSET;
use crate::error::{BundleError, BundleResult};

/// Parsed bundle header: advisory prefix fields plus the block table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleHeader {
    /// Declared decompressed size of the whole bundle (u32le at offset 0)
    pub declared_total_size: u32,
    /// Declared header length, after adding the fixed 12-byte bias
    /// (u32le at offset 8, plus 12)
    pub declared_body_offset: u32,
    /// Compressed size of each block, in index order
    pub block_sizes: Vec<u32>,
}

impl BinRead for BundleHeader {
    type Args<'a> = (u32,);

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: binrw::Endian,
        (blocks,): Self::Args<'_>,
    ) -> BinResult<Self> {
        let declared_total_size = u32::read_options(reader, endian, ())?;

        reader.seek(SeekFrom::Start(8))?;
        let raw_header_len = u32::read_options(reader, endian, ())?;

        reader.seek(SeekFrom::Start(BLOCK_TABLE_OFFSET))?;
        let mut block_sizes = Vec::with_capacity(blocks as usize);
        for _ in 0..blocks {
            block_sizes.push(u32::read_options(reader, endian, ())?);
        }

        Ok(Self {
            declared_total_size,
            declared_body_offset: raw_header_len + 12,
            block_sizes,
        })
    }
}

impl BundleHeader {
    /// Parse a header buffer fetched from the start of a bundle.
    ///
    /// `blocks` is the block count computed from the bundle's known total
    /// size; it determines how many table entries to read.
    pub fn parse(data: &[u8], blocks: u64) -> BundleResult<Self> {
        let expected = (BLOCK_TABLE_OFFSET + blocks * 4) as usize;
        if data.len() < expected {
            return Err(BundleError::TruncatedHeader {
                expected,
                actual: data.len(),
            });
        }

        let mut cursor = Cursor::new(data);
        Ok(Self::read_options(
            &mut cursor,
            binrw::Endian::Little,
            (blocks as u32,),
        )?)
    }

    /// Number of entries in the block table.
    pub fn block_count(&self) -> usize {
        self.block_sizes.len()
    }
}
