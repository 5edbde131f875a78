//! Error types for bundle format handling.

use thiserror::Error;

/// Errors produced while parsing bundle headers or planning block reads.
#[derive(Debug, Error)]
pub enum BundleError {
    /// Header buffer is shorter than the fixed prefix plus block table
    #[error("bundle header truncated: need {expected} bytes, have {actual}")]
    TruncatedHeader {
        /// Bytes required for the declared block count
        expected: usize,
        /// Bytes actually available
        actual: usize,
    },

    /// Low-level binary read failure
    #[error("binary read error: {0}")]
    BinRw(#[from] binrw::Error),

    /// File offset/size place it outside the bundle's block table
    #[error("file spans blocks {first}..={last} but bundle has {block_count} blocks")]
    BlocksOutOfRange {
        /// First block index the file touches
        first: u64,
        /// Last block index the file touches
        last: u64,
        /// Number of entries in the block table
        block_count: usize,
    },

    /// File extends past the end of its bundle
    #[error("file at offset {offset} with size {size} overflows bundle of {bundle_size} bytes")]
    SpanOverflow {
        /// File offset within the decompressed bundle
        offset: u64,
        /// File size in bytes
        size: u64,
        /// Total decompressed bundle size
        bundle_size: u64,
    },
}

/// Result type for bundle format operations.
pub type BundleResult<T> = Result<T, BundleError>;
