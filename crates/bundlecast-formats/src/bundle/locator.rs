//! Typed descriptions of where a file's bytes live.
//!
//! The metadata index hands these out; everything downstream operates on
//! the typed values only.

use super::{block_count, header_range_end};
use crate::error::{BundleError, BundleResult};

/// A remote bundle archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleDescriptor {
    /// CDN root the bundle is served under
    pub base_url: String,
    /// Bundle name without path or extension
    pub name: String,
    /// Total decompressed size of the bundle, in bytes
    pub total_size: u64,
}

impl BundleDescriptor {
    /// Full URL of the bundle's binary on the CDN.
    pub fn url(&self) -> String {
        let slash = if self.base_url.ends_with('/') { "" } else { "/" };
        format!("{}{}Bundles2/{}.bundle.bin", self.base_url, slash, self.name)
    }

    /// Number of fixed-size blocks in this bundle.
    pub fn block_count(&self) -> u64 {
        block_count(self.total_size)
    }

    /// Inclusive end of the header byte range to fetch.
    pub fn header_range_end(&self) -> u64 {
        header_range_end(self.block_count())
    }
}

/// Where a logical file sits inside its bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLocator {
    /// The bundle holding the file
    pub bundle: BundleDescriptor,
    /// Offset of the file within the decompressed bundle
    pub offset: u64,
    /// File size in bytes
    pub size: u64,
    /// MIME type reported by the index, if any
    pub mime_type: Option<String>,
}

impl FileLocator {
    /// Check that the file's span fits inside its bundle.
    pub fn validate(&self) -> BundleResult<()> {
        if self.offset.saturating_add(self.size) > self.bundle.total_size {
            return Err(BundleError::SpanOverflow {
                offset: self.offset,
                size: self.size,
                bundle_size: self.bundle.total_size,
            });
        }
        Ok(())
    }

    /// True for zero-length files, which need no block reads at all.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}
