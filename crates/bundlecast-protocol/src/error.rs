//! Error types for the delivery pipeline and the version probe.
//!
//! The pipeline distinguishes fatal conditions (anything below) from the
//! size-mismatch diagnostics that are logged and tolerated: declared vs
//! computed header length, declared vs expected bundle size, and (unless
//! strict assembly is enabled) assembled vs expected file size.

use bundlecast_formats::BundleError;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors that terminate a file-delivery request.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The file's offset/size are inconsistent with its bundle (client error)
    #[error("invalid file locator: {0}")]
    InvalidLocator(#[source] BundleError),

    /// The bundle origin refused or failed the header fetch
    #[error("bundle origin unavailable: {url} returned {status}")]
    UpstreamUnavailable {
        /// Bundle URL that was fetched
        url: String,
        /// Status the origin returned
        status: StatusCode,
    },

    /// The header bytes could not be parsed
    #[error("bundle header malformed: {0}")]
    Header(#[source] BundleError),

    /// The extractor returned a non-success status; its body is kept verbatim
    /// for diagnostics
    #[error("extractor returned {status}: {body}")]
    Extractor {
        /// Status the extractor returned
        status: StatusCode,
        /// Response body text
        body: String,
    },

    /// A content-range response header could not be parsed
    #[error("failed to parse content-range header {value:?}")]
    RangeHeaderParse {
        /// The header value as received
        value: String,
    },

    /// The extractor returned a window starting past the requested offset
    #[error("range not honored: requested start {requested}, got {actual}")]
    RangeNotHonored {
        /// Start offset that was requested
        requested: u64,
        /// Start offset the extractor actually returned
        actual: u64,
    },

    /// Strict assembly only: reassembled length differs from the file size
    #[error("assembled {actual} bytes, expected {expected}")]
    ShortAssembly {
        /// File size the index reported
        expected: u64,
        /// Bytes actually assembled
        actual: u64,
    },

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl DeliveryError {
    /// True for conditions caused by the client's request rather than an
    /// upstream or transport failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidLocator(_))
    }
}

/// Result type for delivery operations.
pub type DeliveryResult<T> = Result<T, DeliveryError>;

/// Errors from the patch-server version probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Socket-level failure
    #[error("probe I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Connect or read deadline elapsed
    #[error("probe timed out")]
    Timeout,

    /// The reply ended before the announced URL was complete
    #[error("probe reply truncated: wanted {wanted} bytes, got {got}")]
    ShortRead {
        /// Bytes required to decode the full reply
        wanted: usize,
        /// Bytes actually received
        got: usize,
    },

    /// The announced URL was not valid UTF-16
    #[error("probe reply is not valid UTF-16")]
    InvalidUtf16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        let err = DeliveryError::InvalidLocator(BundleError::SpanOverflow {
            offset: 10,
            size: 20,
            bundle_size: 15,
        });
        assert!(err.is_client_error());

        let err = DeliveryError::Extractor {
            status: StatusCode::BAD_GATEWAY,
            body: "boom".to_string(),
        };
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_short_read_message() {
        let err = ProbeError::ShortRead { wanted: 55, got: 34 };
        assert_eq!(
            err.to_string(),
            "probe reply truncated: wanted 55 bytes, got 34"
        );
    }
}
