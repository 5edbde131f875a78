//! Bundle origin client.
//!
//! Fetches the header prefix of a bundle from the patch CDN with a single
//! ranged GET and propagates the origin's cache validators for reuse in the
//! conditional gate and the final client response.

use bundlecast_formats::{BundleDescriptor, BundleHeader, body_offset};
use reqwest::Client;
use reqwest::header::{HeaderMap, RANGE};
use tracing::{debug, warn};

use crate::error::{DeliveryError, DeliveryResult};

/// Response headers the origin sends that are echoed to the end client.
const ECHOED_HEADERS: [&str; 5] = ["last-modified", "etag", "cache-control", "expires", "date"];

/// Cache validators captured from the origin's header response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpstreamValidators {
    pairs: Vec<(&'static str, String)>,
}

impl UpstreamValidators {
    /// Capture the echoed subset of an origin response's headers.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let pairs = ECHOED_HEADERS
            .iter()
            .filter_map(|&name| {
                let value = headers.get(name)?.to_str().ok()?;
                Some((name, value.to_string()))
            })
            .collect();
        Self { pairs }
    }

    /// The origin's entity-tag header, if it sent one.
    pub fn etag(&self) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(name, _)| *name == "etag")
            .map(|(_, value)| value.as_str())
    }

    /// Iterate the captured header pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.pairs.iter().map(|(name, value)| (*name, value.as_str()))
    }
}

/// Client for the CDN that hosts bundle binaries.
#[derive(Debug, Clone)]
pub struct BundleOrigin {
    http: Client,
}

impl BundleOrigin {
    /// Create an origin client on top of a shared HTTP client.
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    /// Fetch and parse a bundle's header, returning the block table and the
    /// origin's cache validators.
    ///
    /// The declared size fields inside the header are advisories: mismatches
    /// against the known bundle size or the computed header length are
    /// logged and tolerated, and the computed layout stays authoritative for
    /// all offset math.
    pub async fn fetch_header(
        &self,
        bundle: &BundleDescriptor,
    ) -> DeliveryResult<(BundleHeader, UpstreamValidators)> {
        let url = bundle.url();
        let blocks = bundle.block_count();
        debug!(%url, blocks, "fetching bundle header");

        let response = self
            .http
            .get(&url)
            .header(RANGE, format!("bytes=0-{}", bundle.header_range_end()))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::UpstreamUnavailable { url, status });
        }

        let validators = UpstreamValidators::from_headers(response.headers());
        let body = response.bytes().await?;
        let header = BundleHeader::parse(&body, blocks).map_err(DeliveryError::Header)?;

        if u64::from(header.declared_total_size) != bundle.total_size {
            warn!(
                declared = header.declared_total_size,
                expected = bundle.total_size,
                %url,
                "unexpected bundle size"
            );
        }
        if u64::from(header.declared_body_offset) != body_offset(blocks) {
            warn!(
                declared = header.declared_body_offset,
                computed = body_offset(blocks),
                %url,
                "unexpected header length"
            );
        }

        Ok((header, validators))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validators_capture_echoed_subset() {
        let mut headers = HeaderMap::new();
        headers.insert("etag", "\"abc\"".parse().unwrap());
        headers.insert("cache-control", "public, max-age=60".parse().unwrap());
        headers.insert("content-length", "64".parse().unwrap());

        let validators = UpstreamValidators::from_headers(&headers);
        assert_eq!(validators.etag(), Some("\"abc\""));

        let names: Vec<_> = validators.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["etag", "cache-control"]);
    }

    #[test]
    fn test_missing_etag_is_none() {
        let validators = UpstreamValidators::from_headers(&HeaderMap::new());
        assert_eq!(validators.etag(), None);
    }
}
