//! Extractor client and batch scheduling.
//!
//! The extractor is an external service that decompresses block payloads:
//! given a bundle URL plus `(offset, compressed, extracted)` triples, it
//! answers with the decompressed bytes, honoring an optional `Range` over
//! the decompressed window. Block plans are grouped into a bounded number of
//! requests so one incoming file request never fans out past the configured
//! subrequest ceiling.

use bundlecast_formats::{BLOCK_SIZE, BlockPlan};
use bytes::Bytes;
use reqwest::header::{CONTENT_RANGE, RANGE};
use reqwest::{Client, Response};
use tracing::{debug, warn};
use url::Url;

use crate::error::{DeliveryError, DeliveryResult};

/// Default ceiling on outbound extractor calls per file request.
pub const DEFAULT_SUBREQUEST_CEILING: usize = 32;

/// Split ordered plans into at most `max_groups` contiguous groups.
///
/// Groups are equal-sized except the last, preserve plan order, and
/// partition the input with no gaps or overlaps.
pub fn group_plans(plans: &[BlockPlan], max_groups: usize) -> Vec<&[BlockPlan]> {
    if plans.is_empty() || max_groups == 0 {
        return Vec::new();
    }
    plans.chunks(plans.len().div_ceil(max_groups)).collect()
}

/// The decompressed byte window a group request asks for.
///
/// Spans from the first member's window start to the last member's window
/// end, with intermediate members counted at full block pitch.
fn group_window(group: &[BlockPlan]) -> (u64, u64) {
    let first = &group[0];
    let last = &group[group.len() - 1];
    let start = u64::from(first.window_start);
    let end = u64::from(last.window_end) + (group.len() as u64 - 1) * BLOCK_SIZE;
    (start, end)
}

/// Client for the external decompression service.
#[derive(Debug, Clone)]
pub struct ExtractorClient {
    http: Client,
    endpoint: Url,
    subrequest_ceiling: usize,
}

impl ExtractorClient {
    /// Create an extractor client for the given service endpoint.
    pub fn new(http: Client, endpoint: Url) -> Self {
        Self {
            http,
            endpoint,
            subrequest_ceiling: DEFAULT_SUBREQUEST_CEILING,
        }
    }

    /// Override the per-request subrequest ceiling.
    #[must_use]
    pub fn with_subrequest_ceiling(mut self, ceiling: usize) -> Self {
        self.subrequest_ceiling = ceiling.max(1);
        self
    }

    /// Fetch the decompressed windows for all plans, grouped under the
    /// subrequest ceiling and dispatched concurrently.
    ///
    /// Results come back in plan order. Any group failure fails the whole
    /// call; there is no partial success and no retry.
    pub async fn fetch_blocks(
        &self,
        bundle_url: &str,
        plans: &[BlockPlan],
    ) -> DeliveryResult<Vec<Bytes>> {
        let groups = group_plans(plans, self.subrequest_ceiling);
        debug!(
            blocks = plans.len(),
            groups = groups.len(),
            bundle_url,
            "dispatching block fetches"
        );

        futures::future::try_join_all(
            groups
                .into_iter()
                .map(|group| self.fetch_group(bundle_url, group)),
        )
        .await
    }

    /// Fetch one group of blocks as a single extractor request.
    async fn fetch_group(&self, bundle_url: &str, group: &[BlockPlan]) -> DeliveryResult<Bytes> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("url", bundle_url)
            .append_pair("offset", &join_field(group, |p| p.stream_offset.to_string()))
            .append_pair(
                "compressed",
                &join_field(group, |p| p.compressed_size.to_string()),
            )
            .append_pair(
                "extracted",
                &join_field(group, |p| p.extracted_size.to_string()),
            );

        let (start, end) = group_window(group);
        // The window only needs trimming when it does not already cover the
        // group's full decompressed span.
        let trims_tail = group[group.len() - 1].window_end != group[group.len() - 1].extracted_size;
        let mut request = self.http.get(url);
        if start != 0 || trims_tail {
            request = request.header(RANGE, format!("bytes={start}-{}", end - 1));
        }

        let response = request.send().await?;
        validate_and_trim(response, start, end).await
    }
}

/// Check a group response against the requested window and cut it to size.
///
/// A `Content-Range` header, when present, reveals the window the extractor
/// actually honored; leading bytes beyond the request are dropped here.
/// Responses longer than the window are truncated to it.
async fn validate_and_trim(response: Response, start: u64, end: u64) -> DeliveryResult<Bytes> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(%status, %body, "extractor error");
        return Err(DeliveryError::Extractor { status, body });
    }

    let content_range = response
        .headers()
        .get(CONTENT_RANGE)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string);

    let mut body = response.bytes().await?;

    if start != 0 {
        let actual_start = match content_range {
            Some(value) => parse_content_range(&value)?.0,
            None => 0,
        };
        if actual_start != start {
            let skip = start
                .checked_sub(actual_start)
                .ok_or(DeliveryError::RangeNotHonored {
                    requested: start,
                    actual: actual_start,
                })?;
            body = body.slice((skip as usize).min(body.len())..);
        }
    }

    let wanted = (end - start) as usize;
    if body.len() != wanted {
        body = body.slice(..wanted.min(body.len()));
    }
    Ok(body)
}

/// Parse the start/end offsets out of a `bytes <start>-<end>[/<len>]` header.
fn parse_content_range(value: &str) -> DeliveryResult<(u64, u64)> {
    let malformed = || DeliveryError::RangeHeaderParse {
        value: value.to_string(),
    };

    let span = value.strip_prefix("bytes ").ok_or_else(malformed)?;
    let span = span.split('/').next().ok_or_else(malformed)?;
    let (start, end) = span.split_once('-').ok_or_else(malformed)?;
    Ok((
        start.trim().parse().map_err(|_| malformed())?,
        end.trim().parse().map_err(|_| malformed())?,
    ))
}

fn join_field<F: Fn(&BlockPlan) -> String>(group: &[BlockPlan], field: F) -> String {
    group.iter().map(field).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn plan(index: u64, window_start: u32, window_end: u32) -> BlockPlan {
        BlockPlan {
            index,
            stream_offset: 100 + index * 10,
            compressed_size: 10,
            extracted_size: BLOCK_SIZE as u32,
            window_start,
            window_end,
        }
    }

    #[test]
    fn test_grouping_respects_ceiling() {
        let plans: Vec<_> = (0..100).map(|i| plan(i, 0, BLOCK_SIZE as u32)).collect();
        let groups = group_plans(&plans, 32);

        assert!(groups.len() <= 32);
        assert!(groups.iter().all(|g| !g.is_empty()));

        // Contiguous partition in order, no gaps or overlaps.
        let flattened: Vec<_> = groups.iter().flat_map(|g| g.iter()).collect();
        assert_eq!(flattened.len(), plans.len());
        for (got, expected) in flattened.iter().zip(plans.iter()) {
            assert_eq!(got.index, expected.index);
        }
    }

    #[test]
    fn test_few_plans_stay_one_per_group() {
        let plans: Vec<_> = (0..5).map(|i| plan(i, 0, BLOCK_SIZE as u32)).collect();
        let groups = group_plans(&plans, 32);

        assert_eq!(groups.len(), 5);
        assert!(groups.iter().all(|g| g.len() == 1));
    }

    #[test]
    fn test_group_window_spans_members() {
        let group = [plan(0, 0x3F000, BLOCK_SIZE as u32), plan(1, 0, 0x1000)];
        let (start, end) = group_window(&group);

        assert_eq!(start, 0x3F000);
        assert_eq!(end, 0x1000 + BLOCK_SIZE);
    }

    #[test]
    fn test_parse_content_range_variants() {
        assert_eq!(parse_content_range("bytes 0-99/500").unwrap(), (0, 99));
        assert_eq!(parse_content_range("bytes 100-199").unwrap(), (100, 199));
        assert!(matches!(
            parse_content_range("items 0-99"),
            Err(DeliveryError::RangeHeaderParse { .. })
        ));
        assert!(matches!(
            parse_content_range("bytes ?-99"),
            Err(DeliveryError::RangeHeaderParse { .. })
        ));
    }

    #[test]
    fn test_join_field_comma_encoding() {
        let group = [plan(0, 0, 10), plan(1, 0, 10), plan(2, 0, 10)];
        assert_eq!(join_field(&group, |p| p.stream_offset.to_string()), "100,110,120");
    }
}
