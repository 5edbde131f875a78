//! The file-delivery pipeline.
//!
//! Per request: conditional gate → bundle header fetch → block planning →
//! grouped extractor fetches → reassembly. Every stage owns its data for the
//! request's lifetime; nothing is cached here. A failure at any stage is
//! terminal for the request; retrying is left to callers or intermediaries.

use bundlecast_formats::{FileLocator, plan_blocks};
use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::{DeliveryError, DeliveryResult};
use crate::etag::{self, Gate};
use crate::extractor::ExtractorClient;
use crate::origin::{BundleOrigin, UpstreamValidators};

/// A fully reassembled file plus the headers that accompany it.
#[derive(Debug, Clone)]
pub struct DeliveredFile {
    /// The file's bytes, exactly as stored in the bundle
    pub body: Vec<u8>,
    /// Origin cache validators to echo to the client
    pub validators: UpstreamValidators,
}

/// Outcome of a delivery request.
#[derive(Debug, Clone)]
pub enum Delivery {
    /// The client's validator still matches; no bytes were fetched
    NotModified {
        /// Validators to echo on the 304
        validators: UpstreamValidators,
    },
    /// The reassembled file
    File(DeliveredFile),
}

/// Orchestrates bundle reads for single-file requests.
#[derive(Debug, Clone)]
pub struct BundleDelivery {
    origin: BundleOrigin,
    extractor: ExtractorClient,
    strict_assembly: bool,
}

impl BundleDelivery {
    /// Wire the pipeline from its two collaborator clients.
    pub fn new(origin: BundleOrigin, extractor: ExtractorClient) -> Self {
        Self {
            origin,
            extractor,
            strict_assembly: false,
        }
    }

    /// Fail requests whose reassembled length mismatches the file size
    /// instead of logging and serving the result anyway.
    #[must_use]
    pub fn with_strict_assembly(mut self, strict: bool) -> Self {
        self.strict_assembly = strict;
        self
    }

    /// Reconstruct the file a locator points at.
    ///
    /// `client_etags` is the raw `If-None-Match` value, if the client sent
    /// one; a match against the origin's validator short-circuits before any
    /// block is fetched.
    pub async fn deliver(
        &self,
        locator: &FileLocator,
        client_etags: Option<&str>,
    ) -> DeliveryResult<Delivery> {
        locator.validate().map_err(DeliveryError::InvalidLocator)?;

        if locator.is_empty() {
            warn!(bundle = %locator.bundle.name, "empty file requested");
            return Ok(Delivery::File(DeliveredFile {
                body: Vec::new(),
                validators: UpstreamValidators::default(),
            }));
        }

        let (header, validators) = self.origin.fetch_header(&locator.bundle).await?;

        if etag::check(client_etags, validators.etag()) == Gate::NotModified {
            debug!(bundle = %locator.bundle.name, "validator match, not modified");
            return Ok(Delivery::NotModified { validators });
        }

        let plans = plan_blocks(locator, &header).map_err(DeliveryError::InvalidLocator)?;
        let chunks = self
            .extractor
            .fetch_blocks(&locator.bundle.url(), &plans)
            .await?;

        let body = self.assemble(chunks, locator.size)?;
        Ok(Delivery::File(DeliveredFile { body, validators }))
    }

    /// Concatenate validated chunks into the final buffer.
    ///
    /// The lenient default returns whatever was assembled on a length
    /// mismatch and logs it; strict assembly turns the mismatch into an
    /// error.
    fn assemble(&self, chunks: Vec<Bytes>, total_size: u64) -> DeliveryResult<Vec<u8>> {
        let mut body = Vec::with_capacity(total_size as usize);
        for chunk in &chunks {
            body.extend_from_slice(chunk);
        }

        if body.len() as u64 != total_size {
            if self.strict_assembly {
                return Err(DeliveryError::ShortAssembly {
                    expected: total_size,
                    actual: body.len() as u64,
                });
            }
            warn!(
                expected = total_size,
                actual = body.len(),
                "assembled size mismatch"
            );
        }
        Ok(body)
    }
}
