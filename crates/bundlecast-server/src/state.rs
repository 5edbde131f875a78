//! Shared application state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bundlecast_protocol::{BundleDelivery, BundleOrigin, ExtractorClient};
use parking_lot::Mutex;
use reqwest::Client;

use crate::config::ServerConfig;
use crate::error::{IndexError, ServerError};
use crate::index::IndexClient;

/// Time-boxed cache of per-adapter CDN storage roots.
///
/// Some index deployments omit the storage root on individual records; this
/// cache answers those lookups without hitting the index on every request.
/// Entries expire after the configured TTL and are refetched on demand.
#[derive(Debug)]
pub struct VersionCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, String)>>,
}

impl VersionCache {
    /// Create an empty cache with the given entry lifetime.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The cached storage root for an adapter, refreshed through the index
    /// when missing or stale.
    pub async fn storage_for(
        &self,
        adapter: &str,
        index: &IndexClient,
    ) -> Result<String, IndexError> {
        if let Some(storage) = self.fresh(adapter) {
            return Ok(storage);
        }

        let storage = index.current_version(adapter).await?;
        self.entries.lock().insert(
            adapter.to_string(),
            (Instant::now(), storage.clone()),
        );
        Ok(storage)
    }

    fn fresh(&self, adapter: &str) -> Option<String> {
        let entries = self.entries.lock();
        let (stored_at, storage) = entries.get(adapter)?;
        (stored_at.elapsed() < self.ttl).then(|| storage.clone())
    }
}

/// Shared application state handed to every request handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Metadata index client
    pub index: IndexClient,
    /// The bundle delivery pipeline
    pub delivery: BundleDelivery,
    /// Per-adapter storage root cache
    pub versions: Arc<VersionCache>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Wire the application state from configuration and a shared HTTP
    /// client.
    pub fn new(config: ServerConfig, http: Client) -> Result<Self, ServerError> {
        let index = IndexClient::new(http.clone(), config.index.clone());
        let delivery = BundleDelivery::new(
            BundleOrigin::new(http.clone()),
            ExtractorClient::new(http, config.extractor.clone())
                .with_subrequest_ceiling(config.max_subrequests),
        )
        .with_strict_assembly(config.strict_assembly);
        let versions = Arc::new(VersionCache::new(Duration::from_secs(
            config.version_ttl_secs,
        )));

        Ok(Self {
            index,
            delivery,
            versions,
            config: Arc::new(config),
        })
    }
}
