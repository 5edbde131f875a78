//! Router construction and server orchestration.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use bundlecast_protocol::{VersionProbe, transport};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::handlers;
use crate::state::AppState;

/// Create the HTTP router with all endpoints.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/{version}", get(handlers::handle_root))
        .route("/{version}/", get(handlers::handle_root))
        .route("/{version}/{*path}", get(handlers::handle_entry))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Server orchestration.
pub struct Server {
    state: Arc<AppState>,
    config: ServerConfig,
}

impl Server {
    /// Create a new server with configuration.
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        transport::install_crypto_provider();
        let http = transport::build_client()?;
        let state = AppState::new(config.clone(), http)?;

        Ok(Self {
            state: Arc::new(state),
            config,
        })
    }

    /// Run the server until interrupted.
    ///
    /// When a patch host is configured, it is probed once at startup to
    /// learn the CDN root the patch server currently announces. The probe is
    /// informational: a failure is logged and startup continues.
    pub async fn run(self) -> Result<(), ServerError> {
        if let Some((host, port)) = self.config.patch_host_parts()? {
            match VersionProbe::new().probe(&host, port).await {
                Ok(url) => tracing::info!(%url, "patch server announced CDN root"),
                Err(err) => tracing::warn!(%err, %host, port, "version probe failed"),
            }
        }

        let app = create_router(self.state.clone());
        let listener = tokio::net::TcpListener::bind(self.config.bind)
            .await
            .map_err(|source| ServerError::BindFailed {
                addr: self.config.bind,
                source,
            })?;

        tracing::info!("HTTP server listening on {}", self.config.bind);

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Shutdown(format!("HTTP server error: {e}")))?;

        Ok(())
    }

    /// Get shared application state (for testing).
    #[cfg(test)]
    #[must_use]
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn test_router_creation() {
        let config = ServerConfig {
            bind: "0.0.0.0:8080".parse().unwrap(),
            index: Url::parse("http://127.0.0.1:8081/").unwrap(),
            extractor: Url::parse("http://127.0.0.1:8082/").unwrap(),
            upstream: Url::parse("https://patch-poe2.poecdn.com/").unwrap(),
            legacy_upstream: Url::parse("https://patch.poecdn.com/").unwrap(),
            max_subrequests: 32,
            strict_assembly: false,
            patch_host: None,
            version_ttl_secs: 300,
        };

        let server = Server::new(config).unwrap();
        let _router = create_router(server.state().clone());
    }
}
