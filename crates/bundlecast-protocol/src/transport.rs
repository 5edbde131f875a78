//! Shared HTTP transport configuration.

use std::time::Duration;

use reqwest::Client;

/// Build the HTTP client used for origin and extractor traffic.
///
/// One client is built per process and cloned into each component; reqwest
/// clients share their connection pool across clones.
pub fn build_client() -> reqwest::Result<Client> {
    Client::builder()
        .pool_idle_timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(10)
        .timeout(Duration::from_secs(45))
        .connect_timeout(Duration::from_secs(10))
        .tcp_nodelay(true)
        .use_rustls_tls()
        .redirect(reqwest::redirect::Policy::limited(3))
        .user_agent(concat!("bundlecast/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Install the process-wide rustls crypto provider.
///
/// Must run once before the first TLS connection; repeated calls are
/// harmless.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}
