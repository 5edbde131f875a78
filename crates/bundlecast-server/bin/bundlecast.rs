//! Bundlecast server binary entry point.
//!
//! Thin wrapper around the bundlecast-server library: parses configuration,
//! initializes logging, and runs the server.

use anyhow::Result;
use bundlecast_server::{Server, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_args();
    config.validate()?;

    tracing::info!(
        bind = %config.bind,
        index = %config.index,
        extractor = %config.extractor,
        "Bundlecast starting"
    );

    let server = Server::new(config)?;
    server.run().await?;

    Ok(())
}
