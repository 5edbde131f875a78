//! HTTP server that serves files straight out of patch CDN bundles.
//!
//! Requests are routed by version: `/{version}/{path}` resolves `path`
//! against the metadata index scoped to that version's patch root, then
//! either renders a directory listing or reconstructs the file's bytes
//! through the bundle delivery pipeline in `bundlecast-protocol`.
//!
//! # Architecture
//!
//! - `config`: CLI/env configuration and validation
//! - `index`: client for the metadata index collaborator
//! - `state`: shared per-process state, including the storage-root cache
//! - `handlers`: request handlers and error-to-status mapping
//! - `listing`: HTML directory listings
//! - `text`: UTF-16 decoding for text-typed assets
//! - `server`: router construction and startup
//!
//! # Example
//!
//! ```no_run
//! use bundlecast_server::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     tracing_subscriber::fmt::init();
//!
//!     let config = ServerConfig::from_args();
//!     config.validate()?;
//!
//!     let server = Server::new(config)?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

// Module declarations
pub mod config;
pub mod error;
pub mod handlers;
pub mod index;
pub mod listing;
pub mod server;
pub mod state;
pub mod text;

// Re-exports for public API
pub use config::ServerConfig;
pub use error::{ConfigError, IndexError, ServerError};
pub use index::{BundleRef, FileRecord, IndexClient, Listing, RecordKind};
pub use server::{Server, create_router};
pub use state::{AppState, VersionCache};
