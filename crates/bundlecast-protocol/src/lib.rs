//! Bundle file delivery over a patch CDN.
//!
//! Serves single files out of large append-only bundle archives without ever
//! downloading a whole bundle. One request flows through a fixed pipeline:
//!
//! 1. `origin` fetches the bundle's compact binary header with a single
//!    ranged GET and captures the origin's cache validators
//! 2. `etag` answers conditional requests before any block is touched
//! 3. `bundlecast-formats` plans which compressed blocks the byte range needs
//! 4. `extractor` batches the planned blocks under a subrequest ceiling and
//!    fetches the decompressed windows concurrently
//! 5. `delivery` validates, trims, and reassembles the windows into the
//!    file's exact bytes
//!
//! The independent `probe` module speaks the patch server's raw TCP version
//! protocol to learn the current CDN root URL.
//!
//! # Example
//!
//! ```no_run
//! use bundlecast_formats::{BundleDescriptor, FileLocator};
//! use bundlecast_protocol::{BundleDelivery, BundleOrigin, ExtractorClient, transport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let http = transport::build_client()?;
//!     let delivery = BundleDelivery::new(
//!         BundleOrigin::new(http.clone()),
//!         ExtractorClient::new(http, url::Url::parse("https://extract.example.net/")?),
//!     );
//!
//!     let locator = FileLocator {
//!         bundle: BundleDescriptor {
//!             base_url: "https://patch.example.net/3.26.1.2/".to_string(),
//!             name: "Data/Art_1".to_string(),
//!             total_size: 0x50000,
//!         },
//!         offset: 0x3F000,
//!         size: 0x2000,
//!         mime_type: None,
//!     };
//!
//!     match delivery.deliver(&locator, None).await? {
//!         bundlecast_protocol::Delivery::File(file) => {
//!             println!("reassembled {} bytes", file.body.len());
//!         }
//!         bundlecast_protocol::Delivery::NotModified { .. } => {}
//!     }
//!     Ok(())
//! }
//! ```

pub mod delivery;
pub mod error;
pub mod etag;
pub mod extractor;
pub mod origin;
pub mod probe;
pub mod transport;

// Re-export main types
pub use delivery::{BundleDelivery, DeliveredFile, Delivery};
pub use error::{DeliveryError, DeliveryResult, ProbeError};
pub use etag::Gate;
pub use extractor::{DEFAULT_SUBREQUEST_CEILING, ExtractorClient};
pub use origin::{BundleOrigin, UpstreamValidators};
pub use probe::VersionProbe;
