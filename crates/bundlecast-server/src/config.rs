//! Server configuration management.
//!
//! Configuration comes from CLI arguments with environment-variable
//! fallbacks (`BUNDLECAST_*`) and is validated once at startup.

use clap::Parser;
use std::net::SocketAddr;
use url::Url;

use crate::error::ConfigError;

/// Server configuration loaded from CLI args and environment variables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "bundlecast",
    about = "Serves single files straight out of patch CDN bundle archives",
    version
)]
pub struct ServerConfig {
    /// HTTP bind address
    #[arg(long, env = "BUNDLECAST_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Base URL of the metadata index service
    #[arg(long, env = "BUNDLECAST_INDEX")]
    pub index: Url,

    /// Base URL of the block decompression (extractor) service
    #[arg(long, env = "BUNDLECAST_EXTRACTOR")]
    pub extractor: Url,

    /// Patch CDN root for current-generation versions
    #[arg(
        long,
        env = "BUNDLECAST_UPSTREAM",
        default_value = "https://patch-poe2.poecdn.com/"
    )]
    pub upstream: Url,

    /// Patch CDN root for legacy versions (major version 3)
    #[arg(
        long,
        env = "BUNDLECAST_LEGACY_UPSTREAM",
        default_value = "https://patch.poecdn.com/"
    )]
    pub legacy_upstream: Url,

    /// Ceiling on extractor calls per incoming file request
    #[arg(long, env = "BUNDLECAST_MAX_SUBREQUESTS", default_value_t = 32)]
    pub max_subrequests: usize,

    /// Fail requests whose reassembled size mismatches the index's file size
    /// instead of serving the result anyway
    #[arg(long, env = "BUNDLECAST_STRICT_ASSEMBLY")]
    pub strict_assembly: bool,

    /// Patch server to probe for the current CDN root at startup, host:port
    #[arg(long, env = "BUNDLECAST_PATCH_HOST")]
    pub patch_host: Option<String>,

    /// Seconds a cached per-adapter storage root stays fresh
    #[arg(long, env = "BUNDLECAST_VERSION_TTL", default_value_t = 300)]
    pub version_ttl_secs: u64,
}

impl ServerConfig {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Pick the upstream patch root for a version string.
    ///
    /// Versions with major version 3 predate the current CDN layout and
    /// resolve against the legacy root.
    pub fn upstream_for(&self, version: &str) -> &Url {
        if version.starts_with('3') {
            &self.legacy_upstream
        } else {
            &self.upstream
        }
    }

    /// Split the configured patch host into (host, port).
    pub fn patch_host_parts(&self) -> Result<Option<(String, u16)>, ConfigError> {
        let Some(address) = &self.patch_host else {
            return Ok(None);
        };
        let (host, port) = address
            .rsplit_once(':')
            .ok_or_else(|| ConfigError::InvalidPatchHost {
                address: address.clone(),
                reason: "expected host:port".to_string(),
            })?;
        let port = port.parse().map_err(|_| ConfigError::InvalidPatchHost {
            address: address.clone(),
            reason: format!("invalid port '{port}'"),
        })?;
        Ok(Some((host.to_string(), port)))
    }

    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The index or extractor URL uses a non-HTTP scheme
    /// - The subrequest ceiling is zero
    /// - The patch host is not a valid host:port pair
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (option, url) in [
            ("index", &self.index),
            ("extractor", &self.extractor),
            ("upstream", &self.upstream),
            ("legacy-upstream", &self.legacy_upstream),
        ] {
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::UnsupportedScheme {
                    option: option.to_string(),
                    url: url.to_string(),
                });
            }
        }

        if self.max_subrequests == 0 {
            return Err(ConfigError::InvalidValue {
                option: "max-subrequests".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        self.patch_host_parts()?;
        Ok(())
    }
}
