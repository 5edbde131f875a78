//! Error types for the server.
//!
//! All errors use thiserror for consistent error handling across the codebase.

use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid patch-server address format
    #[error("Invalid patch host '{address}': {reason}")]
    InvalidPatchHost {
        /// The invalid address string
        address: String,
        /// Reason for invalidity
        reason: String,
    },

    /// A URL option does not use a supported scheme
    #[error("Unsupported scheme in {option}: {url}")]
    UnsupportedScheme {
        /// Name of the offending option
        option: String,
        /// The configured URL
        url: String,
    },

    /// A numeric option is outside its allowed range
    #[error("Invalid value for {option}: {reason}")]
    InvalidValue {
        /// Name of the offending option
        option: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Errors talking to the metadata index service.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Transport-level failure
    #[error("index request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The index answered with a non-success status
    #[error("index returned {status} for {url}")]
    Status {
        /// Status the index returned
        status: reqwest::StatusCode,
        /// Request URL
        url: String,
    },

    /// The index reported no storage root for the adapter
    #[error("index has no storage root for adapter {adapter}")]
    NoStorage {
        /// Adapter the lookup was for
        adapter: String,
    },
}

/// Server runtime errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind the HTTP listener
    #[error("Failed to bind HTTP server to {addr}: {source}")]
    BindFailed {
        /// Address that failed to bind
        addr: std::net::SocketAddr,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Failed to build the shared HTTP client
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Server shutdown error
    #[error("Server shutdown error: {0}")]
    Shutdown(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_error_messages() {
        let err = IndexError::NoStorage {
            adapter: "https://patch.example.net/3.26/".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "index has no storage root for adapter https://patch.example.net/3.26/"
        );
    }

    #[test]
    fn test_server_error_conversion() {
        let cfg = ConfigError::InvalidValue {
            option: "max-subrequests".to_string(),
            reason: "must be at least 1".to_string(),
        };
        let err: ServerError = cfg.into();
        assert!(err.to_string().contains("max-subrequests"));
    }
}
