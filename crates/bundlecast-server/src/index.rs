//! Client for the metadata index service.
//!
//! The index is an external SQL-backed service that knows which directories
//! and files exist and where each file sits inside its bundle. It is queried
//! over HTTP and answers JSON; the dynamic rows it returns are deserialized
//! into typed records at this boundary so everything downstream works with
//! typed values only.

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::IndexError;

/// A directory or file entry as the index reports it.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FileRecord {
    /// Full path of the entry
    pub path: String,
    /// Parent directory path
    #[serde(default)]
    pub dirname: String,
    /// Entry name without the directory
    pub basename: String,
    /// CDN root this entry's bundle is served under, when known
    #[serde(default)]
    pub storage: Option<String>,
    /// Whether this is a file or a directory
    #[serde(rename = "type")]
    pub kind: RecordKind,
    /// File extension, if the name has one
    #[serde(default)]
    pub extension: Option<String>,
    /// File size in bytes
    #[serde(default)]
    pub file_size: Option<u64>,
    /// The bundle holding this file's bytes
    #[serde(default)]
    pub bundle: Option<BundleRef>,
    /// Offset of this file within the decompressed bundle
    #[serde(default)]
    pub bundle_offset: Option<u64>,
    /// MIME type the index guessed from the name
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl FileRecord {
    /// True for directory entries.
    pub fn is_dir(&self) -> bool {
        self.kind == RecordKind::Dir
    }
}

/// Entry kind discriminator.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Regular file stored in a bundle
    File,
    /// Directory
    Dir,
}

/// A bundle reference attached to a file record.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BundleRef {
    /// Bundle name without path or extension
    pub name: String,
    /// Total decompressed size of the bundle
    pub size: u64,
}

/// The index's response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexResponse {
    /// Known CDN storage roots, current first
    #[serde(default)]
    pub storages: Vec<String>,
    /// Adapter the response is scoped to
    #[serde(default)]
    pub adapter: String,
    /// Matching entries
    #[serde(default)]
    pub files: Vec<FileRecord>,
}

/// A directory listing split into its two entry kinds.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// Subdirectories
    pub dirs: Vec<FileRecord>,
    /// Files
    pub files: Vec<FileRecord>,
}

/// HTTP client for the index service.
#[derive(Debug, Clone)]
pub struct IndexClient {
    http: Client,
    base: Url,
}

impl IndexClient {
    /// Create an index client for the given service base URL.
    pub fn new(http: Client, base: Url) -> Self {
        Self { http, base }
    }

    /// Look up a single path. `None` when the index knows nothing about it.
    pub async fn stat(&self, path: &str, adapter: &str) -> Result<Option<FileRecord>, IndexError> {
        let response = self.query("details", path, adapter).await?;
        Ok(response.files.into_iter().next())
    }

    /// List a directory's entries, split into dirs and files.
    pub async fn list(&self, path: &str, adapter: &str) -> Result<Listing, IndexError> {
        let response = self.query("index", path, adapter).await?;
        let mut listing = Listing::default();
        for record in response.files {
            if record.is_dir() {
                listing.dirs.push(record);
            } else {
                listing.files.push(record);
            }
        }
        Ok(listing)
    }

    /// The current CDN storage root for an adapter.
    pub async fn current_version(&self, adapter: &str) -> Result<String, IndexError> {
        let response = self.query("version", "", adapter).await?;
        response
            .storages
            .into_iter()
            .next()
            .ok_or_else(|| IndexError::NoStorage {
                adapter: adapter.to_string(),
            })
    }

    async fn query(
        &self,
        command: &str,
        path: &str,
        adapter: &str,
    ) -> Result<IndexResponse, IndexError> {
        let mut url = self.base.clone();
        url.set_path("/files");
        url.query_pairs_mut()
            .append_pair("q", command)
            .append_pair("path", path)
            .append_pair("adapter", adapter);

        debug!(%url, "querying index");
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IndexError::Status {
                status,
                url: url.to_string(),
            });
        }
        Ok(response.json().await?)
    }
}
