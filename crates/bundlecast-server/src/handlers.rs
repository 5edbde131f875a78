//! HTTP request handlers.
//!
//! Paths look like `/{version}/{path...}`: the version segment picks the
//! upstream patch root and scopes every index lookup, trailing-slash paths
//! list directories, and anything else is delivered straight out of its
//! bundle.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use bundlecast_formats::{BundleDescriptor, FileLocator};
use bundlecast_protocol::{Delivery, DeliveryError, UpstreamValidators};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::IndexError;
use crate::index::FileRecord;
use crate::listing;
use crate::state::AppState;
use crate::text;

/// Cache lifetime for listing responses; content under a version never
/// changes, so this is just shy of a month.
const LISTING_CACHE_CONTROL: &str = "public, max-age=2409962";

/// Handle GET /{version} and /{version}/: the version's root listing.
pub async fn handle_root(
    Path(version): Path<String>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    handle_entry(Path((version, String::new())), State(state), headers).await
}

/// Handle GET /{version}/{*path}: a directory listing or a file.
pub async fn handle_entry(
    Path((version, path)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if !is_version(&version) {
        return Err(AppError::NotFound(format!("/{version}/{path}")));
    }

    // Responses are keyed by version, so backing data effectively never
    // changes under a client's cached copy.
    if headers.contains_key(header::IF_MODIFIED_SINCE) {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    if path.is_empty() || path.ends_with('/') {
        show_dir(&state, &version, path.trim_end_matches('/')).await
    } else {
        show_file(&state, &version, &path, &headers).await
    }
}

/// A version segment is `<digits>.<anything>`.
fn is_version(segment: &str) -> bool {
    match segment.split_once('.') {
        Some((major, _)) => !major.is_empty() && major.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// The index adapter string for a version: upstream patch root + version.
fn adapter_for(state: &AppState, version: &str) -> String {
    format!("{}{version}/", state.config.upstream_for(version))
}

async fn show_dir(state: &AppState, version: &str, path: &str) -> Result<Response, AppError> {
    let adapter = adapter_for(state, version);
    let entries = state.index.list(path, &adapter).await?;
    debug!(
        version,
        path,
        dirs = entries.dirs.len(),
        files = entries.files.len(),
        "rendering listing"
    );

    let html = listing::render(path, version, &entries);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/html;charset=UTF-8"),
            (header::CACHE_CONTROL, LISTING_CACHE_CONTROL),
        ],
        html,
    )
        .into_response())
}

async fn show_file(
    state: &AppState,
    version: &str,
    path: &str,
    request_headers: &HeaderMap,
) -> Result<Response, AppError> {
    let adapter = adapter_for(state, version);
    let record = state
        .index
        .stat(path, &adapter)
        .await?
        .ok_or_else(|| AppError::NotFound(path.to_string()))?;

    if record.is_dir() {
        return Ok(Redirect::temporary(&format!("/{version}/{path}/")).into_response());
    }

    let locator = locator_for(state, &adapter, &record).await?;
    if locator.is_empty() {
        warn!(path, "empty file requested, returning empty response");
        return Ok(StatusCode::OK.into_response());
    }

    let client_etags = request_headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok());

    match state.delivery.deliver(&locator, client_etags).await? {
        Delivery::NotModified { validators } => {
            Ok((StatusCode::NOT_MODIFIED, validator_headers(&validators)).into_response())
        }
        Delivery::File(file) => {
            let mut headers = validator_headers(&file.validators);
            let mime = locator
                .mime_type
                .as_deref()
                .unwrap_or("application/octet-stream");
            if let Ok(value) = HeaderValue::from_str(mime) {
                headers.insert(header::CONTENT_TYPE, value);
            }

            if mime.starts_with("text/") {
                Ok((StatusCode::OK, headers, text::decode_utf16(&file.body)).into_response())
            } else {
                Ok((StatusCode::OK, headers, file.body).into_response())
            }
        }
    }
}

/// Build the typed locator for a file record, filling a missing storage
/// root from the version cache.
async fn locator_for(
    state: &AppState,
    adapter: &str,
    record: &FileRecord,
) -> Result<FileLocator, AppError> {
    let bundle = record
        .bundle
        .as_ref()
        .ok_or_else(|| AppError::BadRecord(format!("file record {} has no bundle", record.path)))?;
    let offset = record.bundle_offset.ok_or_else(|| {
        AppError::BadRecord(format!("file record {} has no bundle offset", record.path))
    })?;

    let base_url = match &record.storage {
        Some(storage) => storage.clone(),
        None => state.versions.storage_for(adapter, &state.index).await?,
    };

    Ok(FileLocator {
        bundle: BundleDescriptor {
            base_url,
            name: bundle.name.clone(),
            total_size: bundle.size,
        },
        offset,
        size: record.file_size.unwrap_or(0),
        mime_type: record.mime_type.clone(),
    })
}

/// Turn captured upstream validators into response headers.
fn validator_headers(validators: &UpstreamValidators) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in validators.iter() {
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert(HeaderName::from_static(name), value);
        }
    }
    headers
}

/// Application-level error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found (404)
    NotFound(String),
    /// Index collaborator failure (502)
    Index(IndexError),
    /// Delivery pipeline failure (400 for bad locators, 502 otherwise)
    Delivery(DeliveryError),
    /// The index returned a record the delivery engine cannot act on (500)
    BadRecord(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(path) => (StatusCode::NOT_FOUND, format!("not found: {path}")),
            Self::Index(err) => (StatusCode::BAD_GATEWAY, err.to_string()),
            Self::Delivery(err) if err.is_client_error() => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            Self::Delivery(err) => (StatusCode::BAD_GATEWAY, err.to_string()),
            Self::BadRecord(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            warn!(%status, %message, "request failed");
        }
        (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<IndexError> for AppError {
    fn from(err: IndexError) -> Self {
        Self::Index(err)
    }
}

impl From<DeliveryError> for AppError {
    fn from(err: DeliveryError) -> Self {
        Self::Delivery(err)
    }
}
