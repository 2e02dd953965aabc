//! Google Drive v3 file source.
//!
//! Lists the whole collection page by page and fetches folder metadata on
//! demand. Authentication is a plain bearer token; obtaining and refreshing
//! it is left to the caller (a stored `token.json` can be read with
//! [`load_access_token`]).

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use super::{FileRecord, FileSource, FolderNode, SourceError};
use crate::progress::ProgressCallback;

/// Public Drive v3 endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/drive/v3";

/// Largest page size the listing endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType, size, md5Checksum, parents)";
const FOLDER_FIELDS: &str = "id, name, parents";
const USER_AGENT: &str = concat!("drivedupe/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`DriveSource`].
#[derive(Clone)]
pub struct DriveConfig {
    /// Base URL of the v3 API, without trailing `files`.
    pub api_base_url: String,
    /// OAuth access token sent as a bearer token.
    pub access_token: String,
    /// Files requested per listing page (1..=1000).
    pub page_size: u32,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for DriveConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveConfig")
            .field("api_base_url", &self.api_base_url)
            .field("access_token", &"<redacted>")
            .field("page_size", &self.page_size)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl DriveConfig {
    /// Create a configuration for the public endpoint.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            access_token: access_token.into(),
            page_size: MAX_PAGE_SIZE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Override the API base URL.
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Set the listing page size, clamped to 1..=1000.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// One file entry as returned by the Drive API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    mime_type: String,
    /// int64 encoded as a decimal string
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    md5_checksum: Option<String>,
    #[serde(default)]
    parents: Vec<String>,
}

impl From<DriveFile> for FileRecord {
    fn from(file: DriveFile) -> Self {
        let size = file
            .size
            .as_deref()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);
        FileRecord {
            id: file.id,
            name: file.name,
            content_hash: file.md5_checksum.unwrap_or_default(),
            size,
            parents: file.parents,
            mime_type: file.mime_type,
        }
    }
}

impl From<DriveFile> for FolderNode {
    fn from(file: DriveFile) -> Self {
        FolderNode {
            id: file.id,
            name: file.name,
            parent: file.parents.into_iter().next(),
        }
    }
}

/// One page of the `files.list` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFileList {
    #[serde(default)]
    next_page_token: Option<String>,
    #[serde(default)]
    files: Vec<DriveFile>,
}

/// File source backed by the Drive v3 REST API.
pub struct DriveSource {
    client: Client,
    config: DriveConfig,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl DriveSource {
    /// Build a source with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be constructed (TLS backend setup).
    pub fn new(config: DriveConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;
        log::debug!("Drive source configured: {:?}", config);
        Ok(Self {
            client,
            config,
            shutdown_flag: None,
            progress_callback: None,
        })
    }

    /// Stop listing between pages once this flag is raised.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Report listing progress.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Build `<base>/<segments...>`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, SourceError> {
        let mut url = Url::parse(&self.config.api_base_url).map_err(|e| {
            SourceError::Unavailable(format!(
                "invalid API base URL '{}': {e}",
                self.config.api_base_url
            ))
        })?;
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                SourceError::Unavailable(format!(
                    "API base URL cannot take a path: {}",
                    self.config.api_base_url
                ))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    fn fetch_page(&self, page_token: Option<&str>) -> Result<DriveFileList, SourceError> {
        let mut request = self
            .client
            .get(self.endpoint(&["files"])?)
            .bearer_auth(&self.config.access_token)
            .query(&[
                ("pageSize", self.config.page_size.to_string()),
                ("fields", LIST_FIELDS.to_string()),
            ]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request
            .send()
            .map_err(|e| SourceError::Unavailable(format!("listing request failed: {e}")))?;
        let response = ensure_success(response, "listing")?;
        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl FileSource for DriveSource {
    fn list_all_files(&self) -> Result<Vec<FileRecord>, SourceError> {
        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_start("listing", 0);
        }

        let mut files: Vec<FileRecord> = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        let result = loop {
            if self.is_shutdown_requested() {
                break Err(SourceError::Interrupted);
            }

            let page = match self.fetch_page(page_token.as_deref()) {
                Ok(page) => page,
                Err(e) => break Err(e),
            };
            pages += 1;
            log::debug!("Listing page {}: {} files", pages, page.files.len());

            files.extend(page.files.into_iter().map(FileRecord::from));
            if let Some(ref callback) = self.progress_callback {
                callback.on_progress(files.len(), &format!("page {pages}"));
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break Ok(()),
            }
        };

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_end("listing");
        }
        result?;

        log::info!("Listed {} files in {} page(s)", files.len(), pages);
        Ok(files)
    }

    fn get_folder(&self, id: &str) -> Result<FolderNode, SourceError> {
        log::trace!("Fetching folder metadata for {}", id);
        let response = self
            .client
            .get(self.endpoint(&["files", id])?)
            .bearer_auth(&self.config.access_token)
            .query(&[("fields", FOLDER_FIELDS)])
            .send()?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SourceError::FolderNotFound(id.to_string()));
        }
        let response = ensure_success(response, "folder lookup")?;
        let file: DriveFile = serde_json::from_str(&response.text()?)?;
        Ok(FolderNode::from(file))
    }
}

/// Turn a non-2xx response into [`SourceError::Unavailable`] carrying the body.
fn ensure_success(response: Response, what: &str) -> Result<Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(SourceError::Unavailable(format!(
        "{what} returned {status}: {}",
        truncate(body.trim(), 200)
    )))
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

/// Token file layout written by the usual OAuth2 client libraries.
#[derive(Debug, Deserialize)]
struct StoredToken {
    access_token: String,
}

/// Read the access token from a stored `token.json`.
///
/// # Errors
///
/// Fails if the file cannot be read, is not JSON, or has an empty
/// `access_token` field.
pub fn load_access_token(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read token file: {}", path.display()))?;
    let token: StoredToken = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse token file: {}", path.display()))?;
    if token.access_token.trim().is_empty() {
        anyhow::bail!("Token file has an empty access_token: {}", path.display());
    }
    Ok(token.access_token)
}
