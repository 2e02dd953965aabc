//! File sources: where the listing and folder metadata come from.
//!
//! The duplicate pipeline never talks to a remote store directly. It is
//! handed a [`FileSource`] at construction and uses two calls on it:
//!
//! * [`FileSource::list_all_files`] once per run, to get every record
//! * [`FileSource::get_folder`] on path-resolution cache misses
//!
//! Implementations:
//!
//! * [`DriveSource`]: Google Drive v3 over HTTPS
//! * [`MemorySource`]: in-memory records, used for snapshots and tests
//! * [`Snapshot`]: a JSON dump of a listing that loads into a `MemorySource`

pub mod drive;
pub mod memory;
pub mod record;
pub mod snapshot;

pub use drive::{DriveConfig, DriveSource};
pub use memory::MemorySource;
pub use record::{FileRecord, FolderNode, FOLDER_MIME_TYPE};
pub use snapshot::Snapshot;

/// Errors reported by a file source.
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    /// The requested folder does not exist (or is not visible to this account).
    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    /// The remote service could not be reached or refused the request.
    #[error("File source unavailable: {0}")]
    Unavailable(String),

    /// The listing was stopped by a shutdown request.
    #[error("Listing interrupted by user")]
    Interrupted,

    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be decoded.
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Capability object giving access to a user's file collection.
///
/// Implementations handle pagination, authentication and transport; callers
/// see a batch listing and a lookup by folder id.
pub trait FileSource {
    /// Return every file record in the collection.
    ///
    /// # Errors
    ///
    /// Any error here is fatal to the run: there is nothing to resolve.
    fn list_all_files(&self) -> Result<Vec<FileRecord>, SourceError>;

    /// Fetch one folder's name and parent.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::FolderNotFound`] when `id` does not exist, or
    /// another variant when the lookup itself fails.
    fn get_folder(&self, id: &str) -> Result<FolderNode, SourceError>;
}
