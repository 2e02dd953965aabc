//! File and folder records as reported by a file source.

use serde::{Deserialize, Serialize};

/// MIME type Drive uses for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Immutable snapshot of one file from the remote listing.
///
/// Records are produced by a [`FileSource`](super::FileSource) and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Unique identifier assigned by the remote store
    pub id: String,
    /// Display name
    pub name: String,
    /// Content checksum; empty for items that cannot be hashed (folders, native docs)
    #[serde(default)]
    pub content_hash: String,
    /// Size in bytes
    #[serde(default)]
    pub size: u64,
    /// Parent folder identifiers. Only the first entry is consulted.
    #[serde(default)]
    pub parents: Vec<String>,
    /// MIME type as reported by the source
    #[serde(default)]
    pub mime_type: String,
}

impl FileRecord {
    /// Create a record with no MIME type.
    ///
    /// # Example
    ///
    /// ```
    /// use drivedupe::source::FileRecord;
    ///
    /// let file = FileRecord::new("1", "a.txt", "h1", 10, vec!["F".to_string()]);
    /// assert_eq!(file.first_parent(), Some("F"));
    /// ```
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        content_hash: impl Into<String>,
        size: u64,
        parents: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            content_hash: content_hash.into(),
            size,
            parents,
            mime_type: String::new(),
        }
    }

    /// Set the MIME type.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// The parent folder used for path resolution, if any.
    #[must_use]
    pub fn first_parent(&self) -> Option<&str> {
        self.parents.first().map(String::as_str)
    }

    /// Whether this record carries a usable grouping key.
    #[must_use]
    pub fn has_content_hash(&self) -> bool {
        !self.content_hash.is_empty()
    }

    /// Whether the source reports this record as a folder.
    #[must_use]
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }
}

/// A folder in the parent chain of some file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderNode {
    pub id: String,
    pub name: String,
    /// Containing folder; `None` marks the top of the tree.
    #[serde(default)]
    pub parent: Option<String>,
}

impl FolderNode {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, parent: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent: parent.map(str::to_string),
        }
    }
}
