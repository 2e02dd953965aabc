//! In-memory file source.
//!
//! Backs offline snapshots and doubles as the fake source in tests: every
//! folder lookup is counted per id so callers can check how often the
//! source was consulted.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{FileRecord, FileSource, FolderNode, SourceError};

/// A file source holding its records and folders in memory.
#[derive(Debug, Default)]
pub struct MemorySource {
    files: Vec<FileRecord>,
    folders: HashMap<String, FolderNode>,
    unavailable: Option<String>,
    lookups: Mutex<HashMap<String, usize>>,
}

impl MemorySource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source whose listing always fails.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            unavailable: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Create a source from records and folders.
    #[must_use]
    pub fn from_parts(files: Vec<FileRecord>, folders: impl IntoIterator<Item = FolderNode>) -> Self {
        Self {
            files,
            folders: folders.into_iter().map(|f| (f.id.clone(), f)).collect(),
            ..Self::default()
        }
    }

    /// Add a file record.
    #[must_use]
    pub fn with_file(mut self, file: FileRecord) -> Self {
        self.files.push(file);
        self
    }

    /// Add a folder. A later folder with the same id replaces the earlier one.
    #[must_use]
    pub fn with_folder(mut self, folder: FolderNode) -> Self {
        self.folders.insert(folder.id.clone(), folder);
        self
    }

    /// Files held by this source.
    #[must_use]
    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    /// Number of `get_folder` calls made for `id`.
    #[must_use]
    pub fn lookup_count(&self, id: &str) -> usize {
        self.lookups
            .lock()
            .map(|counts| counts.get(id).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Total number of `get_folder` calls made.
    #[must_use]
    pub fn total_lookups(&self) -> usize {
        self.lookups
            .lock()
            .map(|counts| counts.values().sum())
            .unwrap_or(0)
    }
}

impl FileSource for MemorySource {
    fn list_all_files(&self) -> Result<Vec<FileRecord>, SourceError> {
        if let Some(reason) = &self.unavailable {
            return Err(SourceError::Unavailable(reason.clone()));
        }
        Ok(self.files.clone())
    }

    fn get_folder(&self, id: &str) -> Result<FolderNode, SourceError> {
        if let Ok(mut counts) = self.lookups.lock() {
            *counts.entry(id.to_string()).or_insert(0) += 1;
        }
        self.folders
            .get(id)
            .cloned()
            .ok_or_else(|| SourceError::FolderNotFound(id.to_string()))
    }
}
