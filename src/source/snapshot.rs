//! Offline listing snapshots.
//!
//! A snapshot is the raw material of one run: the file listing plus the
//! folder nodes that were fetched while resolving paths. Loading it back
//! gives a [`MemorySource`] that reproduces the run without network access.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{FileRecord, FolderNode, MemorySource};
use crate::duplicates::ResolveScope;

/// Serializable listing snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// When the snapshot was taken.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Scope the folders were fetched for. With `duplicates`, folders of
    /// unique files are missing and only group members can be resolved.
    #[serde(default)]
    pub resolve: ResolveScope,
    /// Every listed file.
    pub files: Vec<FileRecord>,
    /// Folders known at the time the snapshot was written.
    #[serde(default)]
    pub folders: Vec<FolderNode>,
}

impl Snapshot {
    /// Create a snapshot stamped with the current time.
    ///
    /// Folders are sorted by id so the same run always writes the same file.
    #[must_use]
    pub fn new(files: Vec<FileRecord>, mut folders: Vec<FolderNode>) -> Self {
        folders.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            created_at: Utc::now(),
            resolve: ResolveScope::All,
            files,
            folders,
        }
    }

    /// Record the resolve scope the folders were fetched for.
    #[must_use]
    pub fn with_resolve_scope(mut self, scope: ResolveScope) -> Self {
        self.resolve = scope;
        self
    }

    /// Write the snapshot as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create snapshot file: {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .with_context(|| format!("Failed to write snapshot to: {}", path.display()))?;
        log::info!(
            "Saved snapshot with {} files and {} folders to {}",
            self.files.len(),
            self.folders.len(),
            path.display()
        );
        Ok(())
    }

    /// Read a snapshot from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open snapshot file: {}", path.display()))?;
        let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse snapshot file: {}", path.display()))?;
        log::debug!(
            "Loaded snapshot from {} ({} files, {} folders)",
            path.display(),
            snapshot.files.len(),
            snapshot.folders.len()
        );
        Ok(snapshot)
    }

    /// Turn the snapshot into a file source.
    #[must_use]
    pub fn into_source(self) -> MemorySource {
        MemorySource::from_parts(self.files, self.folders)
    }
}
