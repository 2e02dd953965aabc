//! Duplicate finder: the list → group → resolve pipeline.
//!
//! # Overview
//!
//! [`DuplicateFinder`] runs one complete scan against a [`FileSource`]:
//! 1. **Listing** - fetch every file record (fatal on failure)
//! 2. **Grouping** - group records by content hash (see [`crate::duplicates::groups`])
//! 3. **Resolution** - resolve folder paths (see [`crate::resolver`]); failures
//!    are recorded per file and never abort the scan
//!
//! # Example
//!
//! ```
//! use drivedupe::duplicates::{DuplicateFinder, FinderConfig};
//! use drivedupe::source::{FileRecord, FolderNode, MemorySource};
//!
//! let source = MemorySource::new()
//!     .with_folder(FolderNode::new("F", "Docs", None))
//!     .with_file(FileRecord::new("1", "a.txt", "h1", 10, vec!["F".to_string()]))
//!     .with_file(FileRecord::new("2", "b.txt", "h1", 10, vec!["F".to_string()]));
//!
//! let finder = DuplicateFinder::new(&source, FinderConfig::default());
//! let report = finder.find_duplicates().unwrap();
//!
//! assert_eq!(report.groups.len(), 1);
//! assert_eq!(report.paths.path("1"), Some("Docs"));
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::groups::{group_duplicates_structured, DuplicateGroup};
use crate::progress::ProgressCallback;
use crate::resolver::{PathIndex, PathResolver, ResolverConfig};
use crate::source::{FileRecord, FileSource, FolderNode, SourceError};

/// Which files get their folder path resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveScope {
    /// Every listed file
    #[default]
    All,
    /// Only files that belong to a duplicate group
    Duplicates,
}

impl std::fmt::Display for ResolveScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveScope::All => write!(f, "all"),
            ResolveScope::Duplicates => write!(f, "duplicates"),
        }
    }
}

/// Configuration for the duplicate finder.
#[derive(Clone, Default)]
pub struct FinderConfig {
    /// Ignore files smaller than this many bytes when grouping.
    pub min_size: Option<u64>,
    /// Ignore files larger than this many bytes when grouping.
    pub max_size: Option<u64>,
    /// Which files get a resolved path.
    pub resolve_scope: ResolveScope,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("min_size", &self.min_size)
            .field("max_size", &self.max_size)
            .field("resolve_scope", &self.resolve_scope)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl FinderConfig {
    /// Set the minimum file size considered for grouping.
    #[must_use]
    pub fn with_min_size(mut self, size: Option<u64>) -> Self {
        self.min_size = size;
        self
    }

    /// Set the maximum file size considered for grouping.
    #[must_use]
    pub fn with_max_size(mut self, size: Option<u64>) -> Self {
        self.max_size = size;
        self
    }

    /// Set which files get their path resolved.
    #[must_use]
    pub fn with_resolve_scope(mut self, scope: ResolveScope) -> Self {
        self.resolve_scope = scope;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
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

    fn size_in_range(&self, size: u64) -> bool {
        self.min_size.is_none_or(|min| size >= min) && self.max_size.is_none_or(|max| size <= max)
    }
}

/// Summary statistics from a scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSummary {
    /// Total number of records listed
    pub total_files: usize,
    /// Total size of all listed records in bytes
    pub total_size: u64,
    /// Records without a content hash (never grouped)
    pub hashless_files: usize,
    /// Listed records that are folders (a subset of `hashless_files`)
    pub folder_records: usize,
    /// Records excluded by the size filter
    pub filtered_files: usize,
    /// Number of duplicate groups
    pub duplicate_groups: usize,
    /// Number of duplicate copies (excluding the first file of each group)
    pub duplicate_files: usize,
    /// Space held by duplicate copies
    pub reclaimable_space: u64,
    /// Files with a resolved path
    pub resolved_paths: usize,
    /// Files whose path could not be resolved
    pub unresolved_paths: usize,
    /// Duplicate group members whose path could not be resolved
    pub unresolved_duplicates: usize,
    /// Folder lookups made against the source
    pub folder_lookups: usize,
    /// Duration of the listing phase
    pub listing_duration: Duration,
    /// Duration of the path resolution phase
    pub resolve_duration: Duration,
    /// Duration of the entire scan
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Calculate the percentage of space that is wasted by duplicates.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        bytesize::ByteSize::b(self.reclaimable_space).to_string()
    }

    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        bytesize::ByteSize::b(self.total_size).to_string()
    }
}

/// Count group members whose path is missing or failed.
///
/// Only these show up as `<unresolved>` in a report; failures for files
/// outside any group are tracked in [`ScanSummary::unresolved_paths`].
#[must_use]
pub fn unresolved_members(groups: &[DuplicateGroup], paths: &PathIndex) -> usize {
    groups
        .iter()
        .flat_map(|g| g.files.iter())
        .filter(|f| paths.path(&f.id).is_none())
        .count()
}

/// Everything a scan produced.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Duplicate groups, largest waste first
    pub groups: Vec<DuplicateGroup>,
    /// Resolved folder path per file id
    pub paths: PathIndex,
    /// Scan statistics
    pub summary: ScanSummary,
    /// The full listing
    pub files: Vec<FileRecord>,
    /// Folders fetched during resolution
    pub folders: Vec<FolderNode>,
}

/// Errors that abort a scan.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The listing call failed; nothing could be resolved.
    #[error("Could not list files: {0}")]
    SourceUnavailable(#[source] SourceError),
}

impl From<SourceError> for FinderError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Interrupted => FinderError::Interrupted,
            other => FinderError::SourceUnavailable(other),
        }
    }
}

/// Duplicate finder over an injected file source.
pub struct DuplicateFinder<'a> {
    source: &'a dyn FileSource,
    config: FinderConfig,
}

impl<'a> DuplicateFinder<'a> {
    /// Create a new duplicate finder.
    ///
    /// # Arguments
    ///
    /// * `source` - Where files and folder metadata come from
    /// * `config` - Configuration for the finder
    #[must_use]
    pub fn new(source: &'a dyn FileSource, config: FinderConfig) -> Self {
        Self { source, config }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults(source: &'a dyn FileSource) -> Self {
        Self::new(source, FinderConfig::default())
    }

    /// Run the full pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::SourceUnavailable`] if the listing fails and
    /// [`FinderError::Interrupted`] on a shutdown request. Per-file path
    /// failures are not errors; they are recorded in [`ScanReport::paths`].
    pub fn find_duplicates(&self) -> Result<ScanReport, FinderError> {
        let start_time = Instant::now();
        let mut summary = ScanSummary::default();

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        // Listing
        let listing_start = Instant::now();
        let files = self.source.list_all_files()?;
        summary.listing_duration = listing_start.elapsed();
        summary.total_files = files.len();
        summary.total_size = files.iter().map(|f| f.size).sum();
        log::info!(
            "Listing complete: {} files in {:?}",
            files.len(),
            summary.listing_duration
        );

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        // Grouping
        let candidates: Vec<FileRecord> = files
            .iter()
            .filter(|f| self.config.size_in_range(f.size))
            .cloned()
            .collect();
        summary.filtered_files = files.len() - candidates.len();
        if summary.filtered_files > 0 {
            log::debug!("Size filter excluded {} files", summary.filtered_files);
        }

        let (groups, stats) = group_duplicates_structured(&candidates);
        summary.hashless_files = files.iter().filter(|f| !f.has_content_hash()).count();
        summary.folder_records = files.iter().filter(|f| f.is_folder()).count();
        summary.duplicate_groups = stats.duplicate_groups;
        summary.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        summary.reclaimable_space = groups.iter().map(DuplicateGroup::wasted_space).sum();
        for group in &groups {
            log::trace!("Group {}: {}", group.hash, group.ids().join(", "));
        }

        // Resolution
        let resolve_start = Instant::now();
        let mut resolver_config = ResolverConfig::default();
        if let Some(ref flag) = self.config.shutdown_flag {
            resolver_config = resolver_config.with_shutdown_flag(flag.clone());
        }
        if let Some(ref callback) = self.config.progress_callback {
            resolver_config = resolver_config.with_progress_callback(callback.clone());
        }
        let mut resolver = PathResolver::with_config(self.source, resolver_config);

        let paths = match self.config.resolve_scope {
            ResolveScope::All => resolver.resolve_paths(&files),
            ResolveScope::Duplicates => {
                resolver.resolve_paths(groups.iter().flat_map(|g| g.files.iter()))
            }
        };
        if paths.is_interrupted() {
            return Err(FinderError::Interrupted);
        }

        summary.resolve_duration = resolve_start.elapsed();
        summary.resolved_paths = paths.resolved_count();
        summary.unresolved_paths = paths.failed_count();
        summary.unresolved_duplicates = unresolved_members(&groups, &paths);
        summary.folder_lookups = resolver.folder_lookups();
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Scan complete: {} duplicate groups, {} reclaimable, {} unresolved paths ({} in groups)",
            summary.duplicate_groups,
            summary.reclaimable_display(),
            summary.unresolved_paths,
            summary.unresolved_duplicates
        );

        let folders = resolver.cached_folders();
        Ok(ScanReport {
            groups,
            paths,
            summary,
            files,
            folders,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    fn docs_source() -> MemorySource {
        MemorySource::new()
            .with_folder(FolderNode::new("F", "Docs", None))
            .with_file(FileRecord::new("1", "a.txt", "h1", 100, vec!["F".into()]))
            .with_file(FileRecord::new("2", "b.txt", "h1", 100, vec!["F".into()]))
            .with_file(FileRecord::new("3", "c.txt", "h2", 50, Vec::new()))
    }

    #[test]
    fn test_find_duplicates_basic() {
        let source = docs_source();
        let report = DuplicateFinder::with_defaults(&source)
            .find_duplicates()
            .unwrap();

        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].ids(), vec!["1", "2"]);
        assert_eq!(report.paths.path("1"), Some("Docs"));
        assert_eq!(report.paths.path("3"), Some("root"));
        assert_eq!(report.summary.total_files, 3);
        assert_eq!(report.summary.total_size, 250);
        assert_eq!(report.summary.duplicate_files, 1);
        assert_eq!(report.summary.reclaimable_space, 100);
        assert_eq!(report.summary.folder_lookups, 1);
        assert_eq!(report.folders.len(), 1);
    }

    #[test]
    fn test_unresolved_unique_file_not_counted_as_duplicate() {
        let source = MemorySource::new()
            .with_folder(FolderNode::new("F", "Docs", None))
            .with_file(FileRecord::new("1", "a", "h1", 5, vec!["F".into()]))
            .with_file(FileRecord::new("2", "b", "h1", 5, vec!["F".into()]))
            .with_file(FileRecord::new("3", "c", "u", 5, vec!["gone".into()]));

        let report = DuplicateFinder::with_defaults(&source).find_duplicates().unwrap();

        assert_eq!(report.summary.unresolved_paths, 1);
        assert_eq!(report.summary.unresolved_duplicates, 0);
        assert!(report.paths.error("3").is_some());
    }

    #[test]
    fn test_unresolved_members_counts_group_files_only() {
        let groups = vec![DuplicateGroup::new(
            "h",
            vec![
                FileRecord::new("1", "a", "h", 1, Vec::new()),
                FileRecord::new("2", "b", "h", 1, Vec::new()),
            ],
        )];
        let mut paths = PathIndex::new();
        paths.insert("1", Ok("Docs".to_string()));
        paths.insert("2", Err(crate::resolver::ResolveError::folder_not_found("X", "gone")));
        paths.insert("9", Err(crate::resolver::ResolveError::folder_not_found("Y", "gone")));

        assert_eq!(unresolved_members(&groups, &paths), 1);
    }

    #[test]
    fn test_folder_records_counted() {
        let source = docs_source().with_file(
            FileRecord::new("F", "Docs", "", 0, Vec::new())
                .with_mime_type(crate::source::FOLDER_MIME_TYPE),
        );
        let report = DuplicateFinder::with_defaults(&source).find_duplicates().unwrap();
        assert_eq!(report.summary.folder_records, 1);
        assert_eq!(report.summary.hashless_files, 1);
    }

    #[test]
    fn test_duplicates_scope_skips_unique_files() {
        let source = MemorySource::new()
            .with_folder(FolderNode::new("F", "Docs", None))
            .with_folder(FolderNode::new("G", "Other", None))
            .with_file(FileRecord::new("1", "a", "h", 1, vec!["F".into()]))
            .with_file(FileRecord::new("2", "b", "h", 1, vec!["F".into()]))
            .with_file(FileRecord::new("3", "c", "u", 1, vec!["G".into()]));

        let config = FinderConfig::default().with_resolve_scope(ResolveScope::Duplicates);
        let report = DuplicateFinder::new(&source, config).find_duplicates().unwrap();

        assert_eq!(report.paths.len(), 2);
        assert!(report.paths.get("3").is_none());
        assert_eq!(source.lookup_count("G"), 0);
    }

    #[test]
    fn test_size_filter() {
        let source = docs_source();
        let config = FinderConfig::default().with_min_size(Some(101));
        let report = DuplicateFinder::new(&source, config).find_duplicates().unwrap();

        assert!(report.groups.is_empty());
        assert_eq!(report.summary.filtered_files, 3);
    }

    #[test]
    fn test_source_unavailable() {
        let source = MemorySource::unavailable("connection refused");
        let result = DuplicateFinder::with_defaults(&source).find_duplicates();
        assert!(matches!(result, Err(FinderError::SourceUnavailable(_))));
        assert_eq!(source.total_lookups(), 0);
    }

    #[test]
    fn test_interrupted_before_start() {
        let source = docs_source();
        let flag = Arc::new(AtomicBool::new(true));
        let config = FinderConfig::default().with_shutdown_flag(flag);
        let result = DuplicateFinder::new(&source, config).find_duplicates();
        assert!(matches!(result, Err(FinderError::Interrupted)));
    }

    #[test]
    fn test_source_interrupted_maps_to_interrupted() {
        let err = FinderError::from(SourceError::Interrupted);
        assert!(matches!(err, FinderError::Interrupted));
    }

    #[test]
    fn test_wasted_percentage() {
        let summary = ScanSummary {
            total_size: 200,
            reclaimable_space: 50,
            ..Default::default()
        };
        assert!((summary.wasted_percentage() - 25.0).abs() < f64::EPSILON);
        assert_eq!(ScanSummary::default().wasted_percentage(), 0.0);
    }

    #[test]
    fn test_scope_display() {
        assert_eq!(ResolveScope::All.to_string(), "all");
        assert_eq!(ResolveScope::Duplicates.to_string(), "duplicates");
    }
}
