//! JSON output formatter for duplicate scan results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     {
//!       "hash": "5d41402abc4b2a76b9719d911017c592",
//!       "size": 1024,
//!       "files": [
//!         {"id": "1a2b", "name": "report.pdf", "size": 1024, "path": "Work/2023", "path_error": null},
//!         {"id": "3c4d", "name": "report.pdf", "size": 1024, "path": null,
//!          "path_error": {"kind": "folder_not_found", "folder_id": "X", "reason": "..."}}
//!       ]
//!     }
//!   ],
//!   "unresolved": [
//!     {"id": "3c4d", "error": {"kind": "folder_not_found", "folder_id": "X", "reason": "..."}}
//!   ],
//!   "summary": {
//!     "total_files": 100,
//!     "duplicate_groups": 1,
//!     "reclaimable_space": 1024,
//!     "unresolved_paths": 1,
//!     "unresolved_duplicates": 1,
//!     "exit_code": 3,
//!     "exit_code_name": "DD003"
//!   }
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::duplicates::{DuplicateGroup, ScanSummary};
use crate::error::ExitCode;
use crate::resolver::{PathIndex, ResolveError};

/// One file of a duplicate group.
#[derive(Debug, Clone, Serialize)]
pub struct JsonFile {
    pub id: String,
    pub name: String,
    pub size: u64,
    /// Resolved folder path, `null` when resolution failed
    pub path: Option<String>,
    /// Why `path` is `null`
    pub path_error: Option<ResolveError>,
}

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    pub hash: String,
    /// Size of one copy in bytes
    pub size: u64,
    pub files: Vec<JsonFile>,
}

impl JsonDuplicateGroup {
    #[must_use]
    pub fn from_duplicate_group(group: &DuplicateGroup, paths: &PathIndex) -> Self {
        Self {
            hash: group.hash.clone(),
            size: group.size(),
            files: group
                .files
                .iter()
                .map(|f| JsonFile {
                    id: f.id.clone(),
                    name: f.name.clone(),
                    size: f.size,
                    path: paths.path(&f.id).map(str::to_string),
                    path_error: paths.error(&f.id).cloned(),
                })
                .collect(),
        }
    }
}

/// A file whose path could not be resolved.
#[derive(Debug, Clone, Serialize)]
pub struct JsonUnresolved {
    pub id: String,
    pub error: ResolveError,
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    pub total_files: usize,
    pub total_size: u64,
    pub hashless_files: usize,
    pub folder_records: usize,
    pub filtered_files: usize,
    pub duplicate_groups: usize,
    /// Duplicate copies, excluding the first file of each group
    pub duplicate_files: usize,
    pub reclaimable_space: u64,
    pub resolved_paths: usize,
    /// Every failed path, including files outside any group
    pub unresolved_paths: usize,
    /// Failed paths among group members
    pub unresolved_duplicates: usize,
    pub folder_lookups: usize,
    pub listing_duration_ms: u64,
    pub resolve_duration_ms: u64,
    pub scan_duration_ms: u64,
    pub exit_code: i32,
    /// Machine-readable exit code name (e.g., "DD000")
    pub exit_code_name: String,
}

impl JsonSummary {
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            total_files: summary.total_files,
            total_size: summary.total_size,
            hashless_files: summary.hashless_files,
            folder_records: summary.folder_records,
            filtered_files: summary.filtered_files,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            resolved_paths: summary.resolved_paths,
            unresolved_paths: summary.unresolved_paths,
            unresolved_duplicates: summary.unresolved_duplicates,
            folder_lookups: summary.folder_lookups,
            listing_duration_ms: summary.listing_duration.as_millis() as u64,
            resolve_duration_ms: summary.resolve_duration.as_millis() as u64,
            scan_duration_ms: summary.scan_duration.as_millis() as u64,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Every unresolved file, sorted by id
    pub unresolved: Vec<JsonUnresolved>,
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the JSON document.
    ///
    /// # Example
    ///
    /// ```
    /// use drivedupe::duplicates::ScanSummary;
    /// use drivedupe::error::ExitCode;
    /// use drivedupe::output::json::JsonOutput;
    /// use drivedupe::resolver::PathIndex;
    ///
    /// let output = JsonOutput::new(&[], &PathIndex::new(), &ScanSummary::default(), ExitCode::NoDuplicates);
    /// assert!(output.duplicates.is_empty());
    /// assert_eq!(output.summary.exit_code, 2);
    /// ```
    #[must_use]
    pub fn new(
        groups: &[DuplicateGroup],
        paths: &PathIndex,
        summary: &ScanSummary,
        exit_code: ExitCode,
    ) -> Self {
        Self {
            duplicates: groups
                .iter()
                .map(|g| JsonDuplicateGroup::from_duplicate_group(g, paths))
                .collect(),
            unresolved: paths
                .failures()
                .into_iter()
                .map(|(id, error)| JsonUnresolved {
                    id: id.to_string(),
                    error: error.clone(),
                })
                .collect(),
            summary: JsonSummary::from_scan_summary(summary, exit_code),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer, followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
