//! Data structures for saved scans.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::duplicates::{DuplicateGroup, FinderConfig, ResolveScope, ScanReport, ScanSummary};
use crate::resolver::{PathIndex, ResolveError};
use crate::source::FileRecord;

/// Current version of the session file format.
pub const SESSION_VERSION: u32 = 1;

/// A finished scan, as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Format version.
    pub version: u32,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Where the listing came from (API base URL or snapshot path).
    pub source: String,
    /// Settings used during the scan.
    pub settings: SessionSettings,
    /// Statistics of the original scan.
    pub summary: ScanSummary,
    /// Duplicate groups, in report order.
    pub groups: Vec<SessionGroup>,
    /// Every file whose path could not be resolved, grouped or not.
    #[serde(default)]
    pub unresolved: Vec<UnresolvedFile>,
}

/// Settings used during the scan that produced the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Minimum file size considered (in bytes).
    pub min_size: Option<u64>,
    /// Maximum file size considered (in bytes).
    pub max_size: Option<u64>,
    /// Which files had their path resolved.
    pub resolve: ResolveScope,
}

impl From<&FinderConfig> for SessionSettings {
    fn from(config: &FinderConfig) -> Self {
        Self {
            min_size: config.min_size,
            max_size: config.max_size,
            resolve: config.resolve_scope,
        }
    }
}

/// A duplicate group within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionGroup {
    /// 1-based position in the report.
    pub id: usize,
    /// Shared content hash.
    pub hash: String,
    /// Size of one copy in bytes.
    pub size: u64,
    pub files: Vec<SessionFile>,
}

/// One group member with its resolution result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFile {
    pub id: String,
    pub name: String,
    pub size: u64,
    #[serde(default)]
    pub parents: Vec<String>,
    /// Resolved folder path.
    pub path: Option<String>,
    /// Why the path is missing, when it is.
    pub path_error: Option<ResolveError>,
}

/// A file whose path could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedFile {
    pub id: String,
    pub error: ResolveError,
}

impl Session {
    /// Capture a finished report.
    #[must_use]
    pub fn from_report(report: &ScanReport, source: impl Into<String>, settings: SessionSettings) -> Self {
        let groups = report
            .groups
            .iter()
            .enumerate()
            .map(|(i, group)| SessionGroup {
                id: i + 1,
                hash: group.hash.clone(),
                size: group.size(),
                files: group
                    .files
                    .iter()
                    .map(|file| SessionFile {
                        id: file.id.clone(),
                        name: file.name.clone(),
                        size: file.size,
                        parents: file.parents.clone(),
                        path: report.paths.path(&file.id).map(str::to_string),
                        path_error: report.paths.error(&file.id).cloned(),
                    })
                    .collect(),
            })
            .collect();

        let unresolved = report
            .paths
            .failures()
            .into_iter()
            .map(|(id, error)| UnresolvedFile {
                id: id.to_string(),
                error: error.clone(),
            })
            .collect();

        Self {
            version: SESSION_VERSION,
            created_at: Utc::now(),
            source: source.into(),
            settings,
            summary: report.summary.clone(),
            groups,
            unresolved,
        }
    }

    /// Rebuild the groups and path index for the reporters.
    #[must_use]
    pub fn to_results(&self) -> (Vec<DuplicateGroup>, PathIndex) {
        let mut paths = PathIndex::new();
        let groups = self
            .groups
            .iter()
            .map(|group| {
                let files = group
                    .files
                    .iter()
                    .map(|file| {
                        match (&file.path, &file.path_error) {
                            (Some(path), _) => {
                                paths.insert(file.id.clone(), Ok(path.clone()));
                            }
                            (None, Some(err)) => {
                                paths.insert(file.id.clone(), Err(err.clone()));
                            }
                            (None, None) => {}
                        }
                        FileRecord::new(
                            file.id.clone(),
                            file.name.clone(),
                            group.hash.clone(),
                            file.size,
                            file.parents.clone(),
                        )
                    })
                    .collect();
                DuplicateGroup::new(group.hash.clone(), files)
            })
            .collect();

        for entry in &self.unresolved {
            paths.insert(entry.id.clone(), Err(entry.error.clone()));
        }

        (groups, paths)
    }

    /// Number of files across all groups.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.groups.iter().map(|g| g.files.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> ScanReport {
        let group = DuplicateGroup::new(
            "h1",
            vec![
                FileRecord::new("1", "a.txt", "h1", 10, vec!["F".into()]),
                FileRecord::new("2", "b.txt", "h1", 10, vec!["X".into()]),
            ],
        );
        let mut paths = PathIndex::new();
        paths.insert("1", Ok("Docs".to_string()));
        paths.insert("2", Err(ResolveError::folder_not_found("X", "404")));
        paths.insert("3", Err(ResolveError::CycleDetected { folder_id: "C".into() }));

        ScanReport {
            groups: vec![group],
            paths,
            summary: ScanSummary {
                total_files: 3,
                duplicate_groups: 1,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_from_report_captures_paths_and_errors() {
        let session = Session::from_report(&sample_report(), "memory", SessionSettings::default());

        assert_eq!(session.version, SESSION_VERSION);
        assert_eq!(session.groups.len(), 1);
        assert_eq!(session.groups[0].id, 1);
        assert_eq!(session.groups[0].size, 10);
        assert_eq!(session.groups[0].files[0].path.as_deref(), Some("Docs"));
        assert!(session.groups[0].files[1].path.is_none());
        assert!(session.groups[0].files[1].path_error.is_some());
        assert_eq!(session.unresolved.len(), 2);
        assert_eq!(session.file_count(), 2);
    }

    #[test]
    fn test_to_results_restores_groups_and_index() {
        let report = sample_report();
        let session = Session::from_report(&report, "memory", SessionSettings::default());
        let (groups, paths) = session.to_results();

        assert_eq!(groups, report.groups);
        assert_eq!(paths.path("1"), Some("Docs"));
        assert!(paths.error("2").is_some());
        assert!(matches!(
            paths.error("3"),
            Some(ResolveError::CycleDetected { .. })
        ));
        assert_eq!(paths.failed_count(), 2);
    }

    #[test]
    fn test_settings_from_finder_config() {
        let config = FinderConfig::default()
            .with_min_size(Some(5))
            .with_resolve_scope(ResolveScope::Duplicates);
        let settings = SessionSettings::from(&config);
        assert_eq!(settings.min_size, Some(5));
        assert_eq!(settings.max_size, None);
        assert_eq!(settings.resolve, ResolveScope::Duplicates);
    }
}
