//! Duplicate grouping by content hash.
//!
//! # Overview
//!
//! Two files are duplicates when the source reports the same content hash
//! for both. Grouping is a single pass over the listing that remembers the
//! first file seen for each hash; when a second file with that hash shows
//! up, a group holding both is started, and later matches are appended.
//!
//! Files with an empty hash (folders, native documents, shortcuts) are never
//! grouped, not even with each other.
//!
//! # Example
//!
//! ```
//! use drivedupe::duplicates::group_duplicates;
//! use drivedupe::source::FileRecord;
//!
//! let files = vec![
//!     FileRecord::new("1", "a.txt", "h1", 10, vec!["F".to_string()]),
//!     FileRecord::new("2", "b.txt", "h1", 10, vec!["F".to_string()]),
//!     FileRecord::new("3", "c.txt", "h2", 20, Vec::new()),
//! ];
//!
//! let groups = group_duplicates(&files);
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups["h1"].len(), 2);
//! assert_eq!(groups["h1"][0].id, "1");
//! ```

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::source::FileRecord;

/// Files sharing one content hash, first-seen file first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Content hash shared by every file in the group
    pub hash: String,
    /// Members in listing order
    pub files: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Create a duplicate group.
    #[must_use]
    pub fn new(hash: impl Into<String>, files: Vec<FileRecord>) -> Self {
        Self {
            hash: hash.into(),
            files,
        }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Size of one copy (taken from the first file).
    #[must_use]
    pub fn size(&self) -> u64 {
        self.files.first().map_or(0, |f| f.size)
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// Space taken by every copy beyond the first.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.total_size().saturating_sub(self.size())
    }

    /// Number of duplicate copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Ids of the member files, in group order.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.id.as_str()).collect()
    }
}

/// Statistics from a grouping pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of records seen
    pub total_files: usize,
    /// Total size of all records in bytes
    pub total_size: u64,
    /// Records skipped because they carry no content hash
    pub hashless_files: usize,
    /// Number of distinct non-empty hashes
    pub unique_hashes: usize,
    /// Number of hashes shared by 2+ files
    pub duplicate_groups: usize,
    /// Number of files that belong to some group
    pub grouped_files: usize,
}

/// Group files that share a non-empty content hash.
///
/// Single pass, keeping the first-seen record for each hash. Only hashes
/// seen at least twice produce a group. Members keep listing order.
///
/// No ordering is implied across hashes.
#[must_use]
pub fn group_duplicates(files: &[FileRecord]) -> HashMap<String, Vec<FileRecord>> {
    let mut first_seen: HashMap<&str, &FileRecord> = HashMap::new();
    let mut groups: HashMap<String, Vec<FileRecord>> = HashMap::new();

    for file in files {
        if !file.has_content_hash() {
            continue;
        }

        match first_seen.entry(file.content_hash.as_str()) {
            Entry::Vacant(slot) => {
                slot.insert(file);
            }
            Entry::Occupied(first) => {
                groups
                    .entry(file.content_hash.clone())
                    .or_insert_with(|| vec![(*first.get()).clone()])
                    .push(file.clone());
            }
        }
    }

    groups
}

/// Group files by hash, returning sorted [`DuplicateGroup`]s and statistics.
///
/// Membership is exactly that of [`group_duplicates`]. Groups are sorted by
/// wasted space (largest first), then by hash, so reports are stable across
/// runs.
///
/// # Example
///
/// ```
/// use drivedupe::duplicates::group_duplicates_structured;
/// use drivedupe::source::FileRecord;
///
/// let files = vec![
///     FileRecord::new("1", "small-a", "s", 10, Vec::new()),
///     FileRecord::new("2", "small-b", "s", 10, Vec::new()),
///     FileRecord::new("3", "big-a", "b", 1000, Vec::new()),
///     FileRecord::new("4", "big-b", "b", 1000, Vec::new()),
///     FileRecord::new("5", "folder", "", 0, Vec::new()),
/// ];
///
/// let (groups, stats) = group_duplicates_structured(&files);
/// assert_eq!(groups[0].hash, "b");
/// assert_eq!(stats.hashless_files, 1);
/// assert_eq!(stats.grouped_files, 4);
/// ```
#[must_use]
pub fn group_duplicates_structured(files: &[FileRecord]) -> (Vec<DuplicateGroup>, GroupingStats) {
    let mut stats = GroupingStats {
        total_files: files.len(),
        total_size: files.iter().map(|f| f.size).sum(),
        ..Default::default()
    };

    let mut hashes: std::collections::HashSet<&str> = std::collections::HashSet::new();
    for file in files {
        if file.has_content_hash() {
            hashes.insert(file.content_hash.as_str());
        } else {
            stats.hashless_files += 1;
        }
    }
    stats.unique_hashes = hashes.len();

    if stats.hashless_files > 0 {
        log::debug!(
            "Skipped {} record(s) without a content hash",
            stats.hashless_files
        );
    }

    let mut groups: Vec<DuplicateGroup> = group_duplicates(files)
        .into_iter()
        .map(|(hash, files)| DuplicateGroup::new(hash, files))
        .collect();

    groups.sort_by(|a, b| {
        b.wasted_space()
            .cmp(&a.wasted_space())
            .then_with(|| a.hash.cmp(&b.hash))
    });

    stats.duplicate_groups = groups.len();
    stats.grouped_files = groups.iter().map(DuplicateGroup::len).sum();

    log::info!(
        "Grouping complete: {} files → {} duplicate groups ({} files)",
        stats.total_files,
        stats.duplicate_groups,
        stats.grouped_files
    );

    (groups, stats)
}
