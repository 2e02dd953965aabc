//! Per-file path resolution results.

use std::collections::HashMap;

use super::{ResolveError, UNRESOLVED_MARKER};

/// Mapping from file id to its resolved folder path, or the reason it
/// could not be resolved.
///
/// Entries are write-once: inserting an id that is already present keeps
/// the first result.
#[derive(Debug, Clone, Default)]
pub struct PathIndex {
    entries: HashMap<String, Result<String, ResolveError>>,
    interrupted: bool,
}

impl PathIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result for `file_id`.
    ///
    /// Returns `false` (and leaves the index untouched) if the id already
    /// has an entry.
    pub fn insert(&mut self, file_id: impl Into<String>, result: Result<String, ResolveError>) -> bool {
        let file_id = file_id.into();
        if self.entries.contains_key(&file_id) {
            log::trace!("Path for {} already recorded, keeping first result", file_id);
            return false;
        }
        self.entries.insert(file_id, result);
        true
    }

    /// Result for `file_id`, if it was resolved in this run.
    #[must_use]
    pub fn get(&self, file_id: &str) -> Option<&Result<String, ResolveError>> {
        self.entries.get(file_id)
    }

    /// Resolved path for `file_id`, or `None` if it failed or was never resolved.
    #[must_use]
    pub fn path(&self, file_id: &str) -> Option<&str> {
        match self.entries.get(file_id) {
            Some(Ok(path)) => Some(path.as_str()),
            _ => None,
        }
    }

    /// Resolution error for `file_id`, if any.
    #[must_use]
    pub fn error(&self, file_id: &str) -> Option<&ResolveError> {
        match self.entries.get(file_id) {
            Some(Err(e)) => Some(e),
            _ => None,
        }
    }

    /// Path to show in a report: the resolved path or [`UNRESOLVED_MARKER`].
    #[must_use]
    pub fn display(&self, file_id: &str) -> &str {
        self.path(file_id).unwrap_or(UNRESOLVED_MARKER)
    }

    /// Failed entries, sorted by file id.
    #[must_use]
    pub fn failures(&self) -> Vec<(&str, &ResolveError)> {
        let mut failures: Vec<_> = self
            .entries
            .iter()
            .filter_map(|(id, result)| result.as_ref().err().map(|e| (id.as_str(), e)))
            .collect();
        failures.sort_by(|a, b| a.0.cmp(b.0));
        failures
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn resolved_count(&self) -> usize {
        self.entries.values().filter(|r| r.is_ok()).count()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.entries.values().filter(|r| r.is_err()).count()
    }

    /// Whether resolution stopped early on a shutdown request.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    pub(crate) fn mark_interrupted(&mut self) {
        self.interrupted = true;
    }
}

impl FromIterator<(String, Result<String, ResolveError>)> for PathIndex {
    fn from_iter<I: IntoIterator<Item = (String, Result<String, ResolveError>)>>(iter: I) -> Self {
        let mut index = PathIndex::new();
        for (id, result) in iter {
            index.insert(id, result);
        }
        index
    }
}
