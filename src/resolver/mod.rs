//! Folder path resolution from parent references.
//!
//! # Overview
//!
//! A remote listing only tells us each file's parent folder id. To show
//! where a duplicate lives, the parent chain is walked up to the top of the
//! tree and the folder names are joined root-most first:
//!
//! ```text
//! file --parent--> Leaf --parent--> Sub --parent--> TopFolder (no parent)
//!                                         => "TopFolder/Sub/Leaf"
//! ```
//!
//! Files without a parent resolve to [`ROOT_PATH`].
//!
//! Every folder lookup is a network round-trip, so the resolver caches
//! folder nodes, fully resolved folder paths and failures per folder id.
//! A folder shared by any number of files is fetched at most once.
//!
//! The walk is iterative with a visited set, so a malformed parent graph
//! (a folder that is its own ancestor) ends in
//! [`ResolveError::CycleDetected`] instead of unbounded recursion.
//!
//! # Example
//!
//! ```
//! use drivedupe::resolver::PathResolver;
//! use drivedupe::source::{FileRecord, FolderNode, MemorySource};
//!
//! let source = MemorySource::new()
//!     .with_folder(FolderNode::new("top", "TopFolder", None))
//!     .with_folder(FolderNode::new("sub", "Sub", Some("top")));
//!
//! let mut resolver = PathResolver::new(&source);
//! let file = FileRecord::new("1", "a.txt", "h1", 10, vec!["sub".to_string()]);
//! assert_eq!(resolver.resolve_path(&file).unwrap(), "TopFolder/Sub");
//! ```

mod index;

pub use index::PathIndex;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::progress::ProgressCallback;
use crate::source::{FileRecord, FileSource, FolderNode};

/// Path reported for files that have no parent reference.
pub const ROOT_PATH: &str = "root";

/// Placeholder shown in reports for files whose path could not be resolved.
pub const UNRESOLVED_MARKER: &str = "<unresolved>";

/// Why a file's folder path could not be resolved.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolveError {
    /// A folder in the parent chain could not be fetched from the source.
    ///
    /// Every failed lookup lands here, whether the folder is gone or the
    /// request itself failed (timeout, 5xx, 401). `reason` keeps the source
    /// error text, which names its class. The failure is cached for the
    /// rest of the run like any other.
    #[error("Folder {folder_id} could not be fetched: {reason}")]
    FolderNotFound {
        /// The folder whose lookup failed
        folder_id: String,
        /// Upstream error, e.g. `Folder not found: X` or `HTTP error: ...`
        reason: String,
    },

    /// The parent chain loops back on itself.
    #[error("Cycle detected in parent chain at folder {folder_id}")]
    CycleDetected {
        /// The first folder seen twice during the walk
        folder_id: String,
    },
}

impl ResolveError {
    /// Shorthand for [`ResolveError::FolderNotFound`].
    #[must_use]
    pub fn folder_not_found(folder_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FolderNotFound {
            folder_id: folder_id.into(),
            reason: reason.into(),
        }
    }
}

/// Configuration for batch path resolution.
#[derive(Clone, Default)]
pub struct ResolverConfig {
    /// Optional shutdown flag checked between files.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for ResolverConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverConfig")
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl ResolverConfig {
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
}

/// Resolves folder paths for file records, memoizing folder lookups.
///
/// One resolver lives for one run. Its caches are keyed by folder id and
/// written at most once per key.
pub struct PathResolver<'a> {
    source: &'a dyn FileSource,
    config: ResolverConfig,
    /// Folder nodes fetched so far
    folders: HashMap<String, FolderNode>,
    /// Fully resolved path of each folder
    folder_paths: HashMap<String, String>,
    /// Folders whose path is known to be unresolvable
    failed: HashMap<String, ResolveError>,
    lookups: usize,
}

impl<'a> PathResolver<'a> {
    /// Create a resolver with default configuration.
    #[must_use]
    pub fn new(source: &'a dyn FileSource) -> Self {
        Self::with_config(source, ResolverConfig::default())
    }

    /// Create a resolver with the given configuration.
    #[must_use]
    pub fn with_config(source: &'a dyn FileSource, config: ResolverConfig) -> Self {
        Self {
            source,
            config,
            folders: HashMap::new(),
            folder_paths: HashMap::new(),
            failed: HashMap::new(),
            lookups: 0,
        }
    }

    /// Resolve the folder path containing `file`.
    ///
    /// Returns [`ROOT_PATH`] for files without a parent. The file's own name
    /// is not part of the result.
    ///
    /// # Errors
    ///
    /// [`ResolveError::FolderNotFound`] if a folder in the chain cannot be
    /// fetched, [`ResolveError::CycleDetected`] if the chain loops.
    pub fn resolve_path(&mut self, file: &FileRecord) -> Result<String, ResolveError> {
        match file.first_parent() {
            None => Ok(ROOT_PATH.to_string()),
            Some(parent) => self.resolve_folder(parent),
        }
    }

    /// Resolve the full path of a folder, including its own name.
    ///
    /// # Errors
    ///
    /// See [`PathResolver::resolve_path`].
    pub fn resolve_folder(&mut self, folder_id: &str) -> Result<String, ResolveError> {
        if let Some(path) = self.folder_paths.get(folder_id) {
            log::trace!("Path cache hit for folder {}", folder_id);
            return Ok(path.clone());
        }
        if let Some(err) = self.failed.get(folder_id) {
            return Err(err.clone());
        }

        // Walk upward until a cached path, a failure, or the top of the tree.
        // `chain` holds the folders still missing a path, leaf-most first.
        let mut chain: Vec<String> = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut current = folder_id.to_string();

        let walk: Result<Option<String>, ResolveError> = loop {
            if let Some(path) = self.folder_paths.get(&current) {
                break Ok(Some(path.clone()));
            }
            if let Some(err) = self.failed.get(&current) {
                break Err(err.clone());
            }
            if !visited.insert(current.clone()) {
                break Err(ResolveError::CycleDetected {
                    folder_id: current,
                });
            }

            let parent = match self.fetch_parent(&current) {
                Ok(parent) => parent,
                Err(err) => break Err(err),
            };
            chain.push(current);
            match parent {
                Some(parent) => current = parent,
                None => break Ok(None),
            }
        };

        let mut path = match walk {
            Ok(base) => base,
            Err(err) => {
                log::warn!("Cannot resolve folder {}: {}", folder_id, err);
                self.failed
                    .entry(folder_id.to_string())
                    .or_insert_with(|| err.clone());
                for id in chain {
                    self.failed.entry(id).or_insert_with(|| err.clone());
                }
                return Err(err);
            }
        };

        for id in chain.iter().rev() {
            let name = self.folders.get(id).map_or("", |f| f.name.as_str());
            let full = match path {
                Some(prefix) => format!("{prefix}/{name}"),
                None => name.to_string(),
            };
            self.folder_paths.insert(id.clone(), full.clone());
            path = Some(full);
        }

        // `chain` always starts with `folder_id`, so `path` is set here.
        Ok(path.unwrap_or_default())
    }

    /// Resolve every file in `files`, collecting per-file results.
    ///
    /// A failure only affects the file it belongs to. If the shutdown flag
    /// is raised the batch stops early and the returned index is marked
    /// interrupted.
    pub fn resolve_paths<'f>(&mut self, files: impl IntoIterator<Item = &'f FileRecord>) -> PathIndex {
        let files: Vec<&FileRecord> = files.into_iter().collect();
        let mut index = PathIndex::new();

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("resolving", files.len());
        }

        for (i, file) in files.iter().enumerate() {
            if self.config.is_shutdown_requested() {
                log::warn!("Path resolution interrupted after {} of {} files", i, files.len());
                index.mark_interrupted();
                break;
            }

            let result = self.resolve_path(file);
            if let Err(ref e) = result {
                log::debug!("Unresolved path for {} ({}): {}", file.name, file.id, e);
            }
            index.insert(file.id.clone(), result);

            if let Some(ref callback) = self.config.progress_callback {
                callback.on_progress(i + 1, &file.name);
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("resolving");
        }

        log::info!(
            "Resolved {} of {} paths ({} unresolved, {} folder lookups)",
            index.resolved_count(),
            files.len(),
            index.failed_count(),
            self.lookups
        );

        index
    }

    /// Number of `get_folder` calls made on the source so far.
    #[must_use]
    pub fn folder_lookups(&self) -> usize {
        self.lookups
    }

    /// Folder nodes fetched so far, sorted by id.
    #[must_use]
    pub fn cached_folders(&self) -> Vec<FolderNode> {
        let mut folders: Vec<FolderNode> = self.folders.values().cloned().collect();
        folders.sort_by(|a, b| a.id.cmp(&b.id));
        folders
    }

    /// Parent of `folder_id`, fetching the folder on a cache miss.
    fn fetch_parent(&mut self, folder_id: &str) -> Result<Option<String>, ResolveError> {
        if let Some(folder) = self.folders.get(folder_id) {
            log::trace!("Folder cache hit for {}", folder_id);
            return Ok(folder.parent.clone());
        }

        self.lookups += 1;
        log::trace!("Folder cache miss for {}, querying source", folder_id);
        match self.source.get_folder(folder_id) {
            Ok(folder) => {
                let parent = folder.parent.clone();
                self.folders.insert(folder_id.to_string(), folder);
                Ok(parent)
            }
            Err(e) => {
                let err = ResolveError::folder_not_found(folder_id, e.to_string());
                self.failed.insert(folder_id.to_string(), err.clone());
                Err(err)
            }
        }
    }
}
