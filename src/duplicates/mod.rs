//! Duplicate detection module.
//!
//! This module provides:
//! - Hash-based grouping of file records
//! - Duplicate group types and grouping statistics
//! - The list → group → resolve pipeline ([`DuplicateFinder`])

pub mod finder;
pub mod groups;

pub use finder::{
    unresolved_members, DuplicateFinder, FinderConfig, FinderError, ResolveScope, ScanReport,
    ScanSummary,
};
pub use groups::{group_duplicates, group_duplicates_structured, DuplicateGroup, GroupingStats};
