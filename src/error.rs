//! Structured error handling and exit codes.

use serde::Serialize;

use crate::duplicates::FinderError;
use crate::signal::EXIT_CODE_INTERRUPTED;

/// Exit codes for the drivedupe application.
///
/// - 0: Success (duplicates found, every path resolved)
/// - 1: General error (config, I/O, token)
/// - 2: No duplicates found
/// - 3: Partial success (duplicates reported, some paths unresolved)
/// - 4: File source unavailable (listing failed)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(i32)]
pub enum ExitCode {
    /// Success: duplicates were found and every path resolved.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// No duplicates: Scan completed but no duplicates were found.
    NoDuplicates = 2,
    /// Partial success: duplicates were reported but some paths are unresolved.
    PartialSuccess = 3,
    /// Source unavailable: the listing call failed.
    SourceUnavailable = 4,
    /// Interrupted: Scan was interrupted by user (Ctrl+C).
    Interrupted = EXIT_CODE_INTERRUPTED,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DD000",
            Self::GeneralError => "DD001",
            Self::NoDuplicates => "DD002",
            Self::PartialSuccess => "DD003",
            Self::SourceUnavailable => "DD004",
            Self::Interrupted => "DD130",
        }
    }

    /// Pick the exit code for an error that ended the run.
    #[must_use]
    pub fn from_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<FinderError>() {
            Some(FinderError::Interrupted) => Self::Interrupted,
            Some(FinderError::SourceUnavailable(_)) => Self::SourceUnavailable,
            None => Self::GeneralError,
        }
    }

    /// Pick the exit code for a completed report.
    ///
    /// `unresolved_duplicates` counts only group members, the files a
    /// report actually prints with `<unresolved>`.
    #[must_use]
    pub fn from_outcome(duplicate_groups: usize, unresolved_duplicates: usize) -> Self {
        if duplicate_groups == 0 {
            Self::NoDuplicates
        } else if unresolved_duplicates > 0 {
            Self::PartialSuccess
        } else {
            Self::Success
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DD004")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
