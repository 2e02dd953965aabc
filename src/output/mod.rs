//! Output formatters for duplicate scan results.
//!
//! - text for people ([`TextOutput`])
//! - JSON for automation and scripting ([`JsonOutput`])
//! - CSV for spreadsheet import ([`CsvOutput`])
//!
//! Every formatter annotates each file with its resolved folder path, or
//! [`crate::resolver::UNRESOLVED_MARKER`] when the path is unknown. Files are
//! never dropped from a report because their path failed.

pub mod csv;
pub mod json;
pub mod text;

pub use csv::CsvOutput;
pub use json::JsonOutput;
pub use text::TextOutput;

use std::io::Write;

use anyhow::{Context, Result};

use crate::cli::OutputFormat;
use crate::duplicates::{DuplicateGroup, ScanSummary};
use crate::error::ExitCode;
use crate::resolver::PathIndex;

/// Everything a formatter needs.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    pub groups: &'a [DuplicateGroup],
    pub paths: &'a PathIndex,
    pub summary: &'a ScanSummary,
    pub exit_code: ExitCode,
}

impl Report<'_> {
    /// Write the report in `format`.
    ///
    /// `color` only affects the text format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write<W: Write>(&self, format: OutputFormat, color: bool, writer: &mut W) -> Result<()> {
        match format {
            OutputFormat::Text => TextOutput::new(self.groups, self.paths, self.summary)
                .with_color(color)
                .write_to(writer)
                .context("Failed to write text report")?,
            OutputFormat::Json => JsonOutput::new(self.groups, self.paths, self.summary, self.exit_code)
                .write_to(writer, true)
                .context("Failed to write JSON report")?,
            OutputFormat::Csv => CsvOutput::new(self.groups, self.paths)
                .write_to(&mut *writer)
                .context("Failed to write CSV report")?,
        }
        writer.flush().context("Failed to flush report")?;
        Ok(())
    }
}
