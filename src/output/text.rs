//! Human-readable report.
//!
//! ```text
//! Duplicate files:
//! Hash: 5d41402abc4b2a76b9719d911017c592
//!   ID: 1a2b, Name: report.pdf, Size: 1024, Path: Work/2023
//!   ID: 3c4d, Name: report (1).pdf, Size: 1024, Path: <unresolved>
//!
//! 1 duplicate groups, 1 duplicate files, 1.0 KiB reclaimable (25.0% of 4.0 KiB) (1 paths unresolved)
//! ```

use std::io::{self, Write};

use yansi::Paint;

use crate::duplicates::{DuplicateGroup, ScanSummary};
use crate::resolver::PathIndex;

/// Plain-text formatter.
pub struct TextOutput<'a> {
    groups: &'a [DuplicateGroup],
    paths: &'a PathIndex,
    summary: &'a ScanSummary,
    color: bool,
}

impl<'a> TextOutput<'a> {
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup], paths: &'a PathIndex, summary: &'a ScanSummary) -> Self {
        Self {
            groups,
            paths,
            summary,
            color: false,
        }
    }

    /// Color the hash headings.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Write the report.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "Duplicate files:")?;
        if self.groups.is_empty() {
            writeln!(writer, "No duplicate files found.")?;
        }

        for group in self.groups {
            if self.color {
                writeln!(writer, "Hash: {}", group.hash.as_str().cyan().bold())?;
            } else {
                writeln!(writer, "Hash: {}", group.hash)?;
            }
            for file in &group.files {
                writeln!(
                    writer,
                    "  ID: {}, Name: {}, Size: {}, Path: {}",
                    file.id,
                    file.name,
                    file.size,
                    self.paths.display(&file.id)
                )?;
            }
        }

        writeln!(writer)?;
        write!(
            writer,
            "{} duplicate groups, {} duplicate files, {} reclaimable ({:.1}% of {})",
            self.summary.duplicate_groups,
            self.summary.duplicate_files,
            self.summary.reclaimable_display(),
            self.summary.wasted_percentage(),
            self.summary.total_size_display()
        )?;
        // Only files printed above; other failures are in the JSON report.
        if self.summary.unresolved_duplicates > 0 {
            write!(writer, " ({} paths unresolved)", self.summary.unresolved_duplicates)?;
        }
        writeln!(writer)?;
        Ok(())
    }

    /// Render the report into a string.
    ///
    /// # Errors
    ///
    /// Only fails if the formatter itself does.
    pub fn to_string(&self) -> io::Result<String> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}
