//! CSV output formatter for duplicate scan results.
//!
//! One row per duplicate file.
//!
//! # Columns
//!
//! - `group_id`: 1-based group number, in report order
//! - `hash`: shared content hash
//! - `id`: file id in the drive
//! - `name`: file name
//! - `size`: file size in bytes
//! - `path`: resolved folder path, or `<unresolved>`

use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::duplicates::DuplicateGroup;
use crate::resolver::PathIndex;

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    group_id: usize,
    hash: &'a str,
    id: &'a str,
    name: &'a str,
    size: u64,
    path: &'a str,
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    groups: &'a [DuplicateGroup],
    paths: &'a PathIndex,
}

impl<'a> CsvOutput<'a> {
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup], paths: &'a PathIndex) -> Self {
        Self { groups, paths }
    }

    /// Write the header and one row per file.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        if self.groups.is_empty() {
            csv_writer.write_record(["group_id", "hash", "id", "name", "size", "path"])?;
        }

        for (idx, group) in self.groups.iter().enumerate() {
            for file in &group.files {
                csv_writer.serialize(CsvRow {
                    group_id: idx + 1,
                    hash: &group.hash,
                    id: &file.id,
                    name: &file.name,
                    size: file.size,
                    path: self.paths.display(&file.id),
                })?;
            }
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if serialization fails.
    pub fn to_string(&self) -> Result<String, CsvOutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| CsvOutputError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }
}
