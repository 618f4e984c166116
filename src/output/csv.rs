//! CSV output formatter for query results.
//!
//! The header is the selected column list; each result row contributes
//! one record. Missing properties are written as empty fields.

use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::output::ResultRow;

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    columns: &'a [String],
    rows: &'a [ResultRow],
}

impl<'a> CsvOutput<'a> {
    /// Create a formatter writing `columns` of `rows`.
    #[must_use]
    pub fn new(columns: &'a [String], rows: &'a [ResultRow]) -> Self {
        Self { columns, rows }
    }

    /// Write the CSV output to the given writer.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(self.columns)?;
        for row in self.rows {
            csv_writer.write_record(
                self.columns
                    .iter()
                    .map(|col| row.value(col).unwrap_or_default()),
            )?;
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
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Write serializable records, with a header taken from the field names.
///
/// # Errors
///
/// Returns `CsvOutputError` if serialization or writing fails.
pub fn write_csv_records<W: io::Write, T: Serialize>(
    writer: W,
    records: &[T],
) -> Result<(), CsvOutputError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}
