//! CSV Data Loader Module
//! Handles CSV file loading using Polars.

use log::{debug, info};
use polars::prelude::*;
use std::path::Path;
use thiserror::Error;

/// Cell texts read as missing values, in addition to empty fields.
/// Same set pandas treats as missing by default.
pub const MISSING_MARKERS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
}

/// Handles CSV file loading with Polars schema inference.
pub struct DataLoader {
    infer_schema_length: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            infer_schema_length: 10000,
        }
    }

    /// Number of rows scanned to infer each column's dtype.
    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = rows.max(1);
        self
    }

    /// Load a CSV file with a header row.
    ///
    /// Malformed rows are not skipped: any parse failure is returned as is.
    pub fn load_csv(&self, file_path: &Path) -> Result<DataFrame, LoaderError> {
        debug!("reading {}", file_path.display());

        let null_values = NullValues::AllColumns(
            MISSING_MARKERS.iter().map(|marker| (*marker).into()).collect(),
        );

        let df = LazyCsvReader::new(file_path)
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .with_null_values(Some(null_values))
            .with_ignore_errors(false)
            .finish()?
            .collect()?;

        info!(
            "loaded {} rows x {} columns from {}",
            df.height(),
            df.width(),
            file_path.display()
        );
        Ok(df)
    }
}
