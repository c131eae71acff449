//! Labeled evaluation tables
//!
//! A CSV with a header, loaded as trimmed strings. Columns are looked up by
//! exact header name.

use crate::error::TableError;
use std::io::Read;
use std::path::Path;

/// In-memory CSV table with trimmed cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabeledTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl LabeledTable {
    /// Load a table from disk
    ///
    /// # Errors
    /// - `TableError::NotFound` if the file does not exist
    /// - `TableError::Io` / `TableError::Csv` on read failure
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TableError::NotFound(path.to_path_buf()));
        }
        let file = std::fs::File::open(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_reader(file)?;
        tracing::info!("Successfully loaded {} records from {}", table.len(), path.display());
        Ok(table)
    }

    /// Read a table from any reader
    ///
    /// Short rows are padded with empty cells.
    ///
    /// # Errors
    /// Returns `TableError::Csv` if the input is not valid CSV
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(|v| v.trim().to_string()).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }
        Ok(Self { headers, rows })
    }

    /// Fail unless every column in `required` is present
    ///
    /// # Errors
    /// Returns `TableError::MissingColumns` listing the absent names
    pub fn require(&self, required: &[&str]) -> Result<(), TableError> {
        let missing: Vec<String> = required
            .iter()
            .filter(|name| self.column(name).is_none())
            .map(|name| (*name).to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(TableError::MissingColumns {
                required: required.iter().map(|s| (*s).to_string()).collect(),
                missing,
            })
        }
    }

    /// Index of a column by header name
    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Cell value, empty when out of range
    #[must_use]
    pub fn value(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map_or("", String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
