//! Error types for cppeval metrics

use std::path::PathBuf;

/// Errors computing metrics over label sequences
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetricsError {
    /// Truth and prediction sequences differ in length
    #[error("y_true and y_pred must have the same length ({truth} vs {predicted})")]
    LengthMismatch { truth: usize, predicted: usize },
}

/// Errors loading or evaluating a labeled table
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// Input file does not exist
    #[error("CSV file not found: {0}")]
    NotFound(PathBuf),

    /// IO error while opening the table
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Table could not be decoded
    #[error("error reading CSV file: {0}")]
    Csv(#[from] csv::Error),

    /// Columns needed for the comparison are absent
    #[error("CSV must contain columns {required:?}, missing {missing:?}")]
    MissingColumns {
        required: Vec<String>,
        missing: Vec<String>,
    },

    /// Nothing left to score
    #[error("no valid records found after filtering ({filtered} removed)")]
    NoRows { filtered: usize },

    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

/// Errors writing a report or export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("io error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error writing CSV: {0}")]
    Csv(#[from] csv::Error),
}

impl ExportError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
