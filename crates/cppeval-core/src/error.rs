//! Error types for cppeval core
//!
//! Each stage of a batch run has its own error enum:
//! - Table parsing (schema problems are fatal, row problems are skipped)
//! - Workflow dispatch (recorded as an error result, never fatal)
//! - JSON extraction (recorded as a missing summary, never fatal)
//! - Checkpoint writes (logged, the run continues)
//! - Run control (bad ranges, empty input) is fatal before any dispatch

use std::path::PathBuf;

/// Classification of every failure the harness can observe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input table is unreadable or lacks required columns
    Schema,
    /// A single row is invalid and was skipped
    Row,
    /// The external workflow raised or timed out
    Dispatch,
    /// Workflow output carried no usable JSON block
    Extraction,
    /// A checkpoint could not be written
    Checkpoint,
    /// Bad run parameters (range, empty defect set, config)
    Control,
}

impl ErrorKind {
    /// Whether this kind terminates the process
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Schema | Self::Control)
    }
}

/// Errors while reading a defect table
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Input file does not exist
    #[error("CSV file not found: {0}")]
    NotFound(PathBuf),

    /// Required header columns are missing
    #[error("CSV must contain columns {required:?}, missing {missing:?}")]
    Schema {
        required: Vec<String>,
        missing: Vec<String>,
    },

    /// IO error while opening the table
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Header row could not be decoded
    #[error("error reading CSV header: {0}")]
    Csv(#[from] csv::Error),
}

impl ParseError {
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Schema
    }
}

/// Why a single row was skipped
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    /// One of the required values is blank
    #[error("row {row}: missing required fields {fields:?}")]
    MissingFields { row: usize, fields: Vec<String> },

    /// Line is not a positive integer
    #[error("row {row}: invalid line number '{value}'")]
    InvalidLine { row: usize, value: String },

    /// Row could not be decoded
    #[error("row {row}: {message}")]
    Malformed { row: usize, message: String },
}

/// Errors raised by an analysis workflow
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    /// The call did not finish in time
    #[error("analysis timeout after {duration_secs}s")]
    Timeout { duration_secs: u64 },

    /// Network-level failure reaching the agent service
    #[error("network error: {0}")]
    Transport(String),

    /// Agent service answered with a failure status
    #[error("agent service returned {status}: {body}")]
    Service { status: u16, body: String },

    /// Response could not be understood
    #[error("malformed workflow response: {0}")]
    Protocol(String),

    /// Input rejected by the workflow
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Anything else the backend reports
    #[error("{0}")]
    Other(String),
}

impl WorkflowError {
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Dispatch
    }
}

/// Errors locating the JSON summary in workflow output
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// No fenced JSON block in the text
    #[error("no ```json block found")]
    NotFound,

    /// Block found but does not parse
    #[error("invalid JSON in summary block: {0}")]
    Invalid(#[from] serde_json::Error),
}

impl ExtractionError {
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Extraction
    }
}

/// Errors while writing or reading a results document
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO failure on the results path
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document could not be encoded or decoded
    #[error("invalid results document {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Results file does not exist
    #[error("results file not found: {0}")]
    NotFound(PathBuf),
}

impl StoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Checkpoint
    }
}

/// Invalid `[start, end)` selection over the parsed defects
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// Nothing to select from
    #[error("no valid defects found")]
    Empty,

    /// Start index outside `[0, len)`
    #[error("invalid start index: {start} (must be 0-{max})")]
    InvalidStart { start: usize, max: usize },

    /// End index not in `(start, len]`
    #[error("invalid end index: {end} (must be {min}-{max})")]
    InvalidEnd { end: usize, min: usize, max: usize },
}

/// Errors that stop a batch run before it starts
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Bad defect selection
    #[error("range error: {0}")]
    Range(#[from] RangeError),

    /// Bad runner configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl RunError {
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Control
    }
}

/// Errors loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

impl ConfigError {
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Control
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_schema_and_control_are_fatal() {
        assert!(ErrorKind::Schema.is_fatal());
        assert!(ErrorKind::Control.is_fatal());
        assert!(!ErrorKind::Row.is_fatal());
        assert!(!ErrorKind::Dispatch.is_fatal());
        assert!(!ErrorKind::Extraction.is_fatal());
        assert!(!ErrorKind::Checkpoint.is_fatal());
    }

    #[test]
    fn workflow_error_display() {
        let err = WorkflowError::Timeout { duration_secs: 30 };
        assert_eq!(err.to_string(), "analysis timeout after 30s");

        let err = WorkflowError::Other("Analysis failed".to_string());
        assert_eq!(err.to_string(), "Analysis failed");
    }

    #[test]
    fn range_error_display() {
        let err = RangeError::InvalidEnd { end: 9, min: 1, max: 5 };
        assert_eq!(err.to_string(), "invalid end index: 9 (must be 1-5)");
        assert_eq!(RunError::from(err).kind(), ErrorKind::Control);
    }
}
