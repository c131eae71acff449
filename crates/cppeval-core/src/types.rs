//! Core types for cppeval
//!
//! Defines the data that flows through a batch run:
//! - Defect records parsed from the input table
//! - Analysis results (success or error) produced per defect
//! - Run metadata and the persisted results document

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One parsed row of a CppCheck defect table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectRecord {
    /// Path of the file the defect was reported in
    pub file: String,
    /// Reported line (always > 0)
    pub line: u32,
    /// CppCheck severity (error, warning, style, ...)
    pub severity: String,
    /// CppCheck check identifier (nullPointer, memleak, ...)
    pub id: String,
    /// CppCheck message text
    pub summary: String,
    /// 1-based physical row in the source table (header is row 1)
    pub row_number: usize,
    /// Human-assigned category, when the table carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Label produced by our pipeline, when annotated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ours: Option<String>,
    /// Label produced by the baseline, when annotated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<String>,
}

impl DefectRecord {
    /// Create a record with the five required fields
    #[inline]
    #[must_use]
    pub fn new(
        row_number: usize,
        file: impl Into<String>,
        line: u32,
        severity: impl Into<String>,
        id: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            severity: severity.into(),
            id: id.into(),
            summary: summary.into(),
            row_number,
            category: None,
            ours: None,
            baseline: None,
        }
    }

    /// With category column
    #[inline]
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// With our pipeline's label
    #[inline]
    #[must_use]
    pub fn with_ours(mut self, ours: impl Into<String>) -> Self {
        self.ours = Some(ours.into());
        self
    }

    /// With baseline label
    #[inline]
    #[must_use]
    pub fn with_baseline(mut self, baseline: impl Into<String>) -> Self {
        self.baseline = Some(baseline.into());
        self
    }

    /// The payload handed to the external workflow
    #[must_use]
    pub fn cppcheck_data(&self) -> CppcheckData {
        CppcheckData {
            file: self.file.clone(),
            line: self.line,
            severity: self.severity.clone(),
            id: self.id.clone(),
            summary: self.summary.clone(),
        }
    }
}

impl std::fmt::Display for DefectRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} - {}", self.file, self.line, self.id)
    }
}

/// Defect description as understood by the analysis workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CppcheckData {
    pub file: String,
    pub line: u32,
    pub severity: String,
    pub id: String,
    pub summary: String,
}

/// Outcome of dispatching one defect
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// The workflow returned a final state
    Success {
        /// Text of the final message (may be empty)
        analysis_content: String,
        /// JSON block extracted from the text, if one was found
        json_summary: Option<Value>,
    },
    /// The workflow call failed
    Error {
        /// Rendered error message
        message: String,
    },
}

/// Status tag used in the persisted results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Success,
    Error,
}

impl ResultStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultStatus::Success => "success",
            ResultStatus::Error => "error",
        }
    }
}

/// Result of analysing one defect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ResultRecord", from = "ResultRecord")]
pub struct AnalysisResult {
    /// The defect that was analysed
    pub defect: DefectRecord,
    /// What happened
    pub outcome: AnalysisOutcome,
}

impl AnalysisResult {
    /// Successful analysis
    #[inline]
    #[must_use]
    pub fn success(
        defect: DefectRecord,
        analysis_content: impl Into<String>,
        json_summary: Option<Value>,
    ) -> Self {
        Self {
            defect,
            outcome: AnalysisOutcome::Success {
                analysis_content: analysis_content.into(),
                json_summary,
            },
        }
    }

    /// Failed analysis
    #[inline]
    #[must_use]
    pub fn error(defect: DefectRecord, message: impl Into<String>) -> Self {
        Self {
            defect,
            outcome: AnalysisOutcome::Error {
                message: message.into(),
            },
        }
    }

    #[inline]
    #[must_use]
    pub fn status(&self) -> ResultStatus {
        match self.outcome {
            AnalysisOutcome::Success { .. } => ResultStatus::Success,
            AnalysisOutcome::Error { .. } => ResultStatus::Error,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status() == ResultStatus::Success
    }

    /// Extracted JSON summary, for successful results that have one
    #[must_use]
    pub fn json_summary(&self) -> Option<&Value> {
        match &self.outcome {
            AnalysisOutcome::Success { json_summary, .. } => json_summary.as_ref(),
            AnalysisOutcome::Error { .. } => None,
        }
    }

    /// Error message, for failed results
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            AnalysisOutcome::Success { .. } => None,
            AnalysisOutcome::Error { message } => Some(message),
        }
    }
}

/// Flat on-disk shape of an [`AnalysisResult`]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResultRecord {
    defect: DefectRecord,
    status: ResultStatus,
    #[serde(default)]
    analysis_content: Option<String>,
    #[serde(default)]
    json_summary: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<AnalysisResult> for ResultRecord {
    fn from(result: AnalysisResult) -> Self {
        match result.outcome {
            AnalysisOutcome::Success {
                analysis_content,
                json_summary,
            } => Self {
                defect: result.defect,
                status: ResultStatus::Success,
                analysis_content: Some(analysis_content),
                json_summary,
                error: None,
            },
            AnalysisOutcome::Error { message } => Self {
                defect: result.defect,
                status: ResultStatus::Error,
                analysis_content: None,
                json_summary: None,
                error: Some(message),
            },
        }
    }
}

impl From<ResultRecord> for AnalysisResult {
    fn from(record: ResultRecord) -> Self {
        let outcome = match record.status {
            ResultStatus::Success => AnalysisOutcome::Success {
                analysis_content: record.analysis_content.unwrap_or_default(),
                json_summary: record.json_summary.filter(|v| !v.is_null()),
            },
            ResultStatus::Error => AnalysisOutcome::Error {
                message: record.error.unwrap_or_else(|| "Unknown error".to_string()),
            },
        };
        Self {
            defect: record.defect,
            outcome,
        }
    }
}

/// Summary of a batch run, recomputed on every checkpoint
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunMetadata {
    /// Local time of the write
    pub timestamp: Option<NaiveDateTime>,
    /// Size of the requested slice
    pub total_defects: usize,
    /// Tasks finished so far, including failures
    pub completed_defects: usize,
    pub success_count: usize,
    pub error_count: usize,
}

impl RunMetadata {
    /// Derive metadata from the current result collection
    #[must_use]
    pub fn from_results(results: &[AnalysisResult], completed: usize, total: usize) -> Self {
        let success_count = results.iter().filter(|r| r.is_success()).count();
        Self {
            timestamp: Some(chrono::Local::now().naive_local()),
            total_defects: total,
            completed_defects: completed,
            success_count,
            error_count: results.len() - success_count,
        }
    }
}

/// The persisted `{metadata, results}` document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultsDocument {
    #[serde(default)]
    pub metadata: RunMetadata,
    #[serde(default)]
    pub results: Vec<AnalysisResult>,
}
