//! Batch results analysis
//!
//! Statistics over a persisted [`ResultsDocument`]:
//! - completion and success rates from the run metadata
//! - defect id / severity / category counts over successful results
//! - field-by-field breakdown of the extracted JSON summaries
//! - error buckets with a handful of sample failures

use crate::distribution::Distribution;
use crate::error::ExportError;
use crate::report::ensure_parent;
use cppeval_core::{AnalysisResult, ResultsDocument};
use indexmap::IndexMap;
use serde_json::Value;
use std::path::Path;

const RULE: usize = 60;
const TOP_DEFECT_TYPES: usize = 10;
const REPORTED_FIELDS: usize = 10;
const SAMPLE_ERRORS: usize = 5;
const TRUNCATE_AT: usize = 100;

/// Bucket name for numeric summary values
pub const NUMERIC_VALUES: &str = "numeric_values";

/// Run-level counts and rates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BasicStats {
    pub total_defects: usize,
    pub completed_defects: usize,
    pub success_count: usize,
    pub error_count: usize,
    /// Successes per completed defect, in percent
    pub success_rate: f64,
    /// Completed per requested defect, in percent
    pub completion_rate: f64,
    /// Most common check ids among successes, at most ten
    pub defect_types: Vec<(String, usize)>,
    pub severities: Distribution,
    /// Empty unless the results carry a category column
    pub categories: Distribution,
}

impl BasicStats {
    /// Compute stats for a results document
    #[must_use]
    pub fn from_document(doc: &ResultsDocument) -> Self {
        let meta = &doc.metadata;
        let mut defect_types = Distribution::new();
        let mut severities = Distribution::new();
        let mut categories = Distribution::new();

        for result in doc.results.iter().filter(|r| r.is_success()) {
            let defect = &result.defect;
            defect_types.add(defect.id.as_str());
            severities.add(defect.severity.as_str());
            if let Some(category) = &defect.category {
                categories.add(category.as_str());
            }
        }

        Self {
            total_defects: meta.total_defects,
            completed_defects: meta.completed_defects,
            success_count: meta.success_count,
            error_count: meta.error_count,
            success_rate: percent(meta.success_count, meta.completed_defects),
            completion_rate: percent(meta.completed_defects, meta.total_defects),
            defect_types: defect_types
                .top(TOP_DEFECT_TYPES)
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            severities,
            categories,
        }
    }
}

/// Breakdown of the extracted JSON summaries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryAnalysis {
    /// Successful results with a non-empty summary object
    pub total_summaries: usize,
    /// Value counts per field, fields in first-seen order
    pub fields: IndexMap<String, Distribution>,
}

impl SummaryAnalysis {
    #[must_use]
    pub fn from_results(results: &[AnalysisResult]) -> Self {
        let mut analysis = Self::default();
        for summary in results
            .iter()
            .filter(|r| r.is_success())
            .filter_map(AnalysisResult::json_summary)
            .filter_map(Value::as_object)
            .filter(|obj| !obj.is_empty())
        {
            analysis.total_summaries += 1;
            for (field, value) in summary {
                let bucket = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(_) => NUMERIC_VALUES.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => continue,
                };
                analysis.fields.entry(field.clone()).or_default().add(bucket);
            }
        }
        analysis
    }

    /// Field names in first-seen order
    pub fn common_fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

/// Coarse classification of an error message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Timeout,
    Memory,
    Network,
    FileAccess,
    Other,
}

impl ErrorCategory {
    /// Bucket by the first matching keyword, case-insensitively
    #[must_use]
    pub fn classify(message: &str) -> Self {
        let message = message.to_lowercase();
        if message.contains("timeout") || message.contains("timed out") {
            Self::Timeout
        } else if message.contains("memory") {
            Self::Memory
        } else if message.contains("network") {
            Self::Network
        } else if message.contains("file") || message.contains("path") {
            Self::FileAccess
        } else {
            Self::Other
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Memory => "memory",
            Self::Network => "network",
            Self::FileAccess => "file_access",
            Self::Other => "other",
        }
    }
}

/// A failed result kept as an example
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSample {
    pub file: String,
    pub line: u32,
    pub message: String,
}

/// Error counts and samples
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorAnalysis {
    pub total_errors: usize,
    /// Counts per category, first-seen order
    pub categories: IndexMap<ErrorCategory, usize>,
    /// The first five failures
    pub samples: Vec<ErrorSample>,
}

impl ErrorAnalysis {
    #[must_use]
    pub fn from_results(results: &[AnalysisResult]) -> Self {
        let mut analysis = Self::default();
        for result in results {
            let Some(message) = result.error_message() else {
                continue;
            };
            analysis.total_errors += 1;
            *analysis
                .categories
                .entry(ErrorCategory::classify(message))
                .or_insert(0) += 1;
            if analysis.samples.len() < SAMPLE_ERRORS {
                analysis.samples.push(ErrorSample {
                    file: result.defect.file.clone(),
                    line: result.defect.line,
                    message: message.to_string(),
                });
            }
        }
        analysis
    }
}

/// Full analysis of a results document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunAnalysis {
    pub basic: BasicStats,
    pub summaries: SummaryAnalysis,
    pub errors: ErrorAnalysis,
}

impl RunAnalysis {
    #[must_use]
    pub fn analyze(doc: &ResultsDocument) -> Self {
        Self {
            basic: BasicStats::from_document(doc),
            summaries: SummaryAnalysis::from_results(&doc.results),
            errors: ErrorAnalysis::from_results(&doc.results),
        }
    }

    /// Text report
    #[must_use]
    pub fn render_report(&self) -> String {
        let basic = &self.basic;
        let rule = "=".repeat(RULE);

        let mut report = String::new();
        report.push_str(&format!("{rule}\nBATCH EVALUATION ANALYSIS REPORT\n{rule}\n\n"));

        report.push_str("BASIC STATISTICS:\n");
        report.push_str(&format!("  Total Defects: {}\n", basic.total_defects));
        report.push_str(&format!(
            "  Completed: {} ({:.1}%)\n",
            basic.completed_defects, basic.completion_rate
        ));
        report.push_str(&format!(
            "  Successful: {} ({:.1}%)\n",
            basic.success_count, basic.success_rate
        ));
        report.push_str(&format!("  Failed: {}\n", basic.error_count));

        report.push_str("\nDEFECT SEVERITY DISTRIBUTION:\n");
        for (severity, count) in basic.severities.iter() {
            report.push_str(&format!("  {severity}: {count}\n"));
        }

        report.push_str("\nTOP DEFECT TYPES:\n");
        for (defect_type, count) in &basic.defect_types {
            report.push_str(&format!("  {defect_type}: {count}\n"));
        }

        if !basic.categories.is_empty() {
            report.push_str("\nDEFECT CATEGORIES:\n");
            for (category, count) in basic.categories.iter() {
                report.push_str(&format!("  {category}: {count}\n"));
            }
        }

        let fields: Vec<&str> = self.summaries.common_fields().take(REPORTED_FIELDS).collect();
        report.push_str("\nJSON SUMMARY ANALYSIS:\n");
        report.push_str(&format!(
            "  Total Summaries Generated: {}\n",
            self.summaries.total_summaries
        ));
        report.push_str(&format!("  Common Fields: {}\n", fields.join(", ")));

        report.push_str("\nERROR ANALYSIS:\n");
        report.push_str(&format!("  Total Errors: {}\n", self.errors.total_errors));
        if !self.errors.categories.is_empty() {
            report.push_str("  Error Types:\n");
            for (category, count) in &self.errors.categories {
                report.push_str(&format!("    {}: {count}\n", category.as_str()));
            }
        }

        if !self.errors.samples.is_empty() {
            report.push_str("\nSAMPLE ERRORS:\n");
            for (i, sample) in self.errors.samples.iter().enumerate() {
                report.push_str(&format!(
                    "  {}. {}:{} - {}...\n",
                    i + 1,
                    sample.file,
                    sample.line,
                    prefix(&sample.message, TRUNCATE_AT)
                ));
            }
        }

        report.push_str(&rule);
        report
    }

    /// Per-field value counts, empty when no summaries were found
    #[must_use]
    pub fn render_json_details(&self) -> String {
        let mut report = String::new();
        if self.summaries.fields.is_empty() {
            return report;
        }
        report.push_str("DETAILED JSON FIELD ANALYSIS:\n");
        for (field, values) in &self.summaries.fields {
            report.push_str(&format!("  {field}:\n"));
            for (value, count) in values.iter() {
                report.push_str(&format!("    {value}: {count}\n"));
            }
        }
        report
    }
}

/// Export one row per result
///
/// # Errors
/// Returns `ExportError` if the file cannot be written
pub fn write_csv_summary(doc: &ResultsDocument, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "row_number",
        "file",
        "line",
        "severity",
        "defect_id",
        "summary",
        "status",
        "has_json_summary",
        "error_message",
    ])?;

    for result in &doc.results {
        let defect = &result.defect;
        let has_summary = result.json_summary().is_some_and(|v| match v {
            Value::Object(obj) => !obj.is_empty(),
            Value::Array(items) => !items.is_empty(),
            _ => true,
        });
        writer.write_record([
            defect.row_number.to_string(),
            defect.file.clone(),
            defect.line.to_string(),
            defect.severity.clone(),
            defect.id.clone(),
            truncate(&defect.summary),
            result.status().as_str().to_string(),
            String::from(if has_summary { "Yes" } else { "No" }),
            truncate(result.error_message().unwrap_or("")),
        ])?;
    }
    writer.flush().map_err(|e| ExportError::io_error(path, e))?;
    tracing::info!("CSV summary exported to: {}", path.display());
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// First `n` characters of `s`
fn prefix(s: &str, n: usize) -> &str {
    s.char_indices().nth(n).map_or(s, |(i, _)| &s[..i])
}

fn truncate(s: &str) -> String {
    if s.chars().count() > TRUNCATE_AT {
        format!("{}...", prefix(s, TRUNCATE_AT))
    } else {
        s.to_string()
    }
}
