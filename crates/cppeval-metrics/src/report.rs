//! Evaluation reports
//!
//! Text renderings of an [`Evaluation`] plus the processed-table export.

use crate::error::ExportError;
use crate::evaluation::Evaluation;
use crate::scoring::Metrics;
use crate::table::LabeledTable;
use std::path::Path;

const RULE: usize = 80;
const CELL: usize = 15;

/// Column header of the cleaned prediction in exports
pub const CLEANED_TARGET_COLUMN: &str = "cleaned_target";

/// Per-class table in the layout of scikit-learn's `classification_report`
#[must_use]
pub fn classification_report(metrics: &Metrics, digits: usize) -> String {
    const LAST_HEADING: &str = "weighted avg";
    let width = metrics
        .labels
        .iter()
        .map(String::len)
        .max()
        .unwrap_or(0)
        .max(LAST_HEADING.len())
        .max(digits);

    let mut report = String::new();
    report.push_str(&format!("{:>width$} ", ""));
    for heading in ["precision", "recall", "f1-score", "support"] {
        report.push_str(&format!(" {heading:>9}"));
    }
    report.push_str("\n\n");

    let row = |name: &str, p: f64, r: f64, f: f64, support: usize| {
        format!("{name:>width$}  {p:>9.digits$} {r:>9.digits$} {f:>9.digits$} {support:>9}\n")
    };

    for class in &metrics.per_class {
        report.push_str(&row(&class.label, class.precision, class.recall, class.f1, class.support));
    }
    report.push('\n');

    let support: usize = metrics.per_class.iter().map(|c| c.support).sum();
    report.push_str(&format!(
        "{:>width$}  {:>9} {:>9} {:>9.digits$} {:>9}\n",
        "accuracy", "", "", metrics.accuracy, support
    ));
    let m = metrics.macro_avg;
    report.push_str(&row("macro avg", m.precision, m.recall, m.f1, support));
    let w = metrics.weighted_avg;
    report.push_str(&row("weighted avg", w.precision, w.recall, w.f1, support));

    report
}

/// Console report with distributions, metrics, agreement and confusion matrix
#[must_use]
pub fn detailed_report(eval: &Evaluation) -> String {
    let preset = eval.comparison.preset;
    let target = &eval.comparison.target_column;
    let truth_upper = preset.truth_column().to_uppercase();
    let metrics = &eval.metrics;
    let total = eval.len();

    let mut report = String::new();
    report.push_str(&format!("{}\n", "=".repeat(RULE)));
    report.push_str(&format!("{} EVALUATION ANALYSIS\n", eval.comparison.title()));
    report.push_str(&format!("{}\n", "=".repeat(RULE)));

    report.push_str("\nDATASET OVERVIEW:\n");
    report.push_str(&format!("  Total Records: {total}\n"));
    if eval.comparison.drop_false_positives {
        report.push_str(&format!(
            "  Filtered False Positives: {} (loaded {})\n",
            eval.false_positives, eval.loaded
        ));
    }
    report.push_str(&format!(
        "  Overall Agreement Rate: {:.4} ({}/{})\n",
        eval.agreement.rate, eval.agreement.matches, eval.agreement.total
    ));

    report.push_str(&format!("\n{truth_upper} DISTRIBUTION (Original):\n"));
    for (value, count) in eval.original_truth.most_common() {
        report.push_str(&format!("  {value}: {count} ({:.1}%)\n", eval.original_truth.percent(count)));
    }

    report.push_str(&format!("\n{} DISTRIBUTION:\n", preset.mapped_heading()));
    for (value, count) in eval.mapped_truth.sorted() {
        report.push_str(&format!("  {value}: {count} ({:.1}%)\n", eval.mapped_truth.percent(count)));
    }

    report.push_str(&format!("\n{target} DISTRIBUTION:\n"));
    for (value, count) in eval.predictions.sorted() {
        report.push_str(&format!("  {value}: {count} ({:.1}%)\n", eval.predictions.percent(count)));
    }

    report.push_str("\nCLASSIFICATION METRICS:\n");
    push_metric_lines(&mut report, metrics);

    report.push_str("\nCPPCHECK SIMILARITY RATE:\n");
    report.push_str(&format!("  CppCheck Similarity Rate: {:.4}\n", eval.similarity));

    report.push_str(&format!("\nAGREEMENT BY ORIGINAL {truth_upper}:\n"));
    for (group, stats) in &eval.agreement.groups {
        report.push_str(&format!("  {group}: {}/{} ({:.4})\n", stats.matches, stats.total, stats.rate));
    }

    report.push_str("\nCONFUSION MATRIX:\n");
    report.push_str(&format!("  {:>CELL$}", ""));
    for label in &metrics.labels {
        report.push_str(&format!("{label:>CELL$}"));
    }
    report.push('\n');
    for truth in &metrics.labels {
        report.push_str(&format!("  {truth:>CELL$}"));
        for predicted in &metrics.labels {
            report.push_str(&format!("{:>CELL$}", metrics.confusion.get(truth, predicted)));
        }
        report.push('\n');
    }

    report.push_str("\nPER-CLASS DETAILED METRICS:\n");
    for class in &metrics.per_class {
        report.push_str(&format!("  {}:\n", class.label));
        report.push_str(&format!("    Precision: {:.4}\n", class.precision));
        report.push_str(&format!("    Recall: {:.4}\n", class.recall));
        report.push_str(&format!("    F1-Score: {:.4}\n", class.f1));
        report.push_str(&format!("    Support: {}\n", class.support));
    }

    report.push_str("\nDETAILED CLASSIFICATION REPORT:\n");
    report.push_str(&classification_report(metrics, 2));
    report
}

/// Condensed report written with `--output`
#[must_use]
pub fn summary_report(eval: &Evaluation) -> String {
    let preset = eval.comparison.preset;
    let truth = preset.truth_column();
    let metrics = &eval.metrics;

    let mut report = String::new();
    report.push_str(&format!("{} EVALUATION ANALYSIS\n", eval.comparison.title()));
    report.push_str(&format!("{}\n\n", "=".repeat(RULE)));

    report.push_str("DATASET OVERVIEW:\n");
    report.push_str(&format!("  Total Records: {}\n", eval.len()));
    report.push_str(&format!(
        "  Overall Agreement Rate: {:.4} ({}/{})\n\n",
        eval.agreement.rate, eval.agreement.matches, eval.agreement.total
    ));

    report.push_str("CLASSIFICATION METRICS:\n");
    push_metric_lines(&mut report, metrics);
    report.push('\n');

    report.push_str("CPPCHECK SIMILARITY:\n");
    report.push_str(&format!("  CppCheck Similarity Rate: {:.4}\n\n", eval.similarity));

    report.push_str("CATEGORY DISTRIBUTIONS:\n");
    report.push_str(&format!("  Original {truth}: {}\n", eval.original_truth.to_inline()));
    report.push_str(&format!(
        "  {}: {}\n",
        preset.mapped_column(),
        eval.mapped_truth.to_inline()
    ));
    report.push_str(&format!(
        "  {}: {}\n\n",
        eval.comparison.target_column,
        eval.predictions.to_inline()
    ));

    report.push_str(&format!("AGREEMENT BY {}:\n", truth.to_uppercase()));
    for (group, stats) in &eval.agreement.groups {
        report.push_str(&format!("  {group}: {}/{} ({:.4})\n", stats.matches, stats.total, stats.rate));
    }
    report.push('\n');

    report.push_str("CONFUSION MATRIX:\n");
    for label in &metrics.labels {
        let cells: Vec<String> = metrics
            .labels
            .iter()
            .map(|p| format!("'{p}': {}", metrics.confusion.get(label, p)))
            .collect();
        report.push_str(&format!("{label}: {{{}}}\n", cells.join(", ")));
    }

    report.push_str("\nDETAILED CLASSIFICATION REPORT:\n");
    report.push_str(&classification_report(metrics, 2));
    report
}

fn push_metric_lines(report: &mut String, metrics: &Metrics) {
    report.push_str(&format!("  Accuracy: {:.4}\n", metrics.accuracy));
    report.push_str(&format!("  Precision (Macro): {:.4}\n", metrics.macro_avg.precision));
    report.push_str(&format!("  Recall (Macro): {:.4}\n", metrics.macro_avg.recall));
    report.push_str(&format!("  F1 Score (Macro): {:.4}\n", metrics.macro_avg.f1));
    report.push_str(&format!("  Precision (Weighted): {:.4}\n", metrics.weighted_avg.precision));
    report.push_str(&format!("  Recall (Weighted): {:.4}\n", metrics.weighted_avg.recall));
    report.push_str(&format!("  F1 Score (Weighted): {:.4}\n", metrics.weighted_avg.f1));
}

/// Write `content` to `path`, creating parent directories
///
/// # Errors
/// Returns `ExportError::Io` on failure
pub fn write_text(path: impl AsRef<Path>, content: &str) -> Result<(), ExportError> {
    let path = path.as_ref();
    ensure_parent(path)?;
    std::fs::write(path, content).map_err(|e| ExportError::io_error(path, e))
}

pub(crate) fn ensure_parent(path: &Path) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| ExportError::io_error(parent, e))?;
        }
    }
    Ok(())
}

/// Export the scored rows with the normalized columns appended
///
/// # Errors
/// Returns `ExportError` if the file cannot be written
pub fn write_processed_csv(
    eval: &Evaluation,
    table: &LabeledTable,
    path: impl AsRef<Path>,
) -> Result<(), ExportError> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;

    let mut header: Vec<&str> = table.headers().iter().map(String::as_str).collect();
    header.push(eval.comparison.preset.mapped_column());
    header.push(CLEANED_TARGET_COLUMN);
    writer.write_record(&header)?;

    for row in &eval.rows {
        let mut record: Vec<&str> = table
            .rows()
            .get(row.index)
            .map(|cells| cells.iter().map(String::as_str).collect())
            .unwrap_or_default();
        record.resize(table.headers().len(), "");
        record.push(&row.truth);
        record.push(&row.prediction);
        writer.write_record(&record)?;
    }
    writer.flush().map_err(|e| ExportError::io_error(path, e))?;
    Ok(())
}
