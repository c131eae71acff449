//! Classification scoring
//!
//! Scores two index-aligned label sequences:
//! - Per-class precision, recall, F1 and support over the sorted label union
//! - Accuracy, macro and support-weighted averages
//! - Confusion matrix zero-filled over the same universe
//! - Similarity rate: mean F1 over the labels that actually occur
//!
//! Every zero denominator yields 0.0 rather than NaN.

use crate::error::MetricsError;
use serde::Serialize;
use std::collections::BTreeSet;

/// Counts and scores for one label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: String,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Occurrences in the truth sequence
    pub support: usize,
}

impl ClassMetrics {
    fn from_counts(label: &str, tp: usize, fp: usize, fn_: usize) -> Self {
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            label: label.to_string(),
            true_positives: tp,
            false_positives: fp,
            false_negatives: fn_,
            precision,
            recall,
            f1,
            support: tp + fn_,
        }
    }

    /// Label occurs in either sequence
    #[inline]
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.true_positives + self.false_positives > 0
            || self.true_positives + self.false_negatives > 0
    }
}

/// Precision, recall and F1 averaged over classes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Averages {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// `counts[i][j]`: items with true label `labels[i]` predicted as `labels[j]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    labels: Vec<String>,
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    fn build(labels: &[String], y_true: &[String], y_pred: &[String]) -> Self {
        let n = labels.len();
        let mut counts = vec![vec![0; n]; n];
        for (t, p) in y_true.iter().zip(y_pred) {
            if let (Ok(i), Ok(j)) = (labels.binary_search(t), labels.binary_search(p)) {
                counts[i][j] += 1;
            }
        }
        Self {
            labels: labels.to_vec(),
            counts,
        }
    }

    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Count for one (true, predicted) pair, zero for unknown labels
    #[must_use]
    pub fn get(&self, truth: &str, predicted: &str) -> usize {
        let i = self.labels.iter().position(|l| l == truth);
        let j = self.labels.iter().position(|l| l == predicted);
        match (i, j) {
            (Some(i), Some(j)) => self.counts[i][j],
            _ => 0,
        }
    }

    /// Row of counts for a true label
    #[must_use]
    pub fn row(&self, truth: &str) -> Option<&[usize]> {
        let i = self.labels.iter().position(|l| l == truth)?;
        Some(&self.counts[i])
    }

    /// Per-label totals of the truth sequence
    #[must_use]
    pub fn row_sums(&self) -> Vec<usize> {
        self.counts.iter().map(|row| row.iter().sum()).collect()
    }

    /// Per-label totals of the prediction sequence
    #[must_use]
    pub fn column_sums(&self) -> Vec<usize> {
        (0..self.labels.len())
            .map(|j| self.counts.iter().map(|row| row[j]).sum())
            .collect()
    }
}

/// Full scoring of one truth/prediction pair of sequences
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    /// Sorted union of both sequences
    pub labels: Vec<String>,
    pub total: usize,
    pub accuracy: f64,
    pub macro_avg: Averages,
    pub weighted_avg: Averages,
    /// One entry per label, same order as `labels`
    pub per_class: Vec<ClassMetrics>,
    pub confusion: ConfusionMatrix,
}

impl Metrics {
    /// Metrics for one label
    #[must_use]
    pub fn class(&self, label: &str) -> Option<&ClassMetrics> {
        self.per_class.iter().find(|c| c.label == label)
    }

    /// Mean F1 over labels present in either sequence
    #[must_use]
    pub fn similarity_rate(&self) -> f64 {
        mean_f1(self.per_class.iter().filter(|c| c.is_present()))
    }
}

/// Score `y_pred` against `y_true`
///
/// # Errors
/// Returns `MetricsError::LengthMismatch` if the sequences differ in length
pub fn score(y_true: &[String], y_pred: &[String]) -> Result<Metrics, MetricsError> {
    check_lengths(y_true, y_pred)?;

    let labels: Vec<String> = y_true
        .iter()
        .chain(y_pred)
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let confusion = ConfusionMatrix::build(&labels, y_true, y_pred);
    let row_sums = confusion.row_sums();
    let col_sums = confusion.column_sums();

    let per_class: Vec<ClassMetrics> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let tp = confusion.counts[i][i];
            ClassMetrics::from_counts(label, tp, col_sums[i] - tp, row_sums[i] - tp)
        })
        .collect();

    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();

    Ok(Metrics {
        total: y_true.len(),
        accuracy: ratio(correct, y_true.len()),
        macro_avg: macro_average(&per_class),
        weighted_avg: weighted_average(&per_class),
        labels,
        per_class,
        confusion,
    })
}

/// Similarity rate restricted to `labels`
///
/// Labels absent from both sequences are skipped.
///
/// # Errors
/// Returns `MetricsError::LengthMismatch` if the sequences differ in length
pub fn similarity_rate_over(
    y_true: &[String],
    y_pred: &[String],
    labels: &[&str],
) -> Result<f64, MetricsError> {
    check_lengths(y_true, y_pred)?;

    let classes: Vec<ClassMetrics> = labels
        .iter()
        .map(|label| {
            let mut tp = 0;
            let mut fp = 0;
            let mut fn_ = 0;
            for (t, p) in y_true.iter().zip(y_pred) {
                match (t == label, p == label) {
                    (true, true) => tp += 1,
                    (false, true) => fp += 1,
                    (true, false) => fn_ += 1,
                    (false, false) => {}
                }
            }
            ClassMetrics::from_counts(label, tp, fp, fn_)
        })
        .collect();

    Ok(mean_f1(classes.iter().filter(|c| c.is_present())))
}

fn check_lengths(y_true: &[String], y_pred: &[String]) -> Result<(), MetricsError> {
    if y_true.len() == y_pred.len() {
        Ok(())
    } else {
        Err(MetricsError::LengthMismatch {
            truth: y_true.len(),
            predicted: y_pred.len(),
        })
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean_f1<'a>(classes: impl Iterator<Item = &'a ClassMetrics>) -> f64 {
    let (sum, n) = classes.fold((0.0, 0usize), |(sum, n), c| (sum + c.f1, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

#[allow(clippy::cast_precision_loss)]
fn macro_average(classes: &[ClassMetrics]) -> Averages {
    if classes.is_empty() {
        return Averages::default();
    }
    let n = classes.len() as f64;
    Averages {
        precision: classes.iter().map(|c| c.precision).sum::<f64>() / n,
        recall: classes.iter().map(|c| c.recall).sum::<f64>() / n,
        f1: classes.iter().map(|c| c.f1).sum::<f64>() / n,
    }
}

#[allow(clippy::cast_precision_loss)]
fn weighted_average(classes: &[ClassMetrics]) -> Averages {
    let total: usize = classes.iter().map(|c| c.support).sum();
    if total == 0 {
        return Averages::default();
    }
    let total = total as f64;
    let weigh = |f: fn(&ClassMetrics) -> f64| {
        classes.iter().map(|c| f(c) * c.support as f64).sum::<f64>() / total
    };
    Averages {
        precision: weigh(|c| c.precision),
        recall: weigh(|c| c.recall),
        f1: weigh(|c| c.f1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn bug_style_scenario() {
        let m = score(&labels(&["bug", "bug", "style"]), &labels(&["bug", "style", "style"])).unwrap();

        assert_eq!(m.labels, labels(&["bug", "style"]));
        assert!(close(m.accuracy, 2.0 / 3.0));

        let bug = m.class("bug").unwrap();
        assert!(close(bug.precision, 1.0));
        assert!(close(bug.recall, 0.5));
        assert!(close(bug.f1, 0.667));
        assert_eq!(bug.support, 2);

        let style = m.class("style").unwrap();
        assert!(close(style.precision, 0.5));
        assert!(close(style.recall, 1.0));
        assert!(close(style.f1, 0.667));
        assert_eq!(style.support, 1);

        assert!(close(m.macro_avg.f1, 0.667));
        assert!(close(m.macro_avg.precision, 0.75));
        assert!(close(m.weighted_avg.precision, 2.5 / 3.0));
        assert!(close(m.similarity_rate(), 0.667));
    }

    #[test]
    fn identical_sequences_score_one() {
        let seq = labels(&["bug", "style", "unknown", "bug"]);
        let m = score(&seq, &seq).unwrap();

        assert!(close(m.accuracy, 1.0));
        assert!(close(m.macro_avg.f1, 1.0));
        assert!(close(m.weighted_avg.f1, 1.0));
        assert!(close(m.similarity_rate(), 1.0));
        for class in &m.per_class {
            assert!(close(class.precision, 1.0));
            assert!(close(class.recall, 1.0));
        }
    }

    #[test]
    fn length_mismatch() {
        let err = score(&labels(&["a"]), &labels(&["a", "b"])).unwrap_err();
        assert_eq!(err, MetricsError::LengthMismatch { truth: 1, predicted: 2 });
    }

    #[test]
    fn empty_input_scores_zero() {
        let m = score(&[], &[]).unwrap();
        assert!(m.labels.is_empty());
        assert!(close(m.accuracy, 0.0));
        assert!(close(m.macro_avg.f1, 0.0));
        assert!(close(m.weighted_avg.f1, 0.0));
        assert!(close(m.similarity_rate(), 0.0));
    }

    #[test]
    fn prediction_only_label_has_zero_support() {
        let m = score(&labels(&["bug", "bug"]), &labels(&["bug", "style"])).unwrap();
        let style = m.class("style").unwrap();
        assert_eq!(style.support, 0);
        assert!(close(style.precision, 0.0));
        assert!(close(style.recall, 0.0));
        assert!(close(m.weighted_avg.recall, 0.5));
    }

    #[test]
    fn confusion_matrix_zero_filled() {
        let m = score(&labels(&["a", "b", "b"]), &labels(&["b", "b", "c"])).unwrap();
        assert_eq!(m.confusion.get("a", "b"), 1);
        assert_eq!(m.confusion.get("b", "c"), 1);
        assert_eq!(m.confusion.get("c", "a"), 0);
        assert_eq!(m.confusion.row("c"), Some(&[0, 0, 0][..]));
        assert_eq!(m.confusion.get("zzz", "a"), 0);
    }

    #[test]
    fn similarity_over_subset() {
        let t = labels(&["bug", "bug", "style"]);
        let p = labels(&["bug", "style", "style"]);
        let rate = similarity_rate_over(&t, &p, &["bug", "missing"]).unwrap();
        assert!(close(rate, 0.667));
    }
}
