//! Agreement rates
//!
//! Overall share of matching labels, broken down by the raw (un-normalized)
//! truth value so that e.g. `warning` and `error` stay apart even though both
//! map to `bug`.

use crate::error::MetricsError;
use indexmap::IndexMap;
use serde::Serialize;

/// Matches within one group
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GroupAgreement {
    pub matches: usize,
    pub total: usize,
    pub rate: f64,
}

/// Overall and per-group agreement
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Agreement {
    pub matches: usize,
    pub total: usize,
    pub rate: f64,
    /// Keyed by raw truth value, first-seen order
    pub groups: IndexMap<String, GroupAgreement>,
}

/// Agreement between `y_true` and `y_pred`, grouped by `group_keys`
///
/// # Errors
/// Returns `MetricsError::LengthMismatch` if the three sequences differ in length
pub fn agreement<K: AsRef<str>>(
    group_keys: &[K],
    y_true: &[String],
    y_pred: &[String],
) -> Result<Agreement, MetricsError> {
    if y_true.len() != y_pred.len() {
        return Err(MetricsError::LengthMismatch {
            truth: y_true.len(),
            predicted: y_pred.len(),
        });
    }
    if group_keys.len() != y_true.len() {
        return Err(MetricsError::LengthMismatch {
            truth: y_true.len(),
            predicted: group_keys.len(),
        });
    }

    let mut result = Agreement::default();
    for ((key, t), p) in group_keys.iter().zip(y_true).zip(y_pred) {
        let group = result.groups.entry(key.as_ref().to_string()).or_default();
        group.total += 1;
        if t == p {
            group.matches += 1;
            result.matches += 1;
        }
    }
    result.total = y_true.len();
    result.rate = rate(result.matches, result.total);
    for group in result.groups.values_mut() {
        group.rate = rate(group.matches, group.total);
    }
    Ok(result)
}

#[allow(clippy::cast_precision_loss)]
fn rate(matches: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        matches as f64 / total as f64
    }
}
