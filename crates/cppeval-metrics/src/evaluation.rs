//! Labeled-table evaluation presets
//!
//! Two comparisons are supported:
//! - `severity`: CppCheck `Severity` (warning/error folded into bug) against
//!   a target column, with rows the target marks `false_positive` dropped
//! - `category`: human `Category` against a target column, no filtering
//!
//! The target column defaults to `Ours`; `Baseline` or any other column can
//! be selected instead.

use crate::agreement::{agreement, Agreement};
use crate::distribution::Distribution;
use crate::error::TableError;
use crate::labels::LabelMapping;
use crate::scoring::{score, Metrics};
use crate::table::LabeledTable;

/// Default column holding the predictions
pub const DEFAULT_TARGET_COLUMN: &str = "Ours";

/// Raw target value that excludes a row from severity scoring
pub const FALSE_POSITIVE: &str = "false_positive";

/// Which column is compared against the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Severity,
    Category,
}

impl Preset {
    /// Column holding the truth labels
    #[must_use]
    pub fn truth_column(self) -> &'static str {
        match self {
            Self::Severity => "Severity",
            Self::Category => "Category",
        }
    }

    /// How truth values become labels
    #[must_use]
    pub fn truth_mapping(self) -> LabelMapping {
        match self {
            Self::Severity => LabelMapping::Severity,
            Self::Category => LabelMapping::Clean,
        }
    }

    /// Header of the normalized truth column in exports
    #[must_use]
    pub fn mapped_column(self) -> &'static str {
        match self {
            Self::Severity => "mapped_severity",
            Self::Category => "cleaned_category",
        }
    }

    /// Report heading for the normalized truth labels
    #[must_use]
    pub fn mapped_heading(self) -> &'static str {
        match self {
            Self::Severity => "MAPPED SEVERITY",
            Self::Category => "CLEANED CATEGORY",
        }
    }
}

impl std::str::FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "severity" => Ok(Self::Severity),
            "category" => Ok(Self::Category),
            other => Err(format!("unknown preset '{other}' (expected severity or category)")),
        }
    }
}

/// A configured comparison over a labeled table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub preset: Preset,
    pub target_column: String,
    pub drop_false_positives: bool,
}

impl Comparison {
    /// Severity vs `Ours`, false positives dropped
    #[must_use]
    pub fn severity() -> Self {
        Self {
            preset: Preset::Severity,
            target_column: DEFAULT_TARGET_COLUMN.to_string(),
            drop_false_positives: true,
        }
    }

    /// Category vs `Ours`, nothing dropped
    #[must_use]
    pub fn category() -> Self {
        Self {
            preset: Preset::Category,
            target_column: DEFAULT_TARGET_COLUMN.to_string(),
            drop_false_positives: false,
        }
    }

    /// Comparison for a preset with its default filtering
    #[must_use]
    pub fn for_preset(preset: Preset) -> Self {
        match preset {
            Preset::Severity => Self::severity(),
            Preset::Category => Self::category(),
        }
    }

    /// With prediction column
    #[inline]
    #[must_use]
    pub fn with_target(mut self, column: impl Into<String>) -> Self {
        self.target_column = column.into();
        self
    }

    /// With false-positive filtering on or off
    #[inline]
    #[must_use]
    pub fn with_drop_false_positives(mut self, drop: bool) -> Self {
        self.drop_false_positives = drop;
        self
    }

    /// Title used in reports, e.g. `Ours vs SEVERITY`
    #[must_use]
    pub fn title(&self) -> String {
        format!(
            "{} vs {}",
            self.target_column,
            self.preset.truth_column().to_uppercase()
        )
    }

    /// Run the comparison
    ///
    /// # Errors
    /// - `TableError::MissingColumns` if the truth or target column is absent
    /// - `TableError::NoRows` if no rows remain after filtering
    pub fn evaluate(&self, table: &LabeledTable) -> Result<Evaluation, TableError> {
        let truth_name = self.preset.truth_column();
        let required = [truth_name, self.target_column.as_str()];
        table.require(&required)?;
        let column = |name: &str| {
            table.column(name).ok_or_else(|| TableError::MissingColumns {
                required: required.iter().map(|s| (*s).to_string()).collect(),
                missing: vec![name.to_string()],
            })
        };
        let truth_col = column(truth_name)?;
        let target_col = column(&self.target_column)?;
        let mapping = self.preset.truth_mapping();

        let target_before: Distribution = (0..table.len())
            .map(|i| LabelMapping::Clean.apply(table.value(i, target_col)))
            .collect();

        let mut rows = Vec::new();
        let mut false_positives = 0;
        for i in 0..table.len() {
            let raw_target = table.value(i, target_col);
            if self.drop_false_positives && raw_target.trim().to_lowercase() == FALSE_POSITIVE {
                false_positives += 1;
                continue;
            }
            let raw_truth = table.value(i, truth_col);
            rows.push(EvaluatedRow {
                index: i,
                original_truth: raw_truth.to_string(),
                truth: mapping.apply(raw_truth),
                prediction: LabelMapping::Clean.apply(raw_target),
            });
        }

        if self.drop_false_positives {
            tracing::info!(
                "Filtered out {} records marked as '{}' in {}",
                false_positives,
                FALSE_POSITIVE,
                self.target_column
            );
        }
        if rows.is_empty() {
            return Err(TableError::NoRows {
                filtered: false_positives,
            });
        }

        let y_true: Vec<String> = rows.iter().map(|r| r.truth.clone()).collect();
        let y_pred: Vec<String> = rows.iter().map(|r| r.prediction.clone()).collect();
        let groups: Vec<&str> = rows.iter().map(|r| r.original_truth.as_str()).collect();

        let metrics = score(&y_true, &y_pred)?;
        let similarity = metrics.similarity_rate();
        let agreement = agreement(&groups, &y_true, &y_pred)?;

        Ok(Evaluation {
            comparison: self.clone(),
            loaded: table.len(),
            false_positives,
            target_before,
            original_truth: groups.iter().copied().collect(),
            mapped_truth: y_true.iter().map(String::as_str).collect(),
            predictions: y_pred.iter().map(String::as_str).collect(),
            rows,
            metrics,
            similarity,
            agreement,
        })
    }
}

/// One scored row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluatedRow {
    /// Row index in the source table
    pub index: usize,
    pub original_truth: String,
    pub truth: String,
    pub prediction: String,
}

/// Everything computed by [`Comparison::evaluate`]
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub comparison: Comparison,
    /// Rows in the source table
    pub loaded: usize,
    /// Rows dropped as false positives
    pub false_positives: usize,
    /// Cleaned target values before filtering
    pub target_before: Distribution,
    pub original_truth: Distribution,
    pub mapped_truth: Distribution,
    pub predictions: Distribution,
    pub rows: Vec<EvaluatedRow>,
    pub metrics: Metrics,
    pub similarity: f64,
    pub agreement: Agreement,
}

impl Evaluation {
    /// Rows that were scored
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
