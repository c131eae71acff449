//! cppeval Metrics - scoring and reporting for CppCheck evaluations
//!
//! Two consumers share this crate:
//! - Labeled tables: compare CppCheck severity or human category against a
//!   prediction column and print classification metrics
//! - Batch results: summarize a `{metadata, results}` document written by a run
//!
//! # Example
//!
//! ```rust,ignore
//! use cppeval_metrics::prelude::*;
//!
//! let table = LabeledTable::load("labeled.csv")?;
//! let eval = Comparison::severity().evaluate(&table)?;
//! println!("{}", detailed_report(&eval));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod agreement;
pub mod distribution;
pub mod error;
pub mod evaluation;
pub mod labels;
pub mod report;
pub mod results;
pub mod scoring;
pub mod table;

// Re-exports for convenience
pub use agreement::{agreement, Agreement, GroupAgreement};
pub use distribution::Distribution;
pub use error::{ExportError, MetricsError, TableError};
pub use evaluation::{
    Comparison, EvaluatedRow, Evaluation, Preset, DEFAULT_TARGET_COLUMN, FALSE_POSITIVE,
};
pub use labels::{clean_label, clean_optional, map_severity, LabelMapping, UNKNOWN_LABEL};
pub use report::{
    classification_report, detailed_report, summary_report, write_processed_csv, write_text,
    CLEANED_TARGET_COLUMN,
};
pub use results::{
    write_csv_summary, BasicStats, ErrorAnalysis, ErrorCategory, ErrorSample, RunAnalysis,
    SummaryAnalysis, NUMERIC_VALUES,
};
pub use scoring::{score, similarity_rate_over, Averages, ClassMetrics, ConfusionMatrix, Metrics};
pub use table::LabeledTable;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for scoring and reporting
    pub use crate::{
        detailed_report, score, summary_report, Comparison, Evaluation, LabeledTable, Metrics,
        Preset, RunAnalysis,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
