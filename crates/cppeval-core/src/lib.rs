//! cppeval Core - batch evaluation of CppCheck defects
//!
//! Runs an external LLM analysis workflow over a table of defects:
//! - Parses and validates the defect table
//! - Dispatches each defect to the workflow, isolating failures
//! - Bounds concurrency and collects results in completion order
//! - Checkpoints `{metadata, results}` to disk as the run progresses
//!
//! # Example
//!
//! ```rust,ignore
//! use cppeval_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example(workflow: Arc<dyn AnalysisWorkflow>) -> Result<(), Box<dyn std::error::Error>> {
//! let defects = DefectParser::new().parse_path("defects.csv")?;
//! let dispatcher = Dispatcher::new(workflow);
//! let store = Arc::new(JsonResultStore::new("evaluation_results.json"));
//! let runner = BatchRunner::new(dispatcher, store).with_max_concurrent(4);
//!
//! let summary = runner.run(&defects, 0, None).await?;
//! println!("{} succeeded", summary.metadata.success_count);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod extract;
pub mod parser;
pub mod runner;
pub mod store;
pub mod types;
pub mod workflow;

// Re-exports for convenience
pub use config::{EvalConfig, AGENT_URL_ENV, DEFAULT_AGENT_URL};
pub use dispatcher::Dispatcher;
pub use error::{
    ConfigError, ErrorKind, ExtractionError, ParseError, RangeError, RowError, RunError,
    StoreError, WorkflowError,
};
pub use extract::extract_json_summary;
pub use parser::{DefectParser, ParsedTable, REQUIRED_COLUMNS};
pub use runner::{select_range, BatchRunner, RunSummary, DEFAULT_CHECKPOINT_INTERVAL};
pub use store::{JsonResultStore, ResultSink};
pub use types::{
    AnalysisOutcome, AnalysisResult, CppcheckData, DefectRecord, ResultStatus, ResultsDocument,
    RunMetadata,
};
pub use workflow::{AnalysisWorkflow, WorkflowMessage, WorkflowOptions, WorkflowState};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running a batch evaluation
    pub use crate::{
        AnalysisResult, AnalysisWorkflow, BatchRunner, DefectParser, DefectRecord, Dispatcher,
        EvalConfig, JsonResultStore, ResultSink, RunSummary, WorkflowOptions,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
