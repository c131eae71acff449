//! cppeval Agent - HTTP backend for the analysis workflow
//!
//! Talks to the agent service that runs the planner/researcher/reporter graph:
//! - Posts one CppCheck defect per request
//! - Decodes the `text/event-stream` reply
//! - Rebuilds the final workflow state from streamed message chunks

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod http;
pub mod sse;
pub mod stream;

pub use error::AgentError;
pub use http::{AnalyzeRequest, HttpWorkflow, ANALYZE_PATH, DEFAULT_THREAD_ID};
pub use sse::{SseEvent, SseParser};
pub use stream::{StateAssembler, StreamEventKind, StreamPayload};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
