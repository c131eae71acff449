//! Error types for the agent backend

use cppeval_core::WorkflowError;
use std::time::Duration;

/// Errors while setting up the HTTP workflow
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Base URL does not parse
    #[error("invalid agent URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// HTTP client could not be built
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Map a transport failure onto the workflow error taxonomy
pub(crate) fn transport_error(err: &reqwest::Error, timeout: Option<Duration>) -> WorkflowError {
    if err.is_timeout() {
        WorkflowError::Timeout {
            duration_secs: timeout.map_or(0, |t| t.as_secs()),
        }
    } else if err.is_decode() {
        WorkflowError::Protocol(err.to_string())
    } else {
        WorkflowError::Transport(err.to_string())
    }
}
