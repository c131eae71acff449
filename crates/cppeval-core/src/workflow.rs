//! Analysis workflow seam
//!
//! The agent graph that actually analyses a defect lives outside this
//! workspace. The harness only needs one operation from it: run the workflow
//! for one defect and hand back the final state.

use crate::error::WorkflowError;
use crate::types::CppcheckData;
use serde::{Deserialize, Serialize};

/// Knobs forwarded to the external workflow for every defect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowOptions {
    /// Verbose workflow logging
    pub debug: bool,
    /// Maximum number of plan iterations
    pub max_plan_iterations: u32,
    /// Maximum number of steps in a plan
    pub max_step_num: u32,
    /// Search the web before planning
    pub enable_background_investigation: bool,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            debug: false,
            max_plan_iterations: 1,
            max_step_num: 3,
            enable_background_investigation: true,
        }
    }
}

/// One message of the workflow's final state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowMessage {
    /// user, assistant, tool
    pub role: String,
    /// Graph node that produced the message, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    /// Text content, when the message has any
    #[serde(default)]
    pub content: Option<String>,
}

impl WorkflowMessage {
    /// Assistant message with text content
    #[inline]
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            agent: None,
            content: Some(content.into()),
        }
    }

    /// With producing agent
    #[inline]
    #[must_use]
    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }
}

/// Final state returned by the workflow
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkflowState {
    /// Conversation messages, oldest first
    #[serde(default)]
    pub messages: Vec<WorkflowMessage>,
}

impl WorkflowState {
    /// State holding the given messages
    #[inline]
    #[must_use]
    pub fn new(messages: Vec<WorkflowMessage>) -> Self {
        Self { messages }
    }

    /// Text of the last message, or an empty string
    #[must_use]
    pub fn final_content(&self) -> &str {
        self.messages
            .last()
            .and_then(|m| m.content.as_deref())
            .unwrap_or("")
    }
}

/// The external analysis capability
///
/// Implementations may be slow and may fail; the dispatcher isolates both.
#[async_trait::async_trait]
pub trait AnalysisWorkflow: Send + Sync {
    /// Run the workflow for one defect and return its final state
    async fn run_analysis(
        &self,
        cppcheck_data: &CppcheckData,
        options: &WorkflowOptions,
    ) -> Result<WorkflowState, WorkflowError>;
}
