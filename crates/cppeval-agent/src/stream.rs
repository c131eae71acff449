//! Workflow state assembly from streamed events
//!
//! The agent service streams token chunks tagged with a message id. Chunks
//! sharing an id are concatenated; messages keep the order in which their
//! first chunk arrived, so the reporter's final answer ends up last.

use crate::sse::SseEvent;
use cppeval_core::{WorkflowError, WorkflowMessage, WorkflowState};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

/// Payload carried in the `data:` field of every stream event
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StreamPayload {
    pub thread_id: Option<String>,
    pub agent: Option<String>,
    pub id: Option<String>,
    pub role: Option<String>,
    /// Absent when the chunk carries no text
    pub content: Option<Value>,
    pub finish_reason: Option<String>,
    pub tool_call_id: Option<String>,
}

impl StreamPayload {
    fn text(&self) -> &str {
        self.content.as_ref().and_then(Value::as_str).unwrap_or("")
    }
}

/// Kinds of event the agent service emits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEventKind {
    MessageChunk,
    ToolCalls,
    ToolCallChunks,
    ToolCallResult,
    Interrupt,
    Unknown,
}

impl StreamEventKind {
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "message_chunk" => Self::MessageChunk,
            "tool_calls" => Self::ToolCalls,
            "tool_call_chunks" => Self::ToolCallChunks,
            "tool_call_result" => Self::ToolCallResult,
            "interrupt" => Self::Interrupt,
            _ => Self::Unknown,
        }
    }
}

/// Accumulates streamed events into a [`WorkflowState`]
#[derive(Debug, Default)]
pub struct StateAssembler {
    messages: IndexMap<String, WorkflowMessage>,
    thread_id: Option<String>,
    finish_reason: Option<String>,
}

impl StateAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one decoded event
    ///
    /// # Errors
    /// Returns `WorkflowError::Protocol` if the event data is not a JSON object
    pub fn push(&mut self, event: &SseEvent) -> Result<(), WorkflowError> {
        let kind = StreamEventKind::parse(&event.event);
        if kind == StreamEventKind::Unknown {
            tracing::debug!("Ignoring stream event of type {}", event.event);
            return Ok(());
        }

        let payload: StreamPayload = serde_json::from_str(&event.data).map_err(|e| {
            WorkflowError::Protocol(format!("bad {} payload: {}", event.event, e))
        })?;
        if self.thread_id.is_none() {
            self.thread_id.clone_from(&payload.thread_id);
        }
        if payload.finish_reason.is_some() {
            self.finish_reason.clone_from(&payload.finish_reason);
        }

        match kind {
            StreamEventKind::MessageChunk => {
                let key = payload.id.clone().unwrap_or_default();
                self.append(key, "assistant", &payload);
            }
            StreamEventKind::ToolCallResult => {
                let key = payload
                    .id
                    .clone()
                    .or_else(|| payload.tool_call_id.clone())
                    .unwrap_or_default();
                self.append(format!("tool:{key}"), "tool", &payload);
            }
            StreamEventKind::Interrupt => {
                let key = payload.id.clone().unwrap_or_default();
                self.append(format!("interrupt:{key}"), "assistant", &payload);
            }
            StreamEventKind::ToolCalls | StreamEventKind::ToolCallChunks => {
                tracing::trace!("Tool call from {:?}", payload.agent);
            }
            StreamEventKind::Unknown => {}
        }
        Ok(())
    }

    fn append(&mut self, key: String, role: &str, payload: &StreamPayload) {
        let entry = self.messages.entry(key).or_insert_with(|| WorkflowMessage {
            role: payload.role.clone().unwrap_or_else(|| role.to_string()),
            agent: payload.agent.clone(),
            content: None,
        });
        let text = payload.text();
        if !text.is_empty() {
            entry.content.get_or_insert_with(String::new).push_str(text);
        }
    }

    /// Thread id reported by the service
    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    /// Last finish reason seen
    pub fn finish_reason(&self) -> Option<&str> {
        self.finish_reason.as_deref()
    }

    /// Final state, messages in first-seen order
    #[must_use]
    pub fn finish(self) -> WorkflowState {
        WorkflowState::new(self.messages.into_values().collect())
    }
}
