//! HTTP analysis workflow
//!
//! Posts one defect to the agent service's CppCheck endpoint and rebuilds
//! the final workflow state from the event stream it answers with.

use crate::error::{transport_error, AgentError};
use crate::sse::SseParser;
use crate::stream::StateAssembler;
use cppeval_core::{AnalysisWorkflow, CppcheckData, WorkflowError, WorkflowOptions, WorkflowState};
use serde::Serialize;
use std::time::Duration;

/// Path of the analysis endpoint under the service base URL
pub const ANALYZE_PATH: &str = "/api/cppcheck/analyze";

/// Thread id that asks the service to allocate a fresh thread
pub const DEFAULT_THREAD_ID: &str = "__default__";

/// Request body of the analysis endpoint
#[derive(Debug, Serialize)]
pub struct AnalyzeRequest<'a> {
    pub cppcheck_data: &'a CppcheckData,
    pub debug: bool,
    pub thread_id: &'a str,
    pub max_plan_iterations: u32,
    pub max_step_num: u32,
    pub auto_accepted_plan: bool,
    pub enable_background_investigation: bool,
}

impl<'a> AnalyzeRequest<'a> {
    /// Request for one defect, plan auto-accepted
    #[must_use]
    pub fn new(cppcheck_data: &'a CppcheckData, options: &WorkflowOptions) -> Self {
        Self {
            cppcheck_data,
            debug: options.debug,
            thread_id: DEFAULT_THREAD_ID,
            max_plan_iterations: options.max_plan_iterations,
            max_step_num: options.max_step_num,
            auto_accepted_plan: true,
            enable_background_investigation: options.enable_background_investigation,
        }
    }
}

/// [`AnalysisWorkflow`] backed by the agent service over HTTP
#[derive(Debug, Clone)]
pub struct HttpWorkflow {
    client: reqwest::Client,
    endpoint: String,
    timeout: Option<Duration>,
}

impl HttpWorkflow {
    /// Workflow talking to the service at `base_url`
    ///
    /// # Errors
    /// - `AgentError::InvalidUrl` if `base_url` is not an absolute URL
    /// - `AgentError::Client` if the HTTP client cannot be built
    pub fn new(base_url: &str) -> Result<Self, AgentError> {
        let parsed = reqwest::Url::parse(base_url).map_err(|e| AgentError::InvalidUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(AgentError::InvalidUrl {
                url: base_url.to_string(),
                message: "not a base URL".to_string(),
            });
        }

        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), ANALYZE_PATH),
            timeout: None,
        })
    }

    /// With a limit on each request, stream included
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL of the analysis endpoint
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl AnalysisWorkflow for HttpWorkflow {
    async fn run_analysis(
        &self,
        cppcheck_data: &CppcheckData,
        options: &WorkflowOptions,
    ) -> Result<WorkflowState, WorkflowError> {
        let body = AnalyzeRequest::new(cppcheck_data, options);
        tracing::debug!("POST {} for {}:{}", self.endpoint, cppcheck_data.file, cppcheck_data.line);

        let mut request = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&body);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let mut response = request
            .send()
            .await
            .map_err(|e| transport_error(&e, self.timeout))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(WorkflowError::Service { status, body });
        }

        let mut parser = SseParser::new();
        let mut assembler = StateAssembler::new();
        let mut pending: Vec<u8> = Vec::new();

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| transport_error(&e, self.timeout))?
        {
            pending.extend_from_slice(&chunk);
            let valid = match std::str::from_utf8(&pending) {
                Ok(text) => text.len(),
                Err(e) if e.error_len().is_none() => e.valid_up_to(),
                Err(e) => return Err(WorkflowError::Protocol(format!("invalid UTF-8 in stream: {e}"))),
            };
            let text = std::str::from_utf8(&pending[..valid])
                .map_err(|e| WorkflowError::Protocol(e.to_string()))?;
            let events = parser.feed(text);
            pending.drain(..valid);

            for event in &events {
                assembler.push(event)?;
            }
        }

        if !pending.is_empty() {
            return Err(WorkflowError::Protocol("stream ended inside a UTF-8 sequence".to_string()));
        }
        if let Some(event) = parser.flush() {
            assembler.push(&event)?;
        }

        tracing::debug!(
            thread_id = ?assembler.thread_id(),
            finish_reason = ?assembler.finish_reason(),
            "workflow stream finished"
        );
        Ok(assembler.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_url() {
        let wf = HttpWorkflow::new("http://localhost:8000/").unwrap();
        assert_eq!(wf.endpoint(), "http://localhost:8000/api/cppcheck/analyze");
    }

    #[test]
    fn rejects_bad_url() {
        assert!(matches!(
            HttpWorkflow::new("not a url"),
            Err(AgentError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn request_body_shape() {
        let data = CppcheckData {
            file: "a.c".to_string(),
            line: 3,
            severity: "error".to_string(),
            id: "nullPointer".to_string(),
            summary: "Null pointer".to_string(),
        };
        let options = WorkflowOptions {
            enable_background_investigation: false,
            ..WorkflowOptions::default()
        };
        let body = serde_json::to_value(AnalyzeRequest::new(&data, &options)).unwrap();

        assert_eq!(body["cppcheck_data"]["line"], 3);
        assert_eq!(body["thread_id"], "__default__");
        assert_eq!(body["max_plan_iterations"], 1);
        assert_eq!(body["max_step_num"], 3);
        assert_eq!(body["auto_accepted_plan"], true);
        assert_eq!(body["enable_background_investigation"], false);
        assert_eq!(body["debug"], false);
    }
}
