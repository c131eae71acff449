//! Analysis dispatcher
//!
//! Sends one defect through the external workflow and turns whatever comes
//! back into an [`AnalysisResult`]:
//! - Workflow failures and timeouts become `Error` results
//! - A missing or broken JSON block still yields `Success` without a summary
//!
//! `analyze` never fails, so one defect cannot take down a batch.

use crate::error::WorkflowError;
use crate::extract::extract_json_summary;
use crate::types::{AnalysisResult, DefectRecord};
use crate::workflow::{AnalysisWorkflow, WorkflowOptions};
use std::sync::Arc;
use std::time::Duration;

/// Per-defect dispatcher bound to one workflow handle
#[derive(Clone)]
pub struct Dispatcher {
    workflow: Arc<dyn AnalysisWorkflow>,
    options: WorkflowOptions,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("options", &self.options)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Create a dispatcher with default workflow options
    #[inline]
    #[must_use]
    pub fn new(workflow: Arc<dyn AnalysisWorkflow>) -> Self {
        Self {
            workflow,
            options: WorkflowOptions::default(),
            timeout: None,
        }
    }

    /// With workflow options
    #[inline]
    #[must_use]
    pub fn with_options(mut self, options: WorkflowOptions) -> Self {
        self.options = options;
        self
    }

    /// With an upper bound on each workflow call
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Options forwarded to the workflow
    #[inline]
    #[must_use]
    pub fn options(&self) -> &WorkflowOptions {
        &self.options
    }

    /// Analyse one defect
    pub async fn analyze(&self, defect: DefectRecord) -> AnalysisResult {
        tracing::info!("Analyzing defect: {}", defect);

        let cppcheck_data = defect.cppcheck_data();
        let call = self.workflow.run_analysis(&cppcheck_data, &self.options);

        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(res) => res,
                Err(_) => Err(WorkflowError::Timeout {
                    duration_secs: limit.as_secs(),
                }),
            },
            None => call.await,
        };

        match outcome {
            Ok(state) => {
                let content = state.final_content().to_string();
                let json_summary = if content.is_empty() {
                    None
                } else {
                    match extract_json_summary(&content) {
                        Ok(value) => Some(value),
                        Err(e) => {
                            tracing::warn!(
                                "Could not extract JSON summary for defect {}: {}",
                                defect.row_number,
                                e
                            );
                            None
                        }
                    }
                };
                tracing::info!("Successfully analyzed defect at row {}", defect.row_number);
                AnalysisResult::success(defect, content, json_summary)
            }
            Err(e) => {
                tracing::error!("Error analyzing defect at row {}: {}", defect.row_number, e);
                tracing::debug!(error = ?e, defect = ?defect, "workflow failure details");
                AnalysisResult::error(defect, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnalysisOutcome, CppcheckData};
    use crate::workflow::{WorkflowMessage, WorkflowState};
    use parking_lot::Mutex;

    struct Fixed(Result<WorkflowState, WorkflowError>);

    #[async_trait::async_trait]
    impl AnalysisWorkflow for Fixed {
        async fn run_analysis(
            &self,
            _data: &CppcheckData,
            _options: &WorkflowOptions,
        ) -> Result<WorkflowState, WorkflowError> {
            self.0.clone()
        }
    }

    struct Recording(Mutex<Vec<(CppcheckData, WorkflowOptions)>>);

    #[async_trait::async_trait]
    impl AnalysisWorkflow for Recording {
        async fn run_analysis(
            &self,
            data: &CppcheckData,
            options: &WorkflowOptions,
        ) -> Result<WorkflowState, WorkflowError> {
            self.0.lock().push((data.clone(), *options));
            Ok(WorkflowState::default())
        }
    }

    struct Slow;

    #[async_trait::async_trait]
    impl AnalysisWorkflow for Slow {
        async fn run_analysis(
            &self,
            _data: &CppcheckData,
            _options: &WorkflowOptions,
        ) -> Result<WorkflowState, WorkflowError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(WorkflowState::default())
        }
    }

    fn defect() -> DefectRecord {
        DefectRecord::new(7, "src/x.c", 42, "error", "nullPointer", "Null pointer")
    }

    fn reply(text: &str) -> Fixed {
        Fixed(Ok(WorkflowState::new(vec![WorkflowMessage::assistant(text)])))
    }

    #[tokio::test]
    async fn success_with_summary() {
        let dispatcher = Dispatcher::new(Arc::new(reply(
            "analysis\n```json\n{\"is_bug\": true}\n```",
        )));
        let result = dispatcher.analyze(defect()).await;

        assert!(result.is_success());
        assert_eq!(result.json_summary().unwrap()["is_bug"], true);
        assert_eq!(result.defect.row_number, 7);
    }

    #[tokio::test]
    async fn success_without_summary() {
        let dispatcher = Dispatcher::new(Arc::new(reply("plain prose")));
        let result = dispatcher.analyze(defect()).await;

        match result.outcome {
            AnalysisOutcome::Success {
                analysis_content,
                json_summary,
            } => {
                assert_eq!(analysis_content, "plain prose");
                assert!(json_summary.is_none());
            }
            AnalysisOutcome::Error { .. } => panic!("expected success"),
        }
    }

    #[tokio::test]
    async fn empty_state_is_success_with_empty_content() {
        let dispatcher = Dispatcher::new(Arc::new(Fixed(Ok(WorkflowState::default()))));
        let result = dispatcher.analyze(defect()).await;
        assert!(result.is_success());
        assert!(result.json_summary().is_none());
    }

    #[tokio::test]
    async fn workflow_error_becomes_error_result() {
        let dispatcher = Dispatcher::new(Arc::new(Fixed(Err(WorkflowError::Transport(
            "connection refused".to_string(),
        )))));
        let result = dispatcher.analyze(defect()).await;

        assert!(!result.is_success());
        assert_eq!(result.error_message(), Some("network error: connection refused"));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_becomes_error_result() {
        let dispatcher =
            Dispatcher::new(Arc::new(Slow)).with_timeout(Some(Duration::from_secs(5)));
        let result = dispatcher.analyze(defect()).await;

        assert_eq!(result.error_message(), Some("analysis timeout after 5s"));
    }

    #[tokio::test]
    async fn forwards_required_fields_and_options() {
        let workflow = Arc::new(Recording(Mutex::new(Vec::new())));
        let options = WorkflowOptions {
            debug: true,
            max_plan_iterations: 2,
            max_step_num: 5,
            enable_background_investigation: false,
        };
        let dispatcher = Dispatcher::new(workflow.clone()).with_options(options);
        dispatcher.analyze(defect()).await;

        let calls = workflow.0.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, defect().cppcheck_data());
        assert_eq!(calls[0].1, options);
    }
}
