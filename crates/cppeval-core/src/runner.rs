//! Bounded concurrent batch runner
//!
//! Fans a slice of defects out to the dispatcher:
//! - Every task is spawned up front and admitted by a counting semaphore
//! - Results are appended in completion order by this single consumer
//! - A checkpoint is written every `checkpoint_interval` completions, when
//!   the last task completes, and once more after the loop
//!
//! A shutdown future can cut the run short. Tasks that already finished are
//! collected, in-flight tasks are aborted, and the result is checkpointed.

use crate::dispatcher::Dispatcher;
use crate::error::{RangeError, RunError};
use crate::store::ResultSink;
use crate::types::{AnalysisResult, DefectRecord, RunMetadata};
use std::future::Future;
use std::ops::Range;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

/// Completions between two checkpoints
pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 10;

/// Validate a `[start, end)` selection over `len` defects
///
/// `end` defaults to `len`.
///
/// # Errors
/// - `RangeError::Empty` if `len == 0`
/// - `RangeError::InvalidStart` if `start >= len`
/// - `RangeError::InvalidEnd` if `end <= start` or `end > len`
pub fn select_range(len: usize, start: usize, end: Option<usize>) -> Result<Range<usize>, RangeError> {
    if len == 0 {
        return Err(RangeError::Empty);
    }
    if start >= len {
        return Err(RangeError::InvalidStart {
            start,
            max: len - 1,
        });
    }
    let end = end.unwrap_or(len);
    if end <= start || end > len {
        return Err(RangeError::InvalidEnd {
            end,
            min: start + 1,
            max: len,
        });
    }
    Ok(start..end)
}

/// Outcome of a batch run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Metadata of the last checkpoint
    pub metadata: RunMetadata,
    /// Results in completion order
    pub results: Vec<AnalysisResult>,
    /// Tasks that died outside the dispatcher
    pub task_failures: usize,
    /// The run was stopped before every task completed
    pub interrupted: bool,
}

/// Runs a slice of defects through a dispatcher with bounded concurrency
pub struct BatchRunner {
    dispatcher: Dispatcher,
    sink: Arc<dyn ResultSink>,
    max_concurrent: usize,
    checkpoint_interval: usize,
}

impl std::fmt::Debug for BatchRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchRunner")
            .field("dispatcher", &self.dispatcher)
            .field("max_concurrent", &self.max_concurrent)
            .field("checkpoint_interval", &self.checkpoint_interval)
            .finish_non_exhaustive()
    }
}

impl BatchRunner {
    /// Create a runner that dispatches one defect at a time
    #[inline]
    #[must_use]
    pub fn new(dispatcher: Dispatcher, sink: Arc<dyn ResultSink>) -> Self {
        Self {
            dispatcher,
            sink,
            max_concurrent: 1,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
        }
    }

    /// With concurrency cap (values below 1 are raised to 1)
    #[inline]
    #[must_use]
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// With checkpoint interval (values below 1 are raised to 1)
    #[inline]
    #[must_use]
    pub fn with_checkpoint_interval(mut self, interval: usize) -> Self {
        self.checkpoint_interval = interval.max(1);
        self
    }

    #[inline]
    #[must_use]
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Run `defects[start..end]` to completion
    ///
    /// # Errors
    /// Returns `RunError::Range` before any dispatch if the selection is invalid
    pub async fn run(
        &self,
        defects: &[DefectRecord],
        start: usize,
        end: Option<usize>,
    ) -> Result<RunSummary, RunError> {
        self.run_until(defects, start, end, std::future::pending())
            .await
    }

    /// Run `defects[start..end]` until done or until `shutdown` resolves
    ///
    /// # Errors
    /// Returns `RunError::Range` before any dispatch if the selection is invalid
    pub async fn run_until<F>(
        &self,
        defects: &[DefectRecord],
        start: usize,
        end: Option<usize>,
        shutdown: F,
    ) -> Result<RunSummary, RunError>
    where
        F: Future<Output = ()> + Send,
    {
        let range = select_range(defects.len(), start, end)?;
        let selected = &defects[range.clone()];
        let total = selected.len();

        tracing::info!(
            "Processing defects {} to {} ({} defects, max {} concurrent)",
            range.start,
            range.end - 1,
            total,
            self.max_concurrent
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();
        for defect in selected.iter().cloned() {
            let dispatcher = self.dispatcher.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire().await;
                dispatcher.analyze(defect).await
            });
        }

        let mut results = Vec::with_capacity(total);
        let mut completed = 0;
        let mut task_failures = 0;
        let mut interrupted = false;

        tokio::pin!(shutdown);
        loop {
            let joined = tokio::select! {
                biased;
                () = &mut shutdown => {
                    interrupted = true;
                    break;
                }
                next = tasks.join_next() => next,
            };
            let Some(joined) = joined else { break };

            completed += 1;
            collect(joined, &mut results, &mut task_failures);

            tracing::info!(
                "Progress: {}/{} defects completed ({:.1}%)",
                completed,
                total,
                percent(completed, total)
            );

            if completed % self.checkpoint_interval == 0 || completed == total {
                self.checkpoint(&results, completed, total).await;
            }
        }

        if interrupted {
            // tasks that finished before the signal still count
            while let Some(joined) = tasks.try_join_next() {
                completed += 1;
                collect(joined, &mut results, &mut task_failures);
            }
            tracing::warn!(
                "Interrupted after {}/{} defects, aborting {} in-flight tasks",
                completed,
                total,
                tasks.len()
            );
            tasks.shutdown().await;
        }

        let metadata = self.checkpoint(&results, completed, total).await;

        Ok(RunSummary {
            metadata,
            results,
            task_failures,
            interrupted,
        })
    }

    /// Sink writes run on the blocking pool
    async fn checkpoint(&self, results: &[AnalysisResult], completed: usize, total: usize) -> RunMetadata {
        let sink = Arc::clone(&self.sink);
        let snapshot = results.to_vec();
        let saved =
            tokio::task::spawn_blocking(move || sink.save(&snapshot, completed, total)).await;
        match saved {
            Ok(Ok(metadata)) => metadata,
            Ok(Err(e)) => {
                tracing::error!("Error saving results: {}", e);
                RunMetadata::from_results(results, completed, total)
            }
            Err(e) => {
                tracing::error!("Checkpoint write did not finish: {}", e);
                RunMetadata::from_results(results, completed, total)
            }
        }
    }
}

fn collect(
    joined: Result<AnalysisResult, JoinError>,
    results: &mut Vec<AnalysisResult>,
    task_failures: &mut usize,
) {
    match joined {
        Ok(result) => results.push(result),
        Err(e) => {
            *task_failures += 1;
            tracing::error!("Task failed: {}", e);
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
