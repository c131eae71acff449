//! Testing utilities for cppeval workspace
//!
//! Shared test helpers, fixtures, and scripted collaborators.

#![allow(missing_docs)]

use cppeval_core::{
    AnalysisResult, AnalysisWorkflow, CppcheckData, DefectRecord, ResultSink, RunMetadata,
    StoreError, WorkflowError, WorkflowMessage, WorkflowOptions, WorkflowState,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::ThreadId;
use std::time::Duration;

/// What the stub does for one defect
#[derive(Debug, Clone)]
pub enum StubReply {
    /// Final message with this text
    Text(String),
    /// Final state with no messages
    Empty,
    /// Workflow error
    Fail(WorkflowError),
    /// Panic inside the workflow call
    Panic,
}

impl StubReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Report text ending in a fenced JSON summary
    pub fn with_summary(json: &str) -> Self {
        Self::Text(format!("Analysis complete.\n\n```json\n{json}\n```\n"))
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail(WorkflowError::Other(message.into()))
    }
}

type Script = dyn Fn(&CppcheckData) -> StubReply + Send + Sync;

/// Scripted workflow that records calls and peak concurrency
pub struct StubWorkflow {
    script: Box<Script>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    seen: Mutex<Vec<(CppcheckData, WorkflowOptions)>>,
}

impl StubWorkflow {
    /// Same reply for every defect
    pub fn replying(reply: StubReply) -> Self {
        Self::scripted(move |_| reply.clone())
    }

    /// Reply chosen per defect
    pub fn scripted(script: impl Fn(&CppcheckData) -> StubReply + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Sleep this long inside every call
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls that were running at once
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<(CppcheckData, WorkflowOptions)> {
        self.seen.lock().clone()
    }
}

#[async_trait::async_trait]
impl AnalysisWorkflow for StubWorkflow {
    async fn run_analysis(
        &self,
        cppcheck_data: &CppcheckData,
        options: &WorkflowOptions,
    ) -> Result<WorkflowState, WorkflowError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push((cppcheck_data.clone(), *options));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match (self.script)(cppcheck_data) {
            StubReply::Text(text) => Ok(WorkflowState::new(vec![
                WorkflowMessage::assistant(text).with_agent("reporter"),
            ])),
            StubReply::Empty => Ok(WorkflowState::default()),
            StubReply::Fail(err) => Err(err),
            StubReply::Panic => panic!("scripted workflow panic for {}", cppcheck_data.id),
        }
    }
}

/// Sink that keeps every checkpoint in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    snapshots: Mutex<Vec<(RunMetadata, Vec<AnalysisResult>)>>,
    threads: Mutex<Vec<ThreadId>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Sink whose every write fails
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    /// Number of write attempts
    pub fn writes(&self) -> usize {
        self.snapshots.lock().len()
    }

    /// Thread each write ran on
    pub fn threads(&self) -> Vec<ThreadId> {
        self.threads.lock().clone()
    }

    /// Metadata of every write attempt, in order
    pub fn metadata(&self) -> Vec<RunMetadata> {
        self.snapshots.lock().iter().map(|(m, _)| m.clone()).collect()
    }

    /// Results of the last write
    pub fn last_results(&self) -> Vec<AnalysisResult> {
        self.snapshots
            .lock()
            .last()
            .map(|(_, r)| r.clone())
            .unwrap_or_default()
    }
}

impl ResultSink for RecordingSink {
    fn save(
        &self,
        results: &[AnalysisResult],
        completed: usize,
        total: usize,
    ) -> Result<RunMetadata, StoreError> {
        let metadata = RunMetadata::from_results(results, completed, total);
        self.threads.lock().push(std::thread::current().id());
        self.snapshots
            .lock()
            .push((metadata.clone(), results.to_vec()));
        if self.fail {
            return Err(StoreError::io_error(
                "/unwritable/results.json",
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            ));
        }
        Ok(metadata)
    }
}

/// `n` valid defects with row numbers 2..n+2 and lines 1..=n
pub fn defects(n: usize) -> Vec<DefectRecord> {
    (0..n)
        .map(|i| {
            let line = u32::try_from(i + 1).unwrap_or(u32::MAX);
            DefectRecord::new(
                i + 2,
                format!("src/file_{i}.c"),
                line,
                if i % 2 == 0 { "error" } else { "style" },
                format!("check{i}"),
                format!("Defect number {i}"),
            )
        })
        .collect()
}

/// Small defect table with one row of each kind the parser must skip
pub const SAMPLE_CSV: &str = "\
File,Line,Severity,Id,Summary,Category,Ours,Baseline
src/main.c,12,error,nullPointer,Null pointer dereference: p,bug,bug,bug
src/util.c,40,style,unusedVariable,Unused variable: tmp,style,style,bug
src/io.c,,warning,resourceLeak,Resource leak: fp,,,
src/io.c,abc,warning,resourceLeak,Resource leak: fp,,,
src/net.c,7,warning,uninitvar,Uninitialized variable: n,bug,false_positive,bug
";

/// Build a CSV with the required header from `(file, line, severity, id, summary)` rows
pub fn csv_from_rows(rows: &[(&str, &str, &str, &str, &str)]) -> String {
    let mut out = String::from("File,Line,Severity,Id,Summary\n");
    for (file, line, severity, id, summary) in rows {
        out.push_str(&format!("{file},{line},{severity},{id},{summary}\n"));
    }
    out
}
