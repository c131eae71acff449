//! End-to-end batch runs against scripted workflows

use cppeval_core::prelude::*;
use cppeval_core::{RangeError, ResultStatus, RunError, WorkflowError};
use cppeval_test_utils::{defects, RecordingSink, StubReply, StubWorkflow, SAMPLE_CSV};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

fn runner(workflow: Arc<StubWorkflow>, sink: Arc<RecordingSink>, concurrency: usize) -> BatchRunner {
    BatchRunner::new(Dispatcher::new(workflow), sink).with_max_concurrent(concurrency)
}

#[tokio::test]
async fn twenty_five_defects_checkpoint_four_times() {
    let workflow = Arc::new(StubWorkflow::replying(StubReply::with_summary(r#"{"is_bug": true}"#)));
    let sink = RecordingSink::new();

    let summary = runner(workflow.clone(), sink.clone(), 5)
        .run(&defects(25), 0, None)
        .await
        .unwrap();

    let completed: Vec<usize> = sink.metadata().iter().map(|m| m.completed_defects).collect();
    assert_eq!(completed, vec![10, 20, 25, 25]);
    assert_eq!(workflow.calls(), 25);
    assert_eq!(summary.metadata.success_count, 25);
    assert_eq!(summary.metadata.total_defects, 25);
    assert!(!summary.interrupted);
    assert!(summary.results.iter().all(|r| r.json_summary().is_some()));
}

#[tokio::test]
async fn dispatch_errors_stay_inside_results() {
    let workflow = Arc::new(StubWorkflow::scripted(|data| {
        if data.line % 3 == 0 {
            StubReply::Fail(WorkflowError::Transport("connection reset".to_string()))
        } else {
            StubReply::text("no summary here")
        }
    }));
    let sink = RecordingSink::new();

    let summary = runner(workflow, sink, 4).run(&defects(9), 0, None).await.unwrap();

    assert_eq!(summary.metadata.completed_defects, 9);
    assert_eq!(summary.metadata.error_count, 3);
    assert_eq!(summary.metadata.success_count, 6);
    for result in &summary.results {
        if result.defect.line % 3 == 0 {
            assert_eq!(result.status(), ResultStatus::Error);
            assert_eq!(result.error_message(), Some("network error: connection reset"));
        } else {
            assert_eq!(result.status(), ResultStatus::Success);
            assert!(result.json_summary().is_none());
        }
    }
}

#[tokio::test]
async fn panicking_task_is_counted_without_result() {
    let workflow = Arc::new(StubWorkflow::scripted(|data| {
        if data.id == "check2" {
            StubReply::Panic
        } else {
            StubReply::Empty
        }
    }));
    let sink = RecordingSink::new();

    let summary = runner(workflow, sink.clone(), 2).run(&defects(5), 0, None).await.unwrap();

    assert_eq!(summary.task_failures, 1);
    assert_eq!(summary.results.len(), 4);
    assert_eq!(summary.metadata.completed_defects, 5);
    assert_eq!(summary.metadata.success_count, 4);
    assert_eq!(summary.metadata.error_count, 0);
    assert_eq!(sink.writes(), 2);
}

#[tokio::test]
async fn single_defect_range() {
    let workflow = Arc::new(StubWorkflow::replying(StubReply::text("ok")));
    let sink = RecordingSink::new();
    let all = defects(5);

    let summary = runner(workflow.clone(), sink.clone(), 3)
        .run(&all, 3, Some(4))
        .await
        .unwrap();

    assert_eq!(workflow.calls(), 1);
    assert_eq!(workflow.seen()[0].0, all[3].cppcheck_data());
    assert_eq!(summary.metadata.total_defects, 1);
    assert_eq!(sink.writes(), 2);
    assert_eq!(sink.last_results()[0].defect.row_number, all[3].row_number);
}

#[tokio::test]
async fn end_past_len_rejected_before_dispatch() {
    let workflow = Arc::new(StubWorkflow::replying(StubReply::text("ok")));
    let sink = RecordingSink::new();

    let err = runner(workflow.clone(), sink.clone(), 1)
        .run(&defects(5), 1, Some(6))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RunError::Range(RangeError::InvalidEnd { end: 6, min: 2, max: 5 })
    ));
    assert_eq!(workflow.calls(), 0);
    assert_eq!(sink.writes(), 0);
}

#[tokio::test]
async fn empty_input_rejected() {
    let workflow = Arc::new(StubWorkflow::replying(StubReply::text("ok")));
    let err = runner(workflow, RecordingSink::new(), 1)
        .run(&[], 0, None)
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::Range(RangeError::Empty)));
}

#[tokio::test(start_paused = true)]
async fn concurrency_cap_is_respected() {
    let workflow = Arc::new(
        StubWorkflow::replying(StubReply::text("ok")).with_delay(Duration::from_secs(1)),
    );

    runner(workflow.clone(), RecordingSink::new(), 3)
        .run(&defects(10), 0, None)
        .await
        .unwrap();

    assert_eq!(workflow.peak_concurrency(), 3);
}

#[tokio::test(start_paused = true)]
async fn zero_concurrency_runs_sequentially() {
    let workflow = Arc::new(
        StubWorkflow::replying(StubReply::text("ok")).with_delay(Duration::from_secs(1)),
    );

    let summary = runner(workflow.clone(), RecordingSink::new(), 0)
        .run(&defects(4), 0, None)
        .await
        .unwrap();

    assert_eq!(workflow.peak_concurrency(), 1);
    assert_eq!(summary.metadata.completed_defects, 4);
}

#[tokio::test(start_paused = true)]
async fn interrupt_writes_final_checkpoint() {
    let workflow = Arc::new(
        StubWorkflow::replying(StubReply::text("ok")).with_delay(Duration::from_secs(10)),
    );
    let sink = RecordingSink::new();

    let summary = runner(workflow, sink.clone(), 1)
        .run_until(
            &defects(3),
            0,
            None,
            tokio::time::sleep(Duration::from_millis(15_500)),
        )
        .await
        .unwrap();

    assert!(summary.interrupted);
    assert_eq!(summary.results.len(), 1);
    assert_eq!(sink.writes(), 1);
    let last = sink.metadata().pop().unwrap();
    assert_eq!(last.completed_defects, 1);
    assert_eq!(last.total_defects, 3);
}

#[tokio::test]
async fn interrupt_keeps_tasks_that_already_finished() {
    let workflow = Arc::new(StubWorkflow::replying(StubReply::text("ok")));
    let sink = RecordingSink::new();

    let watched = workflow.clone();
    let all_called = async move {
        while watched.calls() < 3 {
            tokio::task::yield_now().await;
        }
    };

    let summary = runner(workflow, sink.clone(), 3)
        .run_until(&defects(3), 0, None, all_called)
        .await
        .unwrap();

    assert!(summary.interrupted);
    assert_eq!(summary.results.len(), 3);
    assert_eq!(summary.metadata.completed_defects, 3);
    assert_eq!(sink.last_results().len(), 3);
}

#[tokio::test]
async fn checkpoints_are_written_off_the_runtime_thread() {
    let workflow = Arc::new(StubWorkflow::replying(StubReply::text("ok")));
    let sink = RecordingSink::new();

    runner(workflow, sink.clone(), 2).run(&defects(12), 0, None).await.unwrap();

    let runtime_thread = std::thread::current().id();
    let threads = sink.threads();
    assert_eq!(threads.len(), 3);
    assert!(threads.iter().all(|id| *id != runtime_thread));
}

#[tokio::test]
async fn checkpoint_failures_do_not_stop_the_run() {
    let workflow = Arc::new(StubWorkflow::replying(StubReply::text("ok")));
    let sink = RecordingSink::failing();

    let summary = runner(workflow, sink.clone(), 2).run(&defects(12), 0, None).await.unwrap();

    assert_eq!(summary.metadata.completed_defects, 12);
    assert_eq!(summary.metadata.success_count, 12);
    assert_eq!(sink.writes(), 3);
}

#[tokio::test]
async fn csv_to_results_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("runs/evaluation_results.json");

    let defects = DefectParser::new().parse_reader(SAMPLE_CSV.as_bytes()).unwrap();
    assert_eq!(defects.iter().map(|d| d.row_number).collect::<Vec<_>>(), vec![2, 3, 6]);

    let workflow = Arc::new(StubWorkflow::scripted(|data| {
        if data.id == "uninitvar" {
            StubReply::fail("Analysis failed")
        } else {
            StubReply::with_summary(r#"{"verdict": "bug"}"#)
        }
    }));
    let store = Arc::new(JsonResultStore::new(&out));
    BatchRunner::new(Dispatcher::new(workflow), store)
        .with_max_concurrent(2)
        .run(&defects, 0, None)
        .await
        .unwrap();

    let doc = JsonResultStore::load(&out).unwrap();
    assert_eq!(doc.metadata.total_defects, 3);
    assert_eq!(doc.metadata.completed_defects, 3);
    assert_eq!(doc.metadata.success_count, 2);
    assert_eq!(doc.metadata.error_count, 1);
    assert!(doc.metadata.timestamp.is_some());

    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    let failed = raw["results"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["status"] == "error")
        .unwrap();
    assert_eq!(failed["error"], "Analysis failed");
    assert!(failed["analysis_content"].is_null());
    assert!(failed["json_summary"].is_null());
    assert_eq!(failed["defect"]["ours"], "false_positive");
}
