//! `cppeval batch`: run the analysis workflow over a defect table

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use cppeval_agent::HttpWorkflow;
use cppeval_core::{
    BatchRunner, DefectParser, Dispatcher, EvalConfig, JsonResultStore, RunSummary,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub(crate) const DEFAULT_OUTPUT: &str = "evaluation_results.json";

pub(crate) fn command() -> Command {
    Command::new("batch")
        .about("Analyze a CppCheck defect table with the agent workflow")
        .arg(
            Arg::new("csv_file")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("CSV file containing CppCheck defect reports"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .default_value(DEFAULT_OUTPUT)
                .value_parser(value_parser!(PathBuf))
                .help("Output file for analysis results"),
        )
        .arg(
            Arg::new("start-index")
                .long("start-index")
                .default_value("0")
                .value_parser(value_parser!(usize))
                .help("Index to start processing from (0-based)"),
        )
        .arg(
            Arg::new("end-index")
                .long("end-index")
                .value_parser(value_parser!(usize))
                .conflicts_with("count")
                .help("Index to stop processing at (exclusive, default: process all)"),
        )
        .arg(
            Arg::new("count")
                .long("count")
                .value_parser(value_parser!(usize))
                .help("Number of defects to process from the start index"),
        )
        .arg(
            Arg::new("max-concurrent")
                .long("max-concurrent")
                .value_parser(value_parser!(usize))
                .help("Maximum number of concurrent analyses (default: 1)"),
        )
        .arg(
            Arg::new("max-plan-iterations")
                .long("max-plan-iterations")
                .alias("max_plan_iterations")
                .value_parser(value_parser!(u32))
                .help("Maximum number of plan iterations (default: 1)"),
        )
        .arg(
            Arg::new("max-step-num")
                .long("max-step-num")
                .alias("max_step_num")
                .value_parser(value_parser!(u32))
                .help("Maximum number of steps in a plan (default: 3)"),
        )
        .arg(
            Arg::new("no-background-investigation")
                .long("no-background-investigation")
                .action(ArgAction::SetTrue)
                .help("Disable background investigation before planning"),
        )
        .arg(
            Arg::new("agent-url")
                .long("agent-url")
                .help("Base URL of the agent service"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_parser(value_parser!(u64))
                .help("Per-defect timeout in seconds"),
        )
        .arg(
            Arg::new("checkpoint-interval")
                .long("checkpoint-interval")
                .value_parser(value_parser!(usize))
                .help("Completions between checkpoint writes (default: 10)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file; flags override its values"),
        )
        .arg(
            Arg::new("no-log-file")
                .long("no-log-file")
                .action(ArgAction::SetTrue)
                .help("Do not write an evaluation_<timestamp>.log file"),
        )
}

/// Configuration file (or defaults) with command line overrides applied
pub(crate) fn resolve_config(args: &ArgMatches) -> anyhow::Result<EvalConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => EvalConfig::from_toml_file(path)?,
        None => EvalConfig::new(),
    };

    if let Some(&max) = args.get_one::<usize>("max-concurrent") {
        config = config.with_max_concurrent(max);
    }
    if let Some(&interval) = args.get_one::<usize>("checkpoint-interval") {
        config = config.with_checkpoint_interval(interval);
    }
    if let Some(&secs) = args.get_one::<u64>("timeout") {
        config = config.with_analysis_timeout_secs(Some(secs));
    }
    if let Some(url) = args.get_one::<String>("agent-url") {
        config = config.with_agent_url(url.as_str());
    }
    if let Some(&iterations) = args.get_one::<u32>("max-plan-iterations") {
        config.workflow.max_plan_iterations = iterations;
    }
    if let Some(&steps) = args.get_one::<u32>("max-step-num") {
        config.workflow.max_step_num = steps;
    }
    if args.get_flag("debug") {
        config.workflow.debug = true;
    }
    if args.get_flag("no-background-investigation") {
        config.workflow.enable_background_investigation = false;
    }

    config.validate()?;
    Ok(config)
}

/// `(start, end)` selection; `--count` is relative to `--start-index`
pub(crate) fn resolve_range(args: &ArgMatches) -> anyhow::Result<(usize, Option<usize>)> {
    let start = args.get_one::<usize>("start-index").copied().unwrap_or(0);
    if let Some(&end) = args.get_one::<usize>("end-index") {
        return Ok((start, Some(end)));
    }
    let end = match args.get_one::<usize>("count") {
        Some(&count) => Some(start.checked_add(count).with_context(|| {
            format!("--start-index {start} plus --count {count} is out of range")
        })?),
        None => None,
    };
    Ok((start, end))
}

/// Returns `false` when the run was interrupted
pub(crate) async fn run(args: &ArgMatches) -> anyhow::Result<bool> {
    let csv_file = args
        .get_one::<PathBuf>("csv_file")
        .context("missing CSV file argument")?;
    let output = args
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
    let config = resolve_config(args)?;
    let (start, end) = resolve_range(args)?;

    tracing::info!("Parsing CSV file: {}", csv_file.display());
    let defects = DefectParser::new().parse_path(csv_file)?;

    let workflow = HttpWorkflow::new(&config.agent_url)?;
    tracing::info!("Using agent service at {}", workflow.endpoint());

    let dispatcher = Dispatcher::new(Arc::new(workflow))
        .with_options(config.workflow)
        .with_timeout(config.analysis_timeout());
    let runner = BatchRunner::new(dispatcher, Arc::new(JsonResultStore::new(&output)))
        .with_max_concurrent(config.max_concurrent)
        .with_checkpoint_interval(config.checkpoint_interval);

    tracing::info!("Starting batch analysis...");
    let summary = runner
        .run_until(&defects, start, end, shutdown_signal())
        .await?;

    println!("{}", render_summary(&summary, &output));

    if summary.interrupted {
        tracing::info!("Batch evaluation interrupted by user");
        Ok(false)
    } else {
        tracing::info!("Batch evaluation completed successfully!");
        Ok(true)
    }
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

pub(crate) fn render_summary(summary: &RunSummary, output: &Path) -> String {
    let meta = &summary.metadata;
    let mut text = String::new();
    text.push_str(&format!("{}\n", "=".repeat(50)));
    text.push_str("BATCH EVALUATION SUMMARY\n");
    text.push_str(&format!("{}\n", "=".repeat(50)));
    text.push_str(&format!("  Total Defects: {}\n", meta.total_defects));
    text.push_str(&format!("  Completed: {}\n", meta.completed_defects));
    text.push_str(&format!("  Successful: {}\n", meta.success_count));
    text.push_str(&format!("  Failed: {}\n", meta.error_count));
    if summary.task_failures > 0 {
        text.push_str(&format!("  Task Failures: {}\n", summary.task_failures));
    }
    if summary.interrupted {
        text.push_str("  Status: interrupted\n");
    }
    text.push_str(&format!("  Results: {}", output.display()));
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use cppeval_core::RunMetadata;
    use std::io::Write;

    fn matches(argv: &[&str]) -> ArgMatches {
        let cmd = crate::cli();
        let all = cmd
            .try_get_matches_from(std::iter::once("cppeval").chain(argv.iter().copied()))
            .unwrap();
        all.subcommand_matches("batch").unwrap().clone()
    }

    #[test]
    fn defaults() {
        let args = matches(&["batch", "defects.csv"]);
        assert_eq!(args.get_one::<PathBuf>("output").unwrap(), &PathBuf::from(DEFAULT_OUTPUT));
        assert_eq!(resolve_range(&args).unwrap(), (0, None));

        let config = resolve_config(&args).unwrap();
        assert_eq!(config.max_concurrent, 1);
        assert_eq!(config.checkpoint_interval, 10);
        assert!(config.workflow.enable_background_investigation);
        assert!(!config.workflow.debug);
    }

    #[test]
    fn count_is_relative_to_start() {
        let args = matches(&["batch", "d.csv", "--start-index", "5", "--count", "3"]);
        assert_eq!(resolve_range(&args).unwrap(), (5, Some(8)));

        let args = matches(&["batch", "d.csv", "--end-index", "7"]);
        assert_eq!(resolve_range(&args).unwrap(), (0, Some(7)));
    }

    #[test]
    fn oversized_count_is_an_error() {
        let count = usize::MAX.to_string();
        let args = matches(&["batch", "d.csv", "--start-index", "1", "--count", &count]);
        let err = resolve_range(&args).unwrap_err();
        assert!(err.to_string().contains("out of range"));

        let args = matches(&["batch", "d.csv", "--count", &count]);
        assert_eq!(resolve_range(&args).unwrap(), (0, Some(usize::MAX)));
    }

    #[test]
    fn count_conflicts_with_end_index() {
        let result = crate::cli().try_get_matches_from([
            "cppeval", "batch", "d.csv", "--end-index", "4", "--count", "2",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "max_concurrent = 4\ncheckpoint_interval = 5\nagent_url = \"http://agent:9000\"\n\n[workflow]\nmax_step_num = 7"
        )
        .unwrap();
        let path = file.path().to_str().unwrap();

        let args = matches(&[
            "batch",
            "d.csv",
            "--config",
            path,
            "--max-concurrent",
            "2",
            "--no-background-investigation",
            "--debug",
        ]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.max_concurrent, 2);
        assert_eq!(config.checkpoint_interval, 5);
        assert_eq!(config.agent_url, "http://agent:9000");
        assert_eq!(config.workflow.max_step_num, 7);
        assert!(!config.workflow.enable_background_investigation);
        assert!(config.workflow.debug);
    }

    #[test]
    fn zero_concurrency_rejected() {
        let args = matches(&["batch", "d.csv", "--max-concurrent", "0"]);
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn summary_mentions_interrupt() {
        let summary = RunSummary {
            metadata: RunMetadata {
                total_defects: 4,
                completed_defects: 2,
                success_count: 1,
                error_count: 1,
                ..RunMetadata::default()
            },
            results: Vec::new(),
            task_failures: 0,
            interrupted: true,
        };
        let text = render_summary(&summary, Path::new("out.json"));
        assert!(text.contains("  Completed: 2\n"));
        assert!(text.contains("  Status: interrupted\n"));
        assert!(text.ends_with("  Results: out.json"));
        assert!(!text.contains("Task Failures"));
    }
}
