//! `cppeval` command line
//!
//! - `batch`: run the agent workflow over a CppCheck defect table
//! - `analyze`: summarize a results file written by `batch`
//! - `score`: classification metrics over a labeled table

mod analyze;
mod batch;
mod logging;
mod score;

use clap::{Arg, ArgAction, Command};

pub(crate) fn cli() -> Command {
    Command::new("cppeval")
        .version(cppeval_core::VERSION)
        .about("Batch evaluation of CppCheck defect reports with an LLM analysis workflow")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("debug")
                .long("debug")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug logging (and workflow debug mode for batch)"),
        )
        .subcommand(batch::command())
        .subcommand(analyze::command())
        .subcommand(score::command())
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();
    let debug = matches.get_flag("debug");

    let log_file = match matches.subcommand() {
        Some(("batch", args)) if !args.get_flag("no-log-file") => Some(logging::log_file_name()),
        _ => None,
    };
    if let Err(e) = logging::init(debug, log_file) {
        eprintln!("Warning: {e:#}");
        // the file could not be created; keep console logging
        let _ = logging::init(debug, None);
    }

    let (name, outcome) = match matches.subcommand() {
        Some(("batch", args)) => ("Batch evaluation", batch::run(args).await),
        Some(("analyze", args)) => ("Analysis", analyze::run(args)),
        Some(("score", args)) => ("Evaluation", score::run(args)),
        _ => ("cppeval", Ok(false)),
    };

    match outcome {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            tracing::error!("{} failed: {:#}", name, e);
            std::process::exit(1);
        }
    }
}
