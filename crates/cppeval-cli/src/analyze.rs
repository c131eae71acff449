//! `cppeval analyze`: statistics over a results file

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use cppeval_core::JsonResultStore;
use cppeval_metrics::{write_csv_summary, write_text, RunAnalysis};
use std::path::PathBuf;

pub(crate) fn command() -> Command {
    Command::new("analyze")
        .about("Analyze batch evaluation results")
        .arg(
            Arg::new("results_file")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("JSON file containing evaluation results"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_parser(value_parser!(PathBuf))
                .help("Output file for the analysis report"),
        )
        .arg(
            Arg::new("csv")
                .long("csv")
                .value_parser(value_parser!(PathBuf))
                .help("Export CSV summary to specified file"),
        )
        .arg(
            Arg::new("json-details")
                .long("json-details")
                .action(ArgAction::SetTrue)
                .help("Show detailed JSON summary analysis"),
        )
}

pub(crate) fn run(args: &ArgMatches) -> anyhow::Result<bool> {
    let results_file = args
        .get_one::<PathBuf>("results_file")
        .context("missing results file argument")?;

    println!("Loading results from: {}", results_file.display());
    let doc = JsonResultStore::load(results_file)?;
    let analysis = RunAnalysis::analyze(&doc);

    let report = analysis.render_report();
    println!("\n{report}");

    if let Some(output) = args.get_one::<PathBuf>("output") {
        write_text(output, &report)?;
        println!("Report saved to: {}", output.display());
    }

    if args.get_flag("json-details") {
        let details = analysis.render_json_details();
        if !details.is_empty() {
            println!("\n{details}");
        }
    }

    if let Some(csv) = args.get_one::<PathBuf>("csv") {
        println!("\nExporting CSV summary...");
        write_csv_summary(&doc, csv)?;
        println!("CSV summary exported to: {}", csv.display());
    }

    println!("\nAnalysis completed successfully!");
    Ok(true)
}
