//! `cppeval score`: compare a labeled table's truth column against predictions

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use cppeval_metrics::{
    detailed_report, summary_report, write_processed_csv, write_text, Comparison, LabeledTable,
    Preset, TableError, DEFAULT_TARGET_COLUMN,
};
use std::path::PathBuf;

pub(crate) fn command() -> Command {
    Command::new("score")
        .about("Score a prediction column against CppCheck severity or human category")
        .arg(
            Arg::new("csv_file")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Labeled CSV file"),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .default_value("severity")
                .value_parser(value_parser!(Preset))
                .help("Truth column: severity (warning/error fold into bug) or category"),
        )
        .arg(
            Arg::new("target")
                .long("target")
                .default_value(DEFAULT_TARGET_COLUMN)
                .help("Column holding the predictions (e.g. Ours, Baseline)"),
        )
        .arg(
            Arg::new("keep-false-positives")
                .long("keep-false-positives")
                .action(ArgAction::SetTrue)
                .help("Score rows whose target is false_positive instead of dropping them"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_parser(value_parser!(PathBuf))
                .help("Output file to save detailed results"),
        )
        .arg(
            Arg::new("csv-output")
                .long("csv-output")
                .value_parser(value_parser!(PathBuf))
                .help("Save processed data with mapped categories to CSV file"),
        )
}

pub(crate) fn comparison(args: &ArgMatches) -> Comparison {
    let preset = args
        .get_one::<Preset>("mode")
        .copied()
        .unwrap_or(Preset::Severity);
    let mut comparison = Comparison::for_preset(preset);
    if let Some(target) = args.get_one::<String>("target") {
        comparison = comparison.with_target(target.as_str());
    }
    if args.get_flag("keep-false-positives") {
        comparison = comparison.with_drop_false_positives(false);
    }
    comparison
}

/// Returns `false` when nothing was left to score
pub(crate) fn run(args: &ArgMatches) -> anyhow::Result<bool> {
    let csv_file = args
        .get_one::<PathBuf>("csv_file")
        .context("missing CSV file argument")?;
    let comparison = comparison(args);

    println!("Loading data from: {}", csv_file.display());
    let table = LabeledTable::load(csv_file)?;

    let eval = match comparison.evaluate(&table) {
        Ok(eval) => eval,
        Err(TableError::NoRows { filtered }) => {
            tracing::error!(
                "No valid records found after filtering ({} marked false_positive)",
                filtered
            );
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    };

    println!(
        "{} value distribution before filtering:",
        comparison.target_column
    );
    for (value, count) in eval.target_before.iter() {
        println!("  '{value}': {count}");
    }
    if comparison.drop_false_positives {
        println!(
            "\nFiltered out {} records marked as 'false_positive' in {}.",
            eval.false_positives, comparison.target_column
        );
    }

    println!("\n{}", detailed_report(&eval));

    if let Some(output) = args.get_one::<PathBuf>("output") {
        write_text(output, &summary_report(&eval))?;
        println!("\nDetailed results saved to: {}", output.display());
    }
    if let Some(csv_output) = args.get_one::<PathBuf>("csv-output") {
        write_processed_csv(&eval, &table, csv_output)?;
        println!("Processed data saved to: {}", csv_output.display());
    }
    Ok(true)
}
