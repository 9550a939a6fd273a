use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use winequal_cli::stages::evaluate::run_evaluation;
use winequal_cli::stages::input::{evaluate_config, preprocess_config, train_config};
use winequal_cli::stages::preprocess::run_preprocessing;
use winequal_cli::stages::train::run_training;

fn config_arg() -> Arg {
    Arg::new("config")
        .help("Path to pipeline JSON configuration file. Defaults are used when omitted.")
        .required(false)
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
}

fn data_arg() -> Arg {
    Arg::new("data")
        .short('d')
        .long("data")
        .value_parser(clap::builder::NonEmptyStringValueParser::new())
        .help(
            "Path to the processed dataset (*.csv or *.tsv). Overrides the processed_data \
             file specified in the configuration file.",
        )
        .value_hint(ValueHint::FilePath)
}

fn models_arg() -> Arg {
    Arg::new("models_dir")
        .short('m')
        .long("models")
        .value_parser(clap::builder::NonEmptyStringValueParser::new())
        .help("Directory holding the model artifacts. Overrides artifacts_dir in the configuration file.")
        .value_hint(ValueHint::DirPath)
}

fn fail_fast_arg() -> Arg {
    Arg::new("fail_fast")
        .long("fail-fast")
        .help("Stop at the first backend failure instead of attempting every backend.")
        .action(ArgAction::SetTrue)
}

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("WINEQUAL_LOG", "error,winequal=info"))
        .init();

    let matches = Command::new("winequal")
        .version(clap::crate_version!())
        .about("\u{1F377} WineQual CLI - train, evaluate and report on wine quality classifiers")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("preprocess")
                .about("Merge the red and white wine tables into the processed dataset")
                .arg(config_arg())
                .arg(
                    Arg::new("red")
                        .long("red")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("Path to the red wine table. Overrides red_wine_data in the configuration file.")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("white")
                        .long("white")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("Path to the white wine table. Overrides white_wine_data in the configuration file.")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output_file")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("File path the processed dataset will be written to.")
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("train")
                .about("Fit the SVM, naive Bayes and neural network backends and store their artifacts")
                .arg(config_arg())
                .arg(data_arg())
                .arg(models_arg())
                .arg(fail_fast_arg()),
        )
        .subcommand(
            Command::new("evaluate")
                .about("Score the stored artifacts and write the Markdown and PDF report")
                .arg(config_arg())
                .arg(data_arg())
                .arg(models_arg())
                .arg(
                    Arg::new("reports_dir")
                        .short('r')
                        .long("reports")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("Directory the report is written to. Figures are read from its figures/ subdirectory.")
                        .value_hint(ValueHint::DirPath),
                )
                .arg(
                    Arg::new("metrics")
                        .long("metrics")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("JSON file of metric records to report instead of evaluating the artifacts.")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("no_report")
                        .long("no-report")
                        .help("Disable report generation.")
                        .action(ArgAction::SetTrue),
                )
                .arg(fail_fast_arg()),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("preprocess", sub_m)) => handle_preprocess(sub_m),
        Some(("train", sub_m)) => handle_train(sub_m),
        Some(("evaluate", sub_m)) => handle_evaluate(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_preprocess(matches: &ArgMatches) -> Result<()> {
    let config = preprocess_config(matches)?;
    match run_preprocessing(&config) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Preprocessing failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let config = train_config(matches)?;
    match run_training(&config) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Training failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_evaluate(matches: &ArgMatches) -> Result<()> {
    let (config, options) = evaluate_config(matches)?;
    match run_evaluation(&config, &options) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Evaluation failed: {:#}", e);
            std::process::exit(1)
        }
    }
}
