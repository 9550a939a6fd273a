use anyhow::Result;
use clap::ArgMatches;
use std::path::PathBuf;

use winequal_classifiers::config::{FailurePolicy, PipelineConfig};
use winequal_classifiers::pipeline::EvaluateOptions;

use crate::util::{validate_json_file, validate_tsv_or_csv_file};

/// Load the JSON config given on the command line, or the defaults.
pub fn load_config(matches: &ArgMatches) -> Result<PipelineConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(config_path) => {
            log::info!("[WineQual] Using config: {:?}", config_path);
            PipelineConfig::from_json_file(config_path)
        }
        None => {
            let config = PipelineConfig::default();
            log::info!("[WineQual] No config file provided; using defaults.");
            log::debug!(
                "[WineQual] Default config:\n{}",
                serde_json::to_string_pretty(&config).unwrap_or_default()
            );
            Ok(config)
        }
    }
}

fn path_override(matches: &ArgMatches, id: &str) -> Option<PathBuf> {
    matches.get_one::<String>(id).map(PathBuf::from)
}

fn data_override(matches: &ArgMatches, config: &mut PipelineConfig) -> Result<()> {
    if let Some(data) = matches.get_one::<String>("data") {
        validate_tsv_or_csv_file(data)?;
        config.processed_data = PathBuf::from(data);
    } else {
        validate_tsv_or_csv_file(&config.processed_data.to_string_lossy())?;
    }
    Ok(())
}

fn policy_override(matches: &ArgMatches, config: &mut PipelineConfig) {
    if matches.get_flag("fail_fast") {
        config.failure_policy = FailurePolicy::FailFast;
    }
}

pub fn preprocess_config(matches: &ArgMatches) -> Result<PipelineConfig> {
    let mut config = load_config(matches)?;

    // Apply CLI overrides
    if let Some(red) = matches.get_one::<String>("red") {
        validate_tsv_or_csv_file(red)?;
        config.red_wine_data = PathBuf::from(red);
    }
    if let Some(white) = matches.get_one::<String>("white") {
        validate_tsv_or_csv_file(white)?;
        config.white_wine_data = PathBuf::from(white);
    }
    if let Some(output) = path_override(matches, "output_file") {
        config.processed_data = output;
    }
    Ok(config)
}

pub fn train_config(matches: &ArgMatches) -> Result<PipelineConfig> {
    let mut config = load_config(matches)?;

    data_override(matches, &mut config)?;
    if let Some(models) = path_override(matches, "models_dir") {
        config.artifacts_dir = models;
    }
    policy_override(matches, &mut config);
    Ok(config)
}

pub fn evaluate_config(matches: &ArgMatches) -> Result<(PipelineConfig, EvaluateOptions)> {
    let mut config = load_config(matches)?;

    data_override(matches, &mut config)?;
    if let Some(models) = path_override(matches, "models_dir") {
        config.artifacts_dir = models;
    }
    if let Some(reports) = path_override(matches, "reports_dir") {
        config.reports_dir = reports;
    }
    policy_override(matches, &mut config);

    let metrics_file = match matches.get_one::<String>("metrics") {
        Some(metrics) => {
            validate_json_file(metrics)?;
            Some(PathBuf::from(metrics))
        }
        None => None,
    };
    let options = EvaluateOptions {
        metrics_file,
        write_report: !matches.get_flag("no_report"),
    };
    Ok((config, options))
}
