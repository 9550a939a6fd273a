use anyhow::{Context, Result};

use winequal_classifiers::config::PipelineConfig;
use winequal_classifiers::pipeline;
use winequal_classifiers::trainer::TrainingReport;

/// One line per backend: slot name, status, artifact location or error.
pub fn format_training_report(report: &TrainingReport) -> String {
    report
        .outcomes
        .iter()
        .map(|(kind, outcome)| match outcome {
            Ok(handle) => format!("{}\tok\t{}", kind, handle.location),
            Err(e) => format!("{}\tfailed\t{}", kind, e),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn run_training(config: &PipelineConfig) -> Result<()> {
    log::info!(
        "[WineQual::Train] data: {}, artifacts: {}",
        config.processed_data.display(),
        config.artifacts_dir.display()
    );
    let report = pipeline::run_train(config).context("Training aborted")?;
    println!("{}", format_training_report(&report));

    let failed: Vec<String> = report.failures().map(|(k, _)| k.to_string()).collect();
    if !failed.is_empty() {
        anyhow::bail!("{} backend(s) failed to train: {}", failed.len(), failed.join(", "));
    }
    Ok(())
}
