//! Stage entry points wiring the feature store, artifact store, trainer,
//! evaluator and report writer together from a `PipelineConfig`.
use std::path::PathBuf;

use crate::config::PipelineConfig;
use crate::data_handling::FeatureStore;
use crate::error::Result;
use crate::evaluator::{EvaluationReport, Evaluator};
use crate::preprocessing::{preprocess, SulfurColumns};
use crate::report::{load_metric_records, ReportContent, ReportStatus, ReportWriter};
use crate::storage::FsArtifactStore;
use crate::trainer::{Trainer, TrainingReport};

/// Merge the raw tables into the processed dataset.
pub fn run_preprocess(config: &PipelineConfig) -> Result<usize> {
    let sulfur = SulfurColumns {
        free: &config.free_sulfur_column,
        total: &config.total_sulfur_column,
    };
    preprocess(
        &config.red_wine_data,
        &config.white_wine_data,
        &config.processed_data,
        &sulfur,
    )
}

/// Fit every backend on the processed dataset and store the artifacts.
pub fn run_train(config: &PipelineConfig) -> Result<TrainingReport> {
    let dataset = FeatureStore::new(&config.processed_data, &config.label_column).load()?;
    dataset.log_input_data_summary();

    let mut store = FsArtifactStore::new(&config.artifacts_dir);
    let (x, y) = dataset.split();
    Trainer::new(&mut store, config.model.clone(), config.failure_policy).train_all(x, y)
}

#[derive(Debug, Clone, Default)]
pub struct EvaluateOptions {
    /// Use metric rows from this JSON file instead of scoring the artifacts.
    pub metrics_file: Option<PathBuf>,
    pub write_report: bool,
}

#[derive(Debug)]
pub struct EvaluationOutcome {
    /// `None` when the metrics came from a file.
    pub evaluation: Option<EvaluationReport>,
    pub report: Option<ReportStatus>,
}

impl EvaluationOutcome {
    /// True when every backend that was asked to evaluate did so.
    pub fn evaluation_succeeded(&self) -> bool {
        self.evaluation.as_ref().map_or(true, |e| e.all_succeeded())
    }
}

/// Score the stored artifacts and, if requested, write the report.
pub fn run_evaluate(config: &PipelineConfig, options: &EvaluateOptions) -> Result<EvaluationOutcome> {
    let dataset = FeatureStore::new(&config.processed_data, &config.label_column).load()?;
    dataset.log_input_data_summary();

    let (evaluation, records) = match &options.metrics_file {
        Some(path) => (None, load_metric_records(path)?),
        None => {
            let store = FsArtifactStore::new(&config.artifacts_dir);
            let (x, y) = dataset.split();
            let evaluation =
                Evaluator::new(&store, config.model.clone(), config.failure_policy).evaluate_all(x, y)?;
            let records = evaluation.metric_records();
            (Some(evaluation), records)
        }
    };

    let report = if options.write_report {
        let content = ReportContent::build(&config.report, &config.figures_dir(), Some(dataset.summary()), records);
        Some(ReportWriter::new(&config.reports_dir, config.report.clone()).publish(&content))
    } else {
        None
    };

    Ok(EvaluationOutcome { evaluation, report })
}
