//! Reloads stored backends and scores them on a labelled feature matrix.
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::config::{BackendKind, FailurePolicy, ModelConfig};
use crate::error::{PipelineError, Result};
use crate::models::factory::load_model;
use crate::report::MetricRecord;
use crate::stats::{accuracy, macro_f1};
use crate::storage::ArtifactStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendMetrics {
    pub backend: BackendKind,
    pub accuracy: f64,
    pub f1_score: f64,
}

/// Per-backend evaluation outcomes in canonical order.
#[derive(Debug, Default)]
pub struct EvaluationReport {
    pub outcomes: Vec<(BackendKind, Result<BackendMetrics>)>,
}

impl EvaluationReport {
    pub fn get(&self, kind: BackendKind) -> Option<&Result<BackendMetrics>> {
        self.outcomes.iter().find(|(k, _)| *k == kind).map(|(_, r)| r)
    }

    /// Accuracy of every backend that evaluated successfully.
    pub fn accuracies(&self) -> Vec<(BackendKind, f64)> {
        self.outcomes
            .iter()
            .filter_map(|(k, r)| r.as_ref().ok().map(|m| (*k, m.accuracy)))
            .collect()
    }

    /// Report rows for the successful backends.
    pub fn metric_records(&self) -> Vec<MetricRecord> {
        self.outcomes
            .iter()
            .filter_map(|(_, r)| r.as_ref().ok())
            .map(|m| MetricRecord::new(m.backend.display_name(), m.accuracy, m.f1_score))
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = (BackendKind, &PipelineError)> {
        self.outcomes
            .iter()
            .filter_map(|(k, r)| r.as_ref().err().map(|e| (*k, e)))
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures().next().is_none()
    }
}

pub struct Evaluator<'a, S: ArtifactStore> {
    store: &'a S,
    params: ModelConfig,
    policy: FailurePolicy,
    backends: Vec<BackendKind>,
}

impl<'a, S: ArtifactStore> Evaluator<'a, S> {
    pub fn new(store: &'a S, params: ModelConfig, policy: FailurePolicy) -> Self {
        Evaluator {
            store,
            params,
            policy,
            backends: BackendKind::ALL.to_vec(),
        }
    }

    pub fn with_backends(mut self, backends: &[BackendKind]) -> Self {
        let mut backends = backends.to_vec();
        backends.sort();
        backends.dedup();
        self.backends = backends;
        self
    }

    fn evaluate_one(&self, kind: BackendKind, x: &Array2<f64>, y: &[String]) -> Result<BackendMetrics> {
        let artifact = self.store.load(kind)?;
        let model = load_model(&artifact, &self.params)?;
        let predicted = model.predict(x)?;
        if predicted.len() != y.len() {
            return Err(PipelineError::predict(
                kind,
                format!("{} predictions for {} rows", predicted.len(), y.len()),
            ));
        }
        let metrics = BackendMetrics {
            backend: kind,
            accuracy: accuracy(&predicted, y),
            f1_score: macro_f1(&predicted, y),
        };
        log::info!(
            "[{}] accuracy {:.4}, macro F1 {:.4}",
            kind,
            metrics.accuracy,
            metrics.f1_score
        );
        Ok(metrics)
    }

    /// Score every configured backend on `(x, y)`. Rows may be any labelled
    /// sample; each artifact decodes with the classes it was trained on.
    pub fn evaluate_all(&self, x: &Array2<f64>, y: &[String]) -> Result<EvaluationReport> {
        if x.nrows() != y.len() {
            return Err(PipelineError::InvalidInput(format!(
                "{} feature rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }

        let mut report = EvaluationReport::default();
        for &kind in &self.backends {
            let outcome = self.evaluate_one(kind, x, y);
            if let Err(e) = &outcome {
                log::error!("[{}] evaluation failed: {}", kind, e);
            }
            match outcome {
                Err(e) if self.policy == FailurePolicy::FailFast => return Err(e),
                outcome => report.outcomes.push((kind, outcome)),
            }
        }
        Ok(report)
    }
}
