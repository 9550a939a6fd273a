//! Fits every backend on one feature matrix and stores the results.
use ndarray::Array2;

use crate::config::{BackendKind, FailurePolicy, ModelConfig};
use crate::data_handling::LabelEncoder;
use crate::error::{PipelineError, Result};
use crate::models::factory::build_model;
use crate::storage::{Artifact, ArtifactHandle, ArtifactStore};

/// Per-backend training outcomes in canonical order.
#[derive(Debug, Default)]
pub struct TrainingReport {
    pub outcomes: Vec<(BackendKind, Result<ArtifactHandle>)>,
}

impl TrainingReport {
    pub fn get(&self, kind: BackendKind) -> Option<&Result<ArtifactHandle>> {
        self.outcomes.iter().find(|(k, _)| *k == kind).map(|(_, r)| r)
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &ArtifactHandle> {
        self.outcomes.iter().filter_map(|(_, r)| r.as_ref().ok())
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

pub struct Trainer<'a, S: ArtifactStore> {
    store: &'a mut S,
    params: ModelConfig,
    policy: FailurePolicy,
    backends: Vec<BackendKind>,
}

impl<'a, S: ArtifactStore> Trainer<'a, S> {
    pub fn new(store: &'a mut S, params: ModelConfig, policy: FailurePolicy) -> Self {
        Trainer {
            store,
            params,
            policy,
            backends: BackendKind::ALL.to_vec(),
        }
    }

    /// Restrict training to a subset of backends. They still run in
    /// canonical order.
    pub fn with_backends(mut self, backends: &[BackendKind]) -> Self {
        let mut backends = backends.to_vec();
        backends.sort();
        backends.dedup();
        self.backends = backends;
        self
    }

    fn train_one(&mut self, kind: BackendKind, x: &Array2<f64>, y: &[String], encoder: &LabelEncoder) -> Result<ArtifactHandle> {
        let mut model = build_model(kind, &self.params, encoder);
        log::info!("[{}] fitting {} on {} rows", kind, model.name(), x.nrows());
        model.fit(x, y)?;
        let payload = model.to_bytes()?;
        let handle = self.store.save(&Artifact::new(kind, payload))?;
        log::info!("[{}] saved artifact to {} ({} bytes)", kind, handle.location, handle.size);
        Ok(handle)
    }

    /// Fit and store every configured backend.
    ///
    /// Shape errors in the input are returned directly. Backend failures are
    /// recorded in the report; under `FailFast` the first one is returned as
    /// the error instead.
    pub fn train_all(&mut self, x: &Array2<f64>, y: &[String]) -> Result<TrainingReport> {
        if x.nrows() != y.len() {
            return Err(PipelineError::InvalidInput(format!(
                "{} feature rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if x.nrows() == 0 {
            return Err(PipelineError::InvalidInput("no training rows".to_string()));
        }

        let encoder = LabelEncoder::fit(y);
        log::info!(
            "Training {} backend(s) on {} rows x {} features, {} classes",
            self.backends.len(),
            x.nrows(),
            x.ncols(),
            encoder.n_classes()
        );

        let mut report = TrainingReport::default();
        for kind in self.backends.clone() {
            let outcome = self.train_one(kind, x, y, &encoder);
            if let Err(e) = &outcome {
                log::error!("[{}] training failed: {}", kind, e);
            }
            match outcome {
                Err(e) if self.policy == FailurePolicy::FailFast => return Err(e),
                outcome => report.outcomes.push((kind, outcome)),
            }
        }
        Ok(report)
    }
}
