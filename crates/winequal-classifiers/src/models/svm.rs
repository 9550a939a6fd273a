use linfa::dataset::Pr;
use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use linfa_svm::{Svm, SvmParams};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::config::{BackendKind, SvmConfig};
use crate::error::{PipelineError, Result};
use crate::models::classifier_trait::ClassifierModel;

/// One binary probability model per class, trained class-vs-rest.
#[derive(Serialize, Deserialize)]
struct OneVsRest {
    classes: Vec<String>,
    models: Vec<Svm<f64, Pr>>,
}

/// Multi-class support vector classifier built from linfa-svm binary models.
/// Each class gets a Platt-scaled model; prediction picks the class with the
/// highest probability (first class wins ties).
pub struct SVMClassifier {
    params: SvmConfig,
    model: Option<OneVsRest>,
}

impl SVMClassifier {
    pub fn new(params: SvmConfig) -> Self {
        SVMClassifier { params, model: None }
    }

    /// Restore a fitted classifier from its artifact payload.
    pub fn from_bytes(params: SvmConfig, bytes: &[u8]) -> Result<Self> {
        let model: OneVsRest = serde_json::from_slice(bytes)
            .map_err(|e| PipelineError::invalid_artifact(BackendKind::Svm, e))?;
        if model.classes.len() != model.models.len() || model.classes.is_empty() {
            return Err(PipelineError::invalid_artifact(
                BackendKind::Svm,
                "class list does not match the stored models",
            ));
        }
        Ok(SVMClassifier {
            params,
            model: Some(model),
        })
    }

    pub fn classes(&self) -> Option<&[String]> {
        self.model.as_ref().map(|m| m.classes.as_slice())
    }

    fn svm_params(&self, x: &Array2<f64>) -> Result<SvmParams<f64, Pr>> {
        let (c1, c2) = self.params.c;
        let params = Svm::<f64, Pr>::params()
            .eps(self.params.eps)
            .pos_neg_weights(c1, c2);

        // Chain the kernel configuration based on the kernel type
        let params = match self.params.kernel.as_str() {
            "linear" => params.linear_kernel(),
            "gauss" => {
                let eps = self
                    .params
                    .gaussian_kernel_eps
                    .unwrap_or_else(|| scaled_gaussian_eps(x));
                log::debug!("[svm] gaussian kernel eps = {}", eps);
                params.gaussian_kernel(eps)
            }
            "poly" => params.polynomial_kernel(
                self.params.polynomial_kernel_constant,
                self.params.polynomial_kernel_degree,
            ),
            other => {
                return Err(PipelineError::fit(
                    BackendKind::Svm,
                    format!(
                        "Unsupported kernel type: {}. Valid options are: linear, gauss, poly",
                        other
                    ),
                ))
            }
        };
        Ok(params)
    }
}

/// Kernel width equivalent to `gamma = 1 / (n_features * var(X))`.
fn scaled_gaussian_eps(x: &Array2<f64>) -> f64 {
    let var = x.var(0.0);
    let eps = x.ncols() as f64 * var;
    if eps.is_finite() && eps > 0.0 {
        eps
    } else {
        1.0
    }
}

/// Distinct labels in first-seen order.
fn distinct(y: &[String]) -> Vec<String> {
    let mut classes: Vec<String> = Vec::new();
    for label in y {
        if !classes.contains(label) {
            classes.push(label.clone());
        }
    }
    classes
}

impl ClassifierModel for SVMClassifier {
    fn kind(&self) -> BackendKind {
        BackendKind::Svm
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[String]) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(PipelineError::fit(
                BackendKind::Svm,
                format!("{} rows but {} labels", x.nrows(), y.len()),
            ));
        }
        let classes = distinct(y);
        if classes.len() < 2 {
            return Err(PipelineError::fit(
                BackendKind::Svm,
                "at least two distinct classes are required",
            ));
        }

        let params = self.svm_params(x)?;
        let mut models = Vec::with_capacity(classes.len());
        for class in &classes {
            let targets: Array1<bool> = y.iter().map(|l| l == class).collect();
            let dataset = Dataset::new(x.to_owned(), targets);
            let model = params
                .fit(&dataset)
                .map_err(|e| PipelineError::fit(BackendKind::Svm, format!("class '{}': {}", class, e)))?;
            log::debug!("[svm] class '{}': {} support vectors", class, model.nsupport());
            models.push(model);
        }

        self.model = Some(OneVsRest { classes, models });
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<String>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| PipelineError::predict(BackendKind::Svm, "model has not been fitted"))?;

        let mut best: Vec<(usize, f32)> = vec![(0, f32::NEG_INFINITY); x.nrows()];
        for (class_idx, svm) in model.models.iter().enumerate() {
            let probs: Array1<Pr> = svm.predict(x);
            for (row, p) in probs.iter().enumerate() {
                if **p > best[row].1 {
                    best[row] = (class_idx, **p);
                }
            }
        }

        Ok(best
            .into_iter()
            .map(|(idx, _)| model.classes[idx].clone())
            .collect())
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| PipelineError::fit(BackendKind::Svm, "model has not been fitted"))?;
        serde_json::to_vec(model).map_err(|e| PipelineError::fit(BackendKind::Svm, e))
    }
}
