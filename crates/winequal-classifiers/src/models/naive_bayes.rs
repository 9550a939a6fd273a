use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use linfa_bayes::GaussianNb;
use ndarray::{Array1, Array2};

use crate::config::BackendKind;
use crate::error::{PipelineError, Result};
use crate::models::classifier_trait::ClassifierModel;

/// Gaussian naive Bayes over the raw string labels.
#[derive(Default)]
pub struct NaiveBayesClassifier {
    model: Option<GaussianNb<f64, String>>,
}

impl NaiveBayesClassifier {
    pub fn new() -> Self {
        NaiveBayesClassifier { model: None }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let model: GaussianNb<f64, String> = serde_json::from_slice(bytes)
            .map_err(|e| PipelineError::invalid_artifact(BackendKind::NaiveBayes, e))?;
        Ok(NaiveBayesClassifier { model: Some(model) })
    }
}

impl ClassifierModel for NaiveBayesClassifier {
    fn kind(&self) -> BackendKind {
        BackendKind::NaiveBayes
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[String]) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(PipelineError::fit(
                BackendKind::NaiveBayes,
                format!("{} rows but {} labels", x.nrows(), y.len()),
            ));
        }
        let targets = Array1::from_vec(y.to_vec());
        let dataset = Dataset::new(x.to_owned(), targets);
        let model = GaussianNb::<f64, String>::params()
            .fit(&dataset)
            .map_err(|e| PipelineError::fit(BackendKind::NaiveBayes, e))?;
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<String>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| PipelineError::predict(BackendKind::NaiveBayes, "model has not been fitted"))?;
        let predicted: Array1<String> = model.predict(x);
        Ok(predicted.to_vec())
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| PipelineError::fit(BackendKind::NaiveBayes, "model has not been fitted"))?;
        serde_json::to_vec(model).map_err(|e| PipelineError::fit(BackendKind::NaiveBayes, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_three_gaussian_blobs() {
        let x = Array2::from_shape_vec(
            (9, 2),
            vec![
                0.0, 0.0, 0.2, 0.1, 0.1, 0.3, //
                5.0, 5.0, 5.2, 4.9, 4.8, 5.1, //
                -5.0, 5.0, -5.1, 4.8, -4.9, 5.2,
            ],
        )
        .unwrap();
        let y: Vec<String> = ["5", "5", "5", "6", "6", "6", "7", "7", "7"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut nb = NaiveBayesClassifier::new();
        nb.fit(&x, &y).unwrap();
        assert_eq!(nb.predict(&x).unwrap(), y);

        let restored = NaiveBayesClassifier::from_bytes(&nb.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.predict(&x).unwrap(), y);
    }

    #[test]
    fn unfitted_model_cannot_be_serialized() {
        assert!(NaiveBayesClassifier::new().to_bytes().is_err());
    }
}
