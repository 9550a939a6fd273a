use crate::config::{BackendKind, ModelConfig};
use crate::data_handling::LabelEncoder;
use crate::error::Result;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::naive_bayes::NaiveBayesClassifier;
use crate::models::network::NetworkClassifier;
use crate::models::svm::SVMClassifier;
use crate::storage::Artifact;

/// Build an unfitted boxed classifier for `kind`.
///
/// `encoder` is only consumed by the network backend; the others work on the
/// raw labels.
pub fn build_model(kind: BackendKind, params: &ModelConfig, encoder: &LabelEncoder) -> Box<dyn ClassifierModel> {
    match kind {
        BackendKind::Svm => Box::new(SVMClassifier::new(params.svm.clone())),
        BackendKind::NaiveBayes => Box::new(NaiveBayesClassifier::new()),
        BackendKind::Network => Box::new(NetworkClassifier::new(params.network.clone(), encoder.clone())),
    }
}

/// Reconstruct a fitted classifier from a stored artifact. Every payload
/// carries its own class labels.
pub fn load_model(artifact: &Artifact, params: &ModelConfig) -> Result<Box<dyn ClassifierModel>> {
    let model: Box<dyn ClassifierModel> = match artifact.kind {
        BackendKind::Svm => Box::new(SVMClassifier::from_bytes(params.svm.clone(), &artifact.payload)?),
        BackendKind::NaiveBayes => Box::new(NaiveBayesClassifier::from_bytes(&artifact.payload)?),
        BackendKind::Network => Box::new(NetworkClassifier::from_bytes(params.network.clone(), &artifact.payload)?),
    };
    Ok(model)
}
