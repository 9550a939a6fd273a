use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The three classifier backends. Declaration order is the canonical
/// order used for training, evaluation and report tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    #[serde(rename = "svm")]
    Svm,
    #[serde(rename = "nb")]
    NaiveBayes,
    #[serde(rename = "dnn")]
    Network,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [BackendKind::Svm, BackendKind::NaiveBayes, BackendKind::Network];

    /// Slot name used for artifacts and CLI output.
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Svm => "svm",
            BackendKind::NaiveBayes => "nb",
            BackendKind::Network => "dnn",
        }
    }

    /// Label used in report tables.
    pub fn display_name(&self) -> &'static str {
        match self {
            BackendKind::Svm => "SVM",
            BackendKind::NaiveBayes => "NB",
            BackendKind::Network => "DNN",
        }
    }

    pub fn artifact_file_name(&self) -> &'static str {
        match self {
            BackendKind::Svm => "svm_model.json",
            BackendKind::NaiveBayes => "nb_model.json",
            BackendKind::Network => "dnn_model.safetensors",
        }
    }

    /// Position in the canonical order.
    pub fn rank(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "svm" => Ok(BackendKind::Svm),
            "nb" | "naive_bayes" | "naive bayes" | "gaussian_nb" => Ok(BackendKind::NaiveBayes),
            "dnn" | "nn" | "network" => Ok(BackendKind::Network),
            _ => Err(format!(
                "Unknown backend: {}. Valid options are: svm, nb, dnn",
                s
            )),
        }
    }
}

/// What to do when one backend fails to train or evaluate.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Attempt every backend and report each outcome on its own.
    #[default]
    Isolate,
    /// Abort the stage on the first backend failure.
    FailFast,
}

/// Hyper-parameters for the one-vs-rest support vector backend.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct SvmConfig {
    pub eps: f64,
    pub c: (f64, f64),
    /// One of `linear`, `gauss`, `poly`.
    pub kernel: String,
    /// Gaussian kernel width. `None` derives it from the data as
    /// `n_features * var(X)`.
    pub gaussian_kernel_eps: Option<f64>,
    pub polynomial_kernel_constant: f64,
    pub polynomial_kernel_degree: f64,
}

impl Default for SvmConfig {
    fn default() -> Self {
        Self {
            eps: 0.1,
            c: (1.0, 1.0),
            kernel: "gauss".to_string(),
            gaussian_kernel_eps: None,
            polynomial_kernel_constant: 1.0,
            polynomial_kernel_degree: 3.0,
        }
    }
}

/// Training schedule for the feed-forward backend. The layer widths are
/// fixed (64, 32, number of classes) and not configurable.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct NetworkConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Seed for the per-epoch batch shuffle.
    pub seed: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            batch_size: 32,
            learning_rate: 1e-3,
            seed: 42,
        }
    }
}

/// Central configuration for all backends.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ModelConfig {
    pub svm: SvmConfig,
    pub network: NetworkConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct ReportConfig {
    pub title: String,
    pub introduction: String,
    pub markdown_file: String,
    pub pdf_file: String,
    /// Sub-directory of the reports directory holding figure images.
    pub figures_subdir: String,
    /// Expected figure file names, in document order.
    pub figures: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "Wine Quality Classification Report".to_string(),
            introduction: "This report summarizes the wine quality classification project results."
                .to_string(),
            markdown_file: "final_report.md".to_string(),
            pdf_file: "final_report.pdf".to_string(),
            figures_subdir: "figures".to_string(),
            figures: vec![
                "confusion_matrices.png".to_string(),
                "roc_curves.png".to_string(),
                "training_history.png".to_string(),
            ],
        }
    }
}

/// Top-level configuration shared by the `preprocess`, `train` and
/// `evaluate` stages.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct PipelineConfig {
    pub red_wine_data: PathBuf,
    pub white_wine_data: PathBuf,
    pub processed_data: PathBuf,
    pub label_column: String,
    pub free_sulfur_column: String,
    pub total_sulfur_column: String,
    pub artifacts_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub failure_policy: FailurePolicy,
    pub model: ModelConfig,
    pub report: ReportConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            red_wine_data: PathBuf::from("data/winequality-red.csv"),
            white_wine_data: PathBuf::from("data/winequality-white.csv"),
            processed_data: PathBuf::from("data/processed_data.csv"),
            label_column: "quality".to_string(),
            free_sulfur_column: "free sulfur dioxide".to_string(),
            total_sulfur_column: "total sulfur dioxide".to_string(),
            artifacts_dir: PathBuf::from("models"),
            reports_dir: PathBuf::from("reports"),
            failure_policy: FailurePolicy::default(),
            model: ModelConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file. Missing fields take their
    /// default values.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        use anyhow::Context;

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
        let config: PipelineConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
        Ok(config)
    }

    pub fn figures_dir(&self) -> PathBuf {
        self.reports_dir.join(&self.report.figures_subdir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_order_is_canonical() {
        let mut kinds = vec![BackendKind::Network, BackendKind::Svm, BackendKind::NaiveBayes];
        kinds.sort();
        assert_eq!(kinds, BackendKind::ALL.to_vec());
        assert_eq!(BackendKind::Network.rank(), 2);
    }

    #[test]
    fn backend_parses_names_and_aliases() {
        assert_eq!("SVM".parse::<BackendKind>().unwrap(), BackendKind::Svm);
        assert_eq!("nb".parse::<BackendKind>().unwrap(), BackendKind::NaiveBayes);
        assert_eq!("Naive Bayes".parse::<BackendKind>().unwrap(), BackendKind::NaiveBayes);
        assert_eq!("DNN".parse::<BackendKind>().unwrap(), BackendKind::Network);
        assert!("forest".parse::<BackendKind>().is_err());
    }

    #[test]
    fn partial_json_config_keeps_defaults() {
        let json = r#"{ "artifacts_dir": "out/models", "failure_policy": "fail_fast",
                        "model": { "network": { "epochs": 50 } } }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.artifacts_dir, PathBuf::from("out/models"));
        assert_eq!(config.failure_policy, FailurePolicy::FailFast);
        assert_eq!(config.model.network.epochs, 50);
        assert_eq!(config.model.network.batch_size, 32);
        assert_eq!(config.label_column, "quality");
        assert_eq!(config.model.svm.kernel, "gauss");
    }

    #[test]
    fn backend_serializes_as_slot_name() {
        let json = serde_json::to_string(&BackendKind::Network).unwrap();
        assert_eq!(json, "\"dnn\"");
    }
}
