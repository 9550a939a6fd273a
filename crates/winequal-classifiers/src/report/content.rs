use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{BackendKind, ReportConfig};
use crate::data_handling::DatasetSummary;

/// One row of the model performance table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub model_name: String,
    pub accuracy: f64,
    #[serde(default)]
    pub f1_score: f64,
}

impl MetricRecord {
    pub fn new(model_name: &str, accuracy: f64, f1_score: f64) -> Self {
        MetricRecord {
            model_name: model_name.to_string(),
            accuracy,
            f1_score,
        }
    }

    /// The backend this row belongs to, if the name is a known one.
    pub fn backend(&self) -> Option<BackendKind> {
        self.model_name.parse().ok()
    }

    /// Table cells: name, accuracy and F1 with two decimals.
    pub fn cells(&self) -> [String; 3] {
        [
            self.model_name.clone(),
            format!("{:.2}", self.accuracy),
            format!("{:.2}", self.f1_score),
        ]
    }
}

pub const METRIC_HEADERS: [&str; 3] = ["Model", "Accuracy", "F1"];

/// Sort records into canonical backend order. Unknown names keep their
/// relative order after the known backends.
pub fn canonical_order(mut records: Vec<MetricRecord>) -> Vec<MetricRecord> {
    records.sort_by_key(|r| r.backend().map(|b| b.rank()).unwrap_or(BackendKind::ALL.len()));
    records
}

/// A figure the report refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FigureRef {
    pub file_name: String,
    /// Path relative to the Markdown file, e.g. `figures/roc_curves.png`.
    pub relative_path: String,
    /// Where the PDF renderer looks for the image.
    pub path: PathBuf,
}

impl FigureRef {
    pub fn new(figures_subdir: &str, figures_dir: &Path, file_name: &str) -> Self {
        FigureRef {
            file_name: file_name.to_string(),
            relative_path: format!("{}/{}", figures_subdir, file_name),
            path: figures_dir.join(file_name),
        }
    }

    /// `confusion_matrices.png` becomes `Confusion Matrices`.
    pub fn caption(&self) -> String {
        let stem = Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.file_name);
        stem.split(|c| c == '_' || c == '-')
            .filter(|w| !w.is_empty())
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Everything both report renderings are built from.
#[derive(Debug, Clone)]
pub struct ReportContent {
    pub title: String,
    pub introduction: String,
    pub summary: Option<DatasetSummary>,
    pub metrics: Vec<MetricRecord>,
    pub figures: Vec<FigureRef>,
    pub figures_dir: PathBuf,
}

impl ReportContent {
    pub fn build(
        config: &ReportConfig,
        figures_dir: &Path,
        summary: Option<DatasetSummary>,
        metrics: Vec<MetricRecord>,
    ) -> Self {
        let figures = config
            .figures
            .iter()
            .map(|name| FigureRef::new(&config.figures_subdir, figures_dir, name))
            .collect();
        ReportContent {
            title: config.title.clone(),
            introduction: config.introduction.clone(),
            summary,
            metrics: canonical_order(metrics),
            figures,
            figures_dir: figures_dir.to_path_buf(),
        }
    }

    /// Bullet lines of the dataset summary as `(depth, text)`, where depth 1
    /// lines nest under the class distribution. Empty without a summary.
    pub fn summary_lines(&self) -> Vec<(usize, String)> {
        let Some(summary) = &self.summary else {
            return Vec::new();
        };
        let mut lines = vec![
            (0, format!("Total samples: {}", summary.n_rows)),
            (0, format!("Features: {}", summary.columns.join(", "))),
            (0, "Class distribution:".to_string()),
        ];
        lines.extend(
            summary
                .class_counts
                .iter()
                .map(|(class, count)| (1, format!("{}: {}", class, count))),
        );
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_sort_canonically_with_unknown_last() {
        let records = vec![
            MetricRecord::new("custom", 0.1, 0.1),
            MetricRecord::new("DNN", 0.8, 0.7),
            MetricRecord::new("SVM", 0.9, 0.9),
            MetricRecord::new("other", 0.2, 0.2),
            MetricRecord::new("NB", 0.6, 0.5),
        ];
        let names: Vec<_> = canonical_order(records).into_iter().map(|r| r.model_name).collect();
        assert_eq!(names, vec!["SVM", "NB", "DNN", "custom", "other"]);
    }

    #[test]
    fn cells_use_two_decimals() {
        let r = MetricRecord::new("SVM", 0.78456, 1.0);
        assert_eq!(r.cells(), ["SVM".to_string(), "0.78".to_string(), "1.00".to_string()]);
    }

    #[test]
    fn captions_come_from_file_names() {
        let fig = FigureRef::new("figures", Path::new("reports/figures"), "confusion_matrices.png");
        assert_eq!(fig.caption(), "Confusion Matrices");
        assert_eq!(fig.relative_path, "figures/confusion_matrices.png");
        assert_eq!(fig.path, Path::new("reports/figures/confusion_matrices.png"));
    }

    #[test]
    fn summary_lines_nest_class_counts() {
        let summary = DatasetSummary {
            n_rows: 3,
            columns: vec!["a".to_string(), "quality".to_string()],
            label_column: "quality".to_string(),
            class_counts: vec![("5".to_string(), 2), ("6".to_string(), 1)],
        };
        let mut content = ReportContent::build(&ReportConfig::default(), Path::new("figures"), Some(summary), vec![]);
        assert_eq!(
            content.summary_lines(),
            vec![
                (0, "Total samples: 3".to_string()),
                (0, "Features: a, quality".to_string()),
                (0, "Class distribution:".to_string()),
                (1, "5: 2".to_string()),
                (1, "6: 1".to_string()),
            ]
        );
        content.summary = None;
        assert!(content.summary_lines().is_empty());
    }

    #[test]
    fn missing_f1_defaults_to_zero() {
        let r: MetricRecord = serde_json::from_str(r#"{"model_name":"NB","accuracy":0.5}"#).unwrap();
        assert_eq!(r.f1_score, 0.0);
    }
}
