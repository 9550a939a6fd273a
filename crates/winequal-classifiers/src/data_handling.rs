//! Feature store: loading the prepared wine table and exposing it as a
//! feature matrix plus a label vector.
//!
//! Labels are kept as their raw string values so the margin-based and
//! generative backends can consume them directly. The network backend goes
//! through `LabelEncoder`, which assigns dense indices in first-seen order.
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// A rectangular table split into numeric features and a categorical label.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Every column of the source in file order, label included.
    columns: Vec<String>,
    feature_names: Vec<String>,
    label_column: String,
    features: Array2<f64>,
    labels: Vec<String>,
}

impl Dataset {
    /// Build a dataset from an already split feature matrix and label vector.
    /// The column list is the feature names followed by the label column.
    pub fn new(
        feature_names: Vec<String>,
        features: Array2<f64>,
        label_column: &str,
        labels: Vec<String>,
    ) -> Result<Self> {
        if features.nrows() != labels.len() {
            return Err(PipelineError::InvalidInput(format!(
                "{} feature rows but {} labels",
                features.nrows(),
                labels.len()
            )));
        }
        if features.ncols() != feature_names.len() {
            return Err(PipelineError::InvalidInput(format!(
                "{} feature columns but {} feature names",
                features.ncols(),
                feature_names.len()
            )));
        }
        let mut columns = feature_names.clone();
        columns.push(label_column.to_string());
        Ok(Dataset {
            columns,
            feature_names,
            label_column: label_column.to_string(),
            features,
            labels,
        })
    }

    pub fn nrows(&self) -> usize {
        self.labels.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn label_column(&self) -> &str {
        &self.label_column
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Borrow the (feature-matrix, label-vector) pair.
    pub fn split(&self) -> (&Array2<f64>, &[String]) {
        (&self.features, &self.labels)
    }

    /// Per-class row counts, most frequent first. Ties keep first-seen order.
    pub fn class_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for label in &self.labels {
            match index.get(label.as_str()) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    index.insert(label.as_str(), counts.len());
                    counts.push((label.clone(), 1));
                }
            }
        }
        // stable sort keeps first-seen order among equal counts
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            n_rows: self.nrows(),
            columns: self.columns.clone(),
            label_column: self.label_column.clone(),
            class_counts: self.class_counts(),
        }
    }

    pub fn log_input_data_summary(&self) {
        log::info!(
            "Dataset: {} rows, {} feature columns, {} classes in '{}'",
            self.nrows(),
            self.feature_names.len(),
            self.class_counts().len(),
            self.label_column
        );
    }
}

/// Dataset facts shown in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub n_rows: usize,
    pub columns: Vec<String>,
    pub label_column: String,
    /// Most frequent class first; ties in first-seen order.
    pub class_counts: Vec<(String, usize)>,
}

/// Ordinal encoding of raw labels into `0..K-1`, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEncoder {
    classes: Vec<String>,
    index: HashMap<String, u32>,
}

impl LabelEncoder {
    pub fn fit(labels: &[String]) -> Self {
        let mut classes = Vec::new();
        let mut index = HashMap::new();
        for label in labels {
            if !index.contains_key(label) {
                index.insert(label.clone(), classes.len() as u32);
                classes.push(label.clone());
            }
        }
        LabelEncoder { classes, index }
    }

    /// Rebuild an encoder from a stored class list; index `i` decodes to
    /// `classes[i]`.
    pub fn from_classes(classes: Vec<String>) -> Result<Self> {
        let mut index = HashMap::with_capacity(classes.len());
        for (i, class) in classes.iter().enumerate() {
            if index.insert(class.clone(), i as u32).is_some() {
                return Err(PipelineError::InvalidInput(format!("duplicate class '{}'", class)));
            }
        }
        Ok(LabelEncoder { classes, index })
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn encode(&self, label: &str) -> Option<u32> {
        self.index.get(label).copied()
    }

    /// Encode a label vector. Fails on a label not seen during `fit`.
    pub fn transform(&self, labels: &[String]) -> Result<Vec<u32>> {
        labels
            .iter()
            .map(|l| {
                self.encode(l).ok_or_else(|| {
                    PipelineError::InvalidInput(format!("label '{}' was not seen when fitting the encoder", l))
                })
            })
            .collect()
    }

    pub fn decode(&self, code: u32) -> Option<&str> {
        self.classes.get(code as usize).map(String::as_str)
    }
}

/// Loads one prepared dataset file.
#[derive(Debug, Clone)]
pub struct FeatureStore {
    path: PathBuf,
    label_column: String,
}

impl FeatureStore {
    pub fn new<P: AsRef<Path>>(path: P, label_column: &str) -> Self {
        FeatureStore {
            path: path.as_ref().to_path_buf(),
            label_column: label_column.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the dataset. A `.tsv` extension selects tab delimiting,
    /// anything else is read as comma separated.
    pub fn load(&self) -> Result<Dataset> {
        let file = File::open(&self.path).map_err(|e| PipelineError::data_load(&self.path, e))?;
        let delimiter = delimiter_for(&self.path);
        let dataset = read_dataset(BufReader::new(file), delimiter, &self.label_column, &self.path)?;
        log::debug!("Loaded {} rows from {}", dataset.nrows(), self.path.display());
        Ok(dataset)
    }
}

pub(crate) fn delimiter_for(path: &Path) -> u8 {
    let is_tsv = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("tsv"))
        .unwrap_or(false);
    if is_tsv {
        b'\t'
    } else {
        b','
    }
}

/// Parse a delimited table. `origin` is only used for error messages.
pub fn read_dataset<R: Read>(
    reader: R,
    delimiter: u8,
    label_column: &str,
    origin: &Path,
) -> Result<Dataset> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| PipelineError::data_load(origin, format!("failed to read header row: {}", e)))?
        .clone();

    let label_idx = headers
        .iter()
        .position(|h| h.trim() == label_column)
        .ok_or_else(|| PipelineError::data_load(origin, format!("missing label column '{}'", label_column)))?;

    let feature_names: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != label_idx)
        .map(|(_, h)| h.trim().to_string())
        .collect();

    let mut values = Vec::new();
    let mut labels = Vec::new();

    for (row_idx, result) in rdr.records().enumerate() {
        // header is line 1
        let line = row_idx + 2;
        let record = result.map_err(|e| PipelineError::data_load(origin, format!("line {}: {}", line, e)))?;

        for (col_idx, cell) in record.iter().enumerate() {
            if col_idx == label_idx {
                labels.push(cell.trim().to_string());
                continue;
            }
            let value = cell.trim().parse::<f64>().map_err(|_| {
                PipelineError::data_load(
                    origin,
                    format!("line {}: column '{}' is not numeric: '{}'", line, &headers[col_idx], cell),
                )
            })?;
            values.push(value);
        }
    }

    if labels.is_empty() {
        return Err(PipelineError::data_load(origin, "dataset has no rows"));
    }

    let features = Array2::from_shape_vec((labels.len(), feature_names.len()), values)
        .map_err(|e| PipelineError::data_load(origin, e))?;

    let mut dataset = Dataset::new(feature_names, features, label_column, labels)?;
    dataset.columns = headers.iter().map(|h| h.trim().to_string()).collect();
    Ok(dataset)
}
