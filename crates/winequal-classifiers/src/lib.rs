//! winequal-classifiers: train, evaluate and report on wine quality classifiers.
//!
//! Three backends (one-vs-rest SVM, Gaussian naive Bayes and a small
//! feed-forward network) are fit on the same feature matrix, persisted as one
//! artifact each, reloaded and scored together, and summarized in a Markdown
//! and PDF report.
pub mod config;
pub mod data_handling;
pub mod error;
pub mod evaluator;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod report;
pub mod stats;
pub mod storage;
pub mod trainer;

pub use error::{PipelineError, Result};
