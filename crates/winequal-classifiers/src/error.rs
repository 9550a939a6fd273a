use std::path::PathBuf;

use thiserror::Error;

use crate::config::BackendKind;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Which report sink a render failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportSink {
    Markdown,
    Pdf,
}

impl std::fmt::Display for ReportSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportSink::Markdown => write!(f, "markdown"),
            ReportSink::Pdf => write!(f, "pdf"),
        }
    }
}

/// Errors raised by the preprocessing, training, evaluation and report stages.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to load dataset {}: {reason}", path.display())]
    DataLoad { path: PathBuf, reason: String },

    #[error("no trained artifact for backend '{backend}' at {location}")]
    ArtifactNotFound {
        backend: BackendKind,
        location: String,
    },

    #[error("artifact for backend '{backend}' is unusable: {reason}")]
    InvalidArtifact { backend: BackendKind, reason: String },

    #[error("failed to persist artifact for backend '{backend}'")]
    ArtifactWrite {
        backend: BackendKind,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fit backend '{backend}': {reason}")]
    Fit { backend: BackendKind, reason: String },

    #[error("backend '{backend}' failed to predict: {reason}")]
    Predict { backend: BackendKind, reason: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to render {sink} report: {reason}")]
    Render { sink: ReportSink, reason: String },
}

impl PipelineError {
    pub(crate) fn data_load(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        PipelineError::DataLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn fit(backend: BackendKind, reason: impl std::fmt::Display) -> Self {
        PipelineError::Fit {
            backend,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn predict(backend: BackendKind, reason: impl std::fmt::Display) -> Self {
        PipelineError::Predict {
            backend,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invalid_artifact(backend: BackendKind, reason: impl std::fmt::Display) -> Self {
        PipelineError::InvalidArtifact {
            backend,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn render(sink: ReportSink, reason: impl std::fmt::Display) -> Self {
        PipelineError::Render {
            sink,
            reason: reason.to_string(),
        }
    }

    /// The backend this error is attributed to, if any.
    pub fn backend(&self) -> Option<BackendKind> {
        match self {
            PipelineError::ArtifactNotFound { backend, .. }
            | PipelineError::InvalidArtifact { backend, .. }
            | PipelineError::ArtifactWrite { backend, .. }
            | PipelineError::Fit { backend, .. }
            | PipelineError::Predict { backend, .. } => Some(*backend),
            _ => None,
        }
    }
}
