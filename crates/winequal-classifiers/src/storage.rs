//! Named artifact storage: one slot per backend.
//!
//! The trainer writes a slot, the evaluator reads it. Slots are overwritten
//! on every training run; there is no versioning.
use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::config::BackendKind;
use crate::error::{PipelineError, Result};

/// A serialized model plus the backend it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: BackendKind,
    pub payload: Vec<u8>,
}

impl Artifact {
    pub fn new(kind: BackendKind, payload: Vec<u8>) -> Self {
        Artifact { kind, payload }
    }
}

/// Where a saved artifact ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactHandle {
    pub kind: BackendKind,
    pub location: String,
    pub size: usize,
}

pub trait ArtifactStore {
    /// Store `artifact` in its backend's slot, replacing any previous one.
    fn save(&mut self, artifact: &Artifact) -> Result<ArtifactHandle>;

    /// Fetch the artifact in `kind`'s slot. A missing slot is
    /// `PipelineError::ArtifactNotFound`.
    fn load(&self, kind: BackendKind) -> Result<Artifact>;

    /// Human readable location of `kind`'s slot.
    fn location(&self, kind: BackendKind) -> String;
}

/// Artifacts as files under a root directory.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        FsArtifactStore {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, kind: BackendKind) -> PathBuf {
        self.root.join(kind.artifact_file_name())
    }
}

impl ArtifactStore for FsArtifactStore {
    fn save(&mut self, artifact: &Artifact) -> Result<ArtifactHandle> {
        let kind = artifact.kind;
        let write_err = |source: std::io::Error| PipelineError::ArtifactWrite { backend: kind, source };

        std::fs::create_dir_all(&self.root).map_err(write_err)?;

        // Write next to the target so the final rename stays on one filesystem.
        let mut tmp = NamedTempFile::new_in(&self.root).map_err(write_err)?;
        tmp.write_all(&artifact.payload).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;

        let path = self.path_for(kind);
        tmp.persist(&path).map_err(|e| write_err(e.error))?;

        log::debug!("[{}] wrote {} bytes to {}", kind, artifact.payload.len(), path.display());
        Ok(ArtifactHandle {
            kind,
            location: path.display().to_string(),
            size: artifact.payload.len(),
        })
    }

    fn load(&self, kind: BackendKind) -> Result<Artifact> {
        let path = self.path_for(kind);
        let payload = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PipelineError::ArtifactNotFound {
                    backend: kind,
                    location: path.display().to_string(),
                })
            }
            Err(e) => return Err(PipelineError::invalid_artifact(kind, e)),
        };
        if payload.is_empty() {
            return Err(PipelineError::invalid_artifact(
                kind,
                format!("{} is empty", path.display()),
            ));
        }
        Ok(Artifact { kind, payload })
    }

    fn location(&self, kind: BackendKind) -> String {
        self.path_for(kind).display().to_string()
    }
}

/// Artifacts held in memory. Useful for tests and single-process runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryArtifactStore {
    slots: BTreeMap<BackendKind, Vec<u8>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, kind: BackendKind) -> bool {
        self.slots.contains_key(&kind)
    }

    pub fn remove(&mut self, kind: BackendKind) -> Option<Artifact> {
        self.slots.remove(&kind).map(|payload| Artifact { kind, payload })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn save(&mut self, artifact: &Artifact) -> Result<ArtifactHandle> {
        self.slots.insert(artifact.kind, artifact.payload.clone());
        Ok(ArtifactHandle {
            kind: artifact.kind,
            location: self.location(artifact.kind),
            size: artifact.payload.len(),
        })
    }

    fn load(&self, kind: BackendKind) -> Result<Artifact> {
        self.slots
            .get(&kind)
            .map(|payload| Artifact {
                kind,
                payload: payload.clone(),
            })
            .ok_or_else(|| PipelineError::ArtifactNotFound {
                backend: kind,
                location: self.location(kind),
            })
    }

    fn location(&self, kind: BackendKind) -> String {
        format!("memory://{}", kind.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_store_round_trips_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FsArtifactStore::new(dir.path().join("models"));

        let handle = store.save(&Artifact::new(BackendKind::Svm, b"first".to_vec())).unwrap();
        assert!(handle.location.ends_with("svm_model.json"));
        assert_eq!(handle.size, 5);

        store.save(&Artifact::new(BackendKind::Svm, b"second".to_vec())).unwrap();
        assert_eq!(store.load(BackendKind::Svm).unwrap().payload, b"second");

        // only the slot file remains, no temp files
        let entries: Vec<_> = std::fs::read_dir(store.root()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn fs_store_missing_slot_names_backend() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        let err = store.load(BackendKind::Network).unwrap_err();
        match err {
            PipelineError::ArtifactNotFound { backend, location } => {
                assert_eq!(backend, BackendKind::Network);
                assert!(location.ends_with("dnn_model.safetensors"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn fs_store_rejects_empty_payload() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        std::fs::write(store.path_for(BackendKind::NaiveBayes), b"").unwrap();
        let err = store.load(BackendKind::NaiveBayes).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidArtifact { backend: BackendKind::NaiveBayes, .. }));
    }

    #[test]
    fn memory_store_slots_are_independent() {
        let mut store = MemoryArtifactStore::new();
        store.save(&Artifact::new(BackendKind::Svm, vec![1])).unwrap();
        store.save(&Artifact::new(BackendKind::NaiveBayes, vec![2])).unwrap();
        assert_eq!(store.len(), 2);

        store.remove(BackendKind::Svm);
        assert!(!store.contains(BackendKind::Svm));
        assert_eq!(store.load(BackendKind::NaiveBayes).unwrap().payload, vec![2]);
        assert!(matches!(
            store.load(BackendKind::Svm),
            Err(PipelineError::ArtifactNotFound { .. })
        ));
    }
}
