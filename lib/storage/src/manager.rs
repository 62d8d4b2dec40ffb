use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use segserve_core::Model;
use segserve_forest::{load_model, ForestArtifact};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::artifact::{checksum, read_artifact, write_artifact};

/// A model together with where it came from
#[derive(Debug)]
pub struct LoadedModel {
    model: Model,
    path: PathBuf,
    checksum: String,
    loaded_at: DateTime<Utc>,
    n_features: usize,
    n_trees: usize,
}

impl LoadedModel {
    #[inline]
    pub fn model(&self) -> &Model {
        &self.model
    }

    #[inline]
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    #[inline]
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn info(&self) -> ModelInfo {
        let classifier = self.model.classifier();
        ModelInfo {
            path: self.path.display().to_string(),
            sha256: self.checksum.clone(),
            loaded_at: self.loaded_at,
            kind: classifier.kind(),
            classes: self.model.labels().classes().to_vec(),
            n_features: self.n_features,
            n_trees: self.n_trees,
            probabilities: classifier.supports_probabilities(),
        }
    }
}

/// Status view of the loaded model
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub path: String,
    pub sha256: String,
    pub loaded_at: DateTime<Utc>,
    pub kind: &'static str,
    pub classes: Vec<String>,
    pub n_features: usize,
    pub n_trees: usize,
    pub probabilities: bool,
}

/// Owns the process-wide model handle
///
/// Requests take a cheap `Arc` clone through [`ModelStore::current`] and keep
/// using it even if a reload swaps the handle underneath them. A new model is
/// fully parsed and validated before the swap, so a reader sees either the
/// old model or the new one. Failed loads leave the current model in place.
pub struct ModelStore {
    current: Arc<RwLock<Option<Arc<LoadedModel>>>>,
    artifact_path: PathBuf,
    expected_features: usize,
    swap_lock: Mutex<()>,
}

impl ModelStore {
    /// Create an empty store for the artifact at `artifact_path`
    ///
    /// `expected_features` is the schema width; artifacts grown on a
    /// different width still load but are logged.
    pub fn new<P: AsRef<Path>>(artifact_path: P, expected_features: usize) -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
            artifact_path: artifact_path.as_ref().to_path_buf(),
            expected_features,
            swap_lock: Mutex::new(()),
        }
    }

    /// Initial load at startup
    pub fn load(&self) -> Result<Arc<LoadedModel>> {
        let _guard = self.swap_lock.lock();
        let loaded = Arc::new(self.read_from_disk()?);
        self.swap(loaded.clone());
        info!(
            path = %self.artifact_path.display(),
            sha256 = %loaded.checksum,
            classes = ?loaded.model.labels().classes(),
            "Model loaded"
        );
        Ok(loaded)
    }

    /// Re-read the artifact from disk and swap it in
    pub fn reload(&self) -> Result<Arc<LoadedModel>> {
        let _guard = self.swap_lock.lock();
        let loaded = match self.read_from_disk() {
            Ok(model) => Arc::new(model),
            Err(e) => {
                warn!(error = %e, loaded = self.is_loaded(), "Model reload failed, keeping current state");
                return Err(e);
            }
        };
        let previous = self.swap(loaded.clone());
        info!(
            sha256 = %loaded.checksum,
            previous = previous.as_ref().map(|p| p.checksum.as_str()).unwrap_or("none"),
            "Model reloaded"
        );
        Ok(loaded)
    }

    /// Validate a new artifact, persist it atomically, then swap it in
    ///
    /// Nothing is written when the artifact does not build into a model.
    pub fn install(&self, bytes: &[u8]) -> Result<Arc<LoadedModel>> {
        let _guard = self.swap_lock.lock();
        let loaded = Arc::new(self.build(bytes, checksum(bytes))?);
        write_artifact(&self.artifact_path, bytes)?;
        self.swap(loaded.clone());
        info!(
            path = %self.artifact_path.display(),
            sha256 = %loaded.checksum,
            "Model installed"
        );
        Ok(loaded)
    }

    /// Drop the current model; returns whether one was loaded
    pub fn unload(&self) -> bool {
        let _guard = self.swap_lock.lock();
        let was_loaded = self.current.write().take().is_some();
        if was_loaded {
            info!("Model unloaded");
        }
        was_loaded
    }

    #[inline]
    pub fn current(&self) -> Option<Arc<LoadedModel>> {
        self.current.read().clone()
    }

    #[inline]
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }

    #[inline]
    #[must_use]
    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    fn swap(&self, next: Arc<LoadedModel>) -> Option<Arc<LoadedModel>> {
        self.current.write().replace(next)
    }

    fn read_from_disk(&self) -> Result<LoadedModel> {
        let (bytes, sum) = read_artifact(&self.artifact_path)?;
        self.build(&bytes, sum)
    }

    fn build(&self, bytes: &[u8], checksum: String) -> Result<LoadedModel> {
        let artifact = ForestArtifact::from_slice(bytes)?;
        let model = load_model(&artifact)?;

        if artifact.n_features != self.expected_features {
            warn!(
                model_features = artifact.n_features,
                schema_features = self.expected_features,
                "Model feature count differs from the schema; predictions will fail"
            );
        }

        Ok(LoadedModel {
            model,
            path: self.artifact_path.clone(),
            checksum,
            loaded_at: Utc::now(),
            n_features: artifact.n_features,
            n_trees: artifact.trees.len(),
        })
    }
}
