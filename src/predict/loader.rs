//! Locate and deserialize the classifier artifact
//!
//! A missing file is an expected state (`ModelState::NoModel`); a file
//! that exists but cannot be decoded is a `ModelFileCorrupt` error.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::model::{InferenceBackend, LogisticModel, MLPConfig, MlpClassifier, Predictor};
use crate::{ModelConfig, ModelFormat, Result, RetentionError};

/// Concrete on-disk format of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Json,
    Burn,
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactFormat::Json => write!(f, "JSON logistic"),
            ArtifactFormat::Burn => write!(f, "burn MLP"),
        }
    }
}

impl ArtifactFormat {
    /// Resolve the configured format, using the file extension for `auto`
    pub fn resolve(path: &Path, format: ModelFormat) -> Result<Self> {
        match format {
            ModelFormat::Json => Ok(ArtifactFormat::Json),
            ModelFormat::Burn => Ok(ArtifactFormat::Burn),
            ModelFormat::Auto => {
                let ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.to_lowercase());
                match ext.as_deref() {
                    Some("json") => Ok(ArtifactFormat::Json),
                    Some("mpk") => Ok(ArtifactFormat::Burn),
                    _ => Err(RetentionError::Config(format!(
                        "Cannot infer model format from '{}'; set [model] format to json or burn",
                        path.display()
                    ))),
                }
            }
        }
    }
}

/// Whether a classifier is available
///
/// Moves from `NoModel` to `Ready` at most once per process.
#[derive(Clone)]
pub enum ModelState {
    NoModel,
    Ready(Arc<dyn Predictor>),
}

impl fmt::Debug for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelState::NoModel => write!(f, "NoModel"),
            ModelState::Ready(p) => write!(f, "Ready({})", p.describe()),
        }
    }
}

impl ModelState {
    /// The loaded classifier, if any
    pub fn handle(&self) -> Option<&dyn Predictor> {
        match self {
            ModelState::NoModel => None,
            ModelState::Ready(p) => Some(p.as_ref()),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ModelState::Ready(_))
    }
}

/// Summary of the artifact for `model info`
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub path: PathBuf,
    pub format: ArtifactFormat,
    pub size_bytes: u64,
    pub description: String,
}

/// Loads the classifier from a fixed path
#[derive(Debug, Clone)]
pub struct ModelLoader {
    path: PathBuf,
    format: ModelFormat,
    mlp: MLPConfig,
}

impl ModelLoader {
    /// Loader for `path`, inferring the format from its extension
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ModelLoader {
            path: path.into(),
            format: ModelFormat::Auto,
            mlp: MLPConfig::default(),
        }
    }

    pub fn from_config(config: &ModelConfig) -> Self {
        ModelLoader {
            path: config.path.clone(),
            format: config.format,
            mlp: MLPConfig::from_model_config(config),
        }
    }

    /// Load the classifier
    ///
    /// Returns `NoModel` when nothing exists at the path. Any file that is
    /// present but unreadable or malformed is reported as corrupt.
    pub fn load(&self) -> Result<ModelState> {
        if !self.artifact_exists()? {
            log::warn!(
                "No trained model found. Please provide a trained model at '{}'",
                self.path.display()
            );
            return Ok(ModelState::NoModel);
        }

        let format = ArtifactFormat::resolve(&self.path, self.format)?;
        log::info!("Loading {} model from {}", format, self.path.display());

        let predictor: Arc<dyn Predictor> = match format {
            ArtifactFormat::Json => {
                let model = LogisticModel::from_file(&self.path).map_err(|e| self.corrupt(e))?;
                Arc::new(model)
            }
            ArtifactFormat::Burn => Arc::new(MlpClassifier::<InferenceBackend>::load(
                Default::default(),
                &self.path,
                self.mlp.clone(),
            )?),
        };

        log::info!("Loaded {}", predictor.describe());
        Ok(ModelState::Ready(predictor))
    }

    /// Describe the artifact, loading it to validate
    pub fn describe(&self) -> Result<ModelInfo> {
        if !self.artifact_exists()? {
            return Err(RetentionError::ModelFileMissing(self.path.clone()));
        }

        let format = ArtifactFormat::resolve(&self.path, self.format)?;
        let size_bytes = std::fs::metadata(&self.path)?.len();
        let description = match self.load()? {
            ModelState::Ready(p) => p.describe(),
            ModelState::NoModel => return Err(RetentionError::ModelFileMissing(self.path.clone())),
        };

        Ok(ModelInfo {
            path: self.path.clone(),
            format,
            size_bytes,
            description,
        })
    }

    /// Only a definite not-found counts as missing; a failed lookup is corrupt
    fn artifact_exists(&self) -> Result<bool> {
        self.path.try_exists().map_err(|e| self.corrupt(e))
    }

    fn corrupt(&self, reason: impl fmt::Display) -> RetentionError {
        RetentionError::ModelFileCorrupt {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}
