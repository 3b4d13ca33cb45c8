//! Client retention prediction
//!
//! Collects eleven client-behaviour features, hands them to a pre-trained
//! classifier and reports the predicted retention outcome.

pub mod features;
pub mod model;
pub mod predict;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::model::PredictorError;

/// Application-wide errors
#[derive(Debug, Error)]
pub enum RetentionError {
    #[error("No trained model found at '{}'", .0.display())]
    ModelFileMissing(PathBuf),

    #[error("Model file '{}' could not be loaded: {reason}", path.display())]
    ModelFileCorrupt { path: PathBuf, reason: String },

    #[error("Prediction failed: no trained model loaded")]
    ModelUnavailable,

    #[error("Prediction failed: {0}")]
    InferenceFailed(#[from] PredictorError),

    #[error("Could not convert predictor output {value} to a class label: {reason}")]
    ResultConversionFailed { value: String, reason: String },

    #[error("Invalid feature record: {0}")]
    InvalidRecord(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RetentionError>;

/// How the serialized predictor is stored on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    /// Pick by file extension
    Auto,
    /// JSON logistic model
    Json,
    /// burn named MessagePack record
    Burn,
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelFormat::Auto => write!(f, "auto"),
            ModelFormat::Json => write!(f, "json"),
            ModelFormat::Burn => write!(f, "burn"),
        }
    }
}

/// Output format for prediction results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use table or json.", s)),
        }
    }
}

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Location of the predictor artifact
    pub path: PathBuf,
    #[serde(default = "default_format")]
    pub format: ModelFormat,
    /// Hidden layer sizes (burn models only)
    #[serde(default = "default_hidden_dims")]
    pub hidden_dims: Vec<usize>,
    /// Number of output classes (burn models only)
    #[serde(default = "default_n_classes")]
    pub n_classes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

/// Default predictor location, relative to the working directory
pub const DEFAULT_MODEL_PATH: &str = "models/model.json";

fn default_format() -> ModelFormat {
    ModelFormat::Auto
}

fn default_hidden_dims() -> Vec<usize> {
    vec![64, 32]
}

fn default_n_classes() -> usize {
    2
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            path: PathBuf::from(DEFAULT_MODEL_PATH),
            format: default_format(),
            hidden_dims: default_hidden_dims(),
            n_classes: default_n_classes(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            format: OutputFormat::Table,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            model: ModelConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RetentionError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| RetentionError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RetentionError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = Config::from_toml(&text).unwrap();

        assert_eq!(parsed.model.path, PathBuf::from(DEFAULT_MODEL_PATH));
        assert_eq!(parsed.model.format, ModelFormat::Auto);
        assert_eq!(parsed.model.hidden_dims, vec![64, 32]);
        assert_eq!(parsed.output.format, OutputFormat::Table);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_toml("[model]\npath = \"models/retention.mpk\"\n").unwrap();

        assert_eq!(config.model.path, PathBuf::from("models/retention.mpk"));
        assert_eq!(config.model.format, ModelFormat::Auto);
        assert_eq!(config.model.n_classes, 2);
        assert_eq!(config.output.format, OutputFormat::Table);
    }

    #[test]
    fn test_bad_config_is_config_error() {
        let err = Config::from_toml("[model]\nformat = \"pickle\"\n").unwrap_err();
        assert!(matches!(err, RetentionError::Config(_)));
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("csv".parse::<OutputFormat>().is_err());
    }
}
