//! Logistic classifier stored as JSON
//!
//! score = sigmoid(bias + Σ wᵢ · xᵢ / scaleᵢ); the positive class is
//! emitted when score ≥ threshold.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::predictor::{check_columns, Predictor, PredictorError, RawOutcome};
use crate::features::FeatureRow;

/// Serializable logistic model weights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    /// Human-readable model identifier
    pub model_id: String,
    #[serde(default)]
    pub model_version: String,
    /// Column names the weights were fitted against, in order
    pub feature_names: Vec<String>,
    /// One weight per feature
    pub weights: Vec<f64>,
    pub bias: f64,
    /// Per-feature divisor applied before weighting (empty = all 1.0)
    #[serde(default)]
    pub feature_scales: Vec<f64>,
    /// Decision threshold on the sigmoid score
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Labels for the negative and positive class
    #[serde(default = "default_classes")]
    pub classes: [RawOutcome; 2],
}

fn default_threshold() -> f64 {
    0.5
}

fn default_classes() -> [RawOutcome; 2] {
    [RawOutcome::Int(0), RawOutcome::Int(1)]
}

#[derive(Debug, thiserror::Error)]
pub enum LogisticError {
    #[error("model JSON parse error: {0}")]
    ParseJson(#[from] serde_json::Error),
    #[error("model file IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("threshold {0} not in [0, 1]")]
    InvalidThreshold(f64),
    #[error("non-finite weight at index {index}: {value}")]
    NonFiniteWeight { index: usize, value: f64 },
    #[error("non-finite bias: {0}")]
    NonFiniteBias(f64),
    #[error("feature scale at index {index} must be positive, got {value}")]
    InvalidScale { index: usize, value: f64 },
    #[error("{scales} feature scales given for {weights} weights")]
    ScaleCount { scales: usize, weights: usize },
}

impl LogisticModel {
    /// Load model from a JSON string
    pub fn from_json(json: &str) -> Result<Self, LogisticError> {
        let model: Self = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    /// Load model from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, LogisticError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Structural checks that do not depend on the input schema
    ///
    /// Weight count and column names are checked against each row at
    /// prediction time.
    pub fn validate(&self) -> Result<(), LogisticError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(LogisticError::InvalidThreshold(self.threshold));
        }
        for (index, &value) in self.weights.iter().enumerate() {
            if !value.is_finite() {
                return Err(LogisticError::NonFiniteWeight { index, value });
            }
        }
        if !self.bias.is_finite() {
            return Err(LogisticError::NonFiniteBias(self.bias));
        }
        if !self.feature_scales.is_empty() && self.feature_scales.len() != self.weights.len() {
            return Err(LogisticError::ScaleCount {
                scales: self.feature_scales.len(),
                weights: self.weights.len(),
            });
        }
        for (index, &value) in self.feature_scales.iter().enumerate() {
            if !(value.is_finite() && value > 0.0) {
                return Err(LogisticError::InvalidScale { index, value });
            }
        }
        Ok(())
    }

    /// Probability of the positive class for one row
    pub fn score(&self, row: &FeatureRow) -> Result<f64, PredictorError> {
        check_columns(&self.feature_names, row)?;
        if self.weights.len() != row.values().len() {
            return Err(PredictorError::FeatureCount {
                expected: self.weights.len(),
                got: row.values().len(),
            });
        }

        let mut z = self.bias;
        for (i, (w, x)) in self.weights.iter().zip(row.values()).enumerate() {
            let scale = self.feature_scales.get(i).copied().unwrap_or(1.0);
            z += w * (x / scale);
        }
        Ok(sigmoid(z))
    }
}

impl Predictor for LogisticModel {
    fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<RawOutcome>, PredictorError> {
        rows.iter()
            .map(|row| {
                let p = self.score(row)?;
                let class = if p >= self.threshold { 1 } else { 0 };
                Ok(self.classes[class].clone())
            })
            .collect()
    }

    fn describe(&self) -> String {
        format!(
            "logistic model {} {} ({} features, threshold {})",
            self.model_id,
            self.model_version,
            self.weights.len(),
            self.threshold
        )
    }
}

/// Numerically stable logistic function
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
