//! Classifier implementations
//!
//! Two artifact formats share one prediction capability:
//! - Logistic: JSON weights, pure Rust scoring
//! - MLP: burn record evaluated on the NdArray backend

pub mod logistic;
pub mod mlp;
pub mod predictor;

pub use logistic::LogisticModel;
pub use mlp::{InferenceBackend, MLPConfig, MLPModel, MlpClassifier};
pub use predictor::{Predictor, PredictorError, RawOutcome};
