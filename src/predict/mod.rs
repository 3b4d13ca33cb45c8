//! Prediction and inference
//!
//! Load the trained classifier once and score client records against it.

pub mod inference;
pub mod loader;

pub use inference::{format_prediction, predict_one, prediction_json, Outcome};
pub use loader::{ArtifactFormat, ModelInfo, ModelLoader, ModelState};
