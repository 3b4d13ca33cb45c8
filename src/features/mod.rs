//! Feature schema and input collection
//!
//! Defines the ordered client features and the ways they reach the predictor.

pub mod input;
pub mod record;

pub use record::{FeatureField, FeatureRecord, FeatureRow, FEATURE_NAMES, FEATURE_SPEC};
