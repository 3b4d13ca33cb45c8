//! Turn one feature record into one predicted outcome

use serde::Serialize;
use std::fmt;

use crate::features::{FeatureRecord, FEATURE_SPEC};
use crate::model::Predictor;
use crate::{Result, RetentionError};

/// Predicted retention class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Outcome(pub i64);

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Predict the outcome for a single client
///
/// Fails with `ModelUnavailable` when no classifier is loaded, without
/// touching the record. Predictor errors surface as `InferenceFailed` and
/// outputs that are not integral class labels as `ResultConversionFailed`.
pub fn predict_one(record: &FeatureRecord, handle: Option<&dyn Predictor>) -> Result<Outcome> {
    let predictor = handle.ok_or(RetentionError::ModelUnavailable)?;

    let row = record.to_row();
    log::debug!("Predicting for row {:?}", row.iter().collect::<Vec<_>>());

    let outputs = predictor.predict(std::slice::from_ref(&row))?;
    let first = outputs
        .first()
        .ok_or_else(|| RetentionError::ResultConversionFailed {
            value: "[]".to_string(),
            reason: "predictor returned no outputs".to_string(),
        })?;

    let class = first.to_class()?;
    log::debug!("Predicted outcome {}", class);
    Ok(Outcome(class))
}

/// JSON document for a prediction
pub fn prediction_json(record: &FeatureRecord, outcome: Outcome) -> serde_json::Value {
    serde_json::json!({
        "outcome": outcome,
        "features": record,
    })
}

/// Format a prediction for display
pub fn format_prediction(record: &FeatureRecord, outcome: Outcome) -> String {
    let mut out = String::new();
    out.push_str("\n┌─────────────────────────────────────────────────┐\n");
    out.push_str("│  Client Retention Prediction\n");
    out.push_str("├─────────────────────────────────────────────────┤\n");
    for (field, value) in FEATURE_SPEC.iter().zip(record.values()) {
        out.push_str(&format!("│  {:<28} {:>6}\n", field.label, value));
    }
    out.push_str("├─────────────────────────────────────────────────┤\n");
    out.push_str(&format!("│  Predicted outcome:           {:>6}\n", outcome));
    out.push_str("└─────────────────────────────────────────────────┘\n");
    out
}
