//! The capability every loaded classifier exposes

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::features::FeatureRow;
use crate::{Result, RetentionError};

/// Errors raised by a classifier while scoring rows
#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("model expects {expected} features, got {got}")]
    FeatureCount { expected: usize, got: usize },

    #[error("feature order mismatch at column {index}: model expects '{expected}', row has '{got}'")]
    FeatureOrder {
        index: usize,
        expected: String,
        got: String,
    },

    #[error("backend error: {0}")]
    Backend(String),
}

/// A raw value emitted by a classifier, before conversion to a class label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawOutcome {
    Int(i64),
    Float(f64),
    Label(String),
}

impl fmt::Display for RawOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawOutcome::Int(v) => write!(f, "{}", v),
            RawOutcome::Float(v) => write!(f, "{}", v),
            RawOutcome::Label(v) => write!(f, "\"{}\"", v),
        }
    }
}

impl RawOutcome {
    /// Convert to an integer class label without truncating
    pub fn to_class(&self) -> Result<i64> {
        let fail = |reason: &str| RetentionError::ResultConversionFailed {
            value: self.to_string(),
            reason: reason.to_string(),
        };

        match self {
            RawOutcome::Int(v) => Ok(*v),
            RawOutcome::Float(v) => {
                if !v.is_finite() {
                    Err(fail("value is not finite"))
                } else if v.fract() != 0.0 {
                    Err(fail("value has a fractional part"))
                } else if *v < i64::MIN as f64 || *v >= i64::MAX as f64 {
                    Err(fail("value is out of range"))
                } else {
                    Ok(*v as i64)
                }
            }
            RawOutcome::Label(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| fail("label is not an integer")),
        }
    }
}

/// A loaded classifier
///
/// Implementations take `&self` and must tolerate calls from any thread;
/// models that are not internally thread-safe serialize access themselves.
pub trait Predictor: Send + Sync {
    /// Score a batch of rows, returning one outcome per row
    fn predict(&self, rows: &[FeatureRow]) -> std::result::Result<Vec<RawOutcome>, PredictorError>;

    /// Short description for logs and `model info`
    fn describe(&self) -> String;
}

/// Check that a model's declared columns match the row schema exactly
pub fn check_columns(
    expected: &[String],
    row: &FeatureRow,
) -> std::result::Result<(), PredictorError> {
    let columns = row.columns();
    if expected.len() != columns.len() {
        return Err(PredictorError::FeatureCount {
            expected: expected.len(),
            got: columns.len(),
        });
    }

    for (index, (want, have)) in expected.iter().zip(columns.iter()).enumerate() {
        if want != have {
            return Err(PredictorError::FeatureOrder {
                index,
                expected: want.clone(),
                got: have.to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureRecord, FEATURE_NAMES};

    #[test]
    fn test_int_and_integral_float_convert() {
        assert_eq!(RawOutcome::Int(1).to_class().unwrap(), 1);
        assert_eq!(RawOutcome::Float(0.0).to_class().unwrap(), 0);
        assert_eq!(RawOutcome::Float(-2.0).to_class().unwrap(), -2);
        assert_eq!(RawOutcome::Label(" 3 ".to_string()).to_class().unwrap(), 3);
    }

    #[test]
    fn test_fractional_float_is_not_truncated() {
        let err = RawOutcome::Float(0.7).to_class().unwrap_err();
        assert!(matches!(err, RetentionError::ResultConversionFailed { .. }));
        assert!(err.to_string().contains("fractional"));
    }

    #[test]
    fn test_non_finite_and_text_labels_fail() {
        assert!(RawOutcome::Float(f64::NAN).to_class().is_err());
        assert!(RawOutcome::Float(f64::INFINITY).to_class().is_err());
        assert!(RawOutcome::Float(1e30).to_class().is_err());

        let err = RawOutcome::Label("returns".to_string()).to_class().unwrap_err();
        assert!(err.to_string().contains("\"returns\""));
    }

    #[test]
    fn test_untagged_deserialize() {
        let outcomes: Vec<RawOutcome> = serde_json::from_str(r#"[1, 1.5, "yes"]"#).unwrap();
        assert_eq!(
            outcomes,
            vec![
                RawOutcome::Int(1),
                RawOutcome::Float(1.5),
                RawOutcome::Label("yes".to_string())
            ]
        );
    }

    #[test]
    fn test_check_columns() {
        let row = FeatureRecord::default().to_row();
        let names: Vec<String> = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
        assert!(check_columns(&names, &row).is_ok());

        let mut swapped = names.clone();
        swapped.swap(0, 1);
        let err = check_columns(&swapped, &row).unwrap_err();
        assert!(matches!(err, PredictorError::FeatureOrder { index: 0, .. }));

        let err = check_columns(&names[..10], &row).unwrap_err();
        assert!(matches!(
            err,
            PredictorError::FeatureCount {
                expected: 10,
                got: 11
            }
        ));
    }
}
