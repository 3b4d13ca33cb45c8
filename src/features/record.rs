//! Client feature record handed to the classifier
//!
//! The column order below is the order the classifier was trained on.
//! Reordering it silently corrupts every prediction.

use serde::{Deserialize, Serialize};

use crate::{Result, RetentionError};

/// Metadata for one input field
#[derive(Debug, Clone, Copy)]
pub struct FeatureField {
    /// Column name expected by the classifier
    pub name: &'static str,
    /// Human-readable label for prompts and tables
    pub label: &'static str,
    /// Value used when the collector supplies nothing
    pub default: u32,
}

/// Ordered schema of all input fields
pub const FEATURE_SPEC: [FeatureField; FeatureRecord::DIM] = [
    FeatureField { name: "time_since_last_pickup", label: "Time Since Last Pickup", default: 10 },
    FeatureField { name: "hamper_confirmation_type", label: "Hamper Confirmation Type", default: 1 },
    FeatureField { name: "preferred_contact_methods", label: "Preferred Contact Methods", default: 1 },
    FeatureField { name: "status", label: "Client Status", default: 1 },
    FeatureField { name: "sex_new", label: "Sex", default: 1 },
    FeatureField { name: "new_age_years", label: "Age in Years", default: 35 },
    FeatureField { name: "hamper_demand_lag_30", label: "Hamper Demand Lag 30 Days", default: 2 },
    FeatureField { name: "latest_contact_method", label: "Latest Contact Method", default: 1 },
    FeatureField { name: "dependents_qty", label: "Dependents Quantity", default: 3 },
    FeatureField { name: "household", label: "Household Size", default: 4 },
    FeatureField { name: "contact_frequency", label: "Contact Frequency", default: 5 },
];

/// Column names in classifier order
pub const FEATURE_NAMES: [&str; FeatureRecord::DIM] = [
    "time_since_last_pickup",
    "hamper_confirmation_type",
    "preferred_contact_methods",
    "status",
    "sex_new",
    "new_age_years",
    "hamper_demand_lag_30",
    "latest_contact_method",
    "dependents_qty",
    "household",
    "contact_frequency",
];

/// One client's feature values
///
/// Field declaration order matches [`FEATURE_NAMES`]. Values are unsigned,
/// so non-negativity holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureRecord {
    /// Days since the client last picked up a hamper
    pub time_since_last_pickup: u32,
    pub hamper_confirmation_type: u32,
    pub preferred_contact_methods: u32,
    pub status: u32,
    pub sex_new: u32,
    pub new_age_years: u32,
    /// Hamper demand 30 days earlier
    pub hamper_demand_lag_30: u32,
    pub latest_contact_method: u32,
    pub dependents_qty: u32,
    pub household: u32,
    pub contact_frequency: u32,
}

impl Default for FeatureRecord {
    fn default() -> Self {
        let mut values = [0u32; Self::DIM];
        for (slot, field) in values.iter_mut().zip(FEATURE_SPEC.iter()) {
            *slot = field.default;
        }
        Self::from_values(values)
    }
}

impl FeatureRecord {
    /// Number of input features
    pub const DIM: usize = 11;

    /// Build from values already in classifier order
    pub fn from_values(v: [u32; Self::DIM]) -> Self {
        FeatureRecord {
            time_since_last_pickup: v[0],
            hamper_confirmation_type: v[1],
            preferred_contact_methods: v[2],
            status: v[3],
            sex_new: v[4],
            new_age_years: v[5],
            hamper_demand_lag_30: v[6],
            latest_contact_method: v[7],
            dependents_qty: v[8],
            household: v[9],
            contact_frequency: v[10],
        }
    }

    /// Values in classifier order
    pub fn values(&self) -> [u32; Self::DIM] {
        [
            self.time_since_last_pickup,
            self.hamper_confirmation_type,
            self.preferred_contact_methods,
            self.status,
            self.sex_new,
            self.new_age_years,
            self.hamper_demand_lag_30,
            self.latest_contact_method,
            self.dependents_qty,
            self.household,
            self.contact_frequency,
        ]
    }

    /// Build from name/value pairs supplied in any order
    ///
    /// Every field must appear exactly once and hold a non-negative integer.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut slots: [Option<u32>; Self::DIM] = [None; Self::DIM];

        for (key, raw) in pairs {
            let key = key.as_ref().trim();
            let idx = FEATURE_NAMES
                .iter()
                .position(|n| *n == key)
                .ok_or_else(|| RetentionError::InvalidRecord(format!("unknown field '{}'", key)))?;

            if slots[idx].is_some() {
                return Err(RetentionError::InvalidRecord(format!(
                    "field '{}' given more than once",
                    key
                )));
            }
            slots[idx] = Some(parse_value(key, raw.as_ref())?);
        }

        let mut values = [0u32; Self::DIM];
        for (idx, slot) in slots.iter().enumerate() {
            values[idx] = slot.ok_or_else(|| {
                RetentionError::InvalidRecord(format!("missing field '{}'", FEATURE_NAMES[idx]))
            })?;
        }

        Ok(Self::from_values(values))
    }

    /// Parse a JSON object mapping field names to values
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| RetentionError::InvalidRecord(format!("not valid JSON: {}", e)))?;
        let object = value.as_object().ok_or_else(|| {
            RetentionError::InvalidRecord("expected a JSON object of field values".to_string())
        })?;

        let pairs = object
            .iter()
            .map(|(name, v)| {
                let raw = match v {
                    serde_json::Value::Number(n) => n.to_string(),
                    serde_json::Value::String(s) => s.clone(),
                    other => {
                        return Err(RetentionError::InvalidRecord(format!(
                            "field '{}' is not numeric: {}",
                            name, other
                        )))
                    }
                };
                Ok((name.clone(), raw))
            })
            .collect::<Result<Vec<_>>>()?;

        Self::from_pairs(pairs)
    }

    /// Build the single structured row handed to a predictor
    pub fn to_row(&self) -> FeatureRow {
        let v = self.values();
        let mut values = [0.0f64; Self::DIM];
        for (dst, src) in values.iter_mut().zip(v.iter()) {
            *dst = *src as f64;
        }
        FeatureRow { values }
    }
}

/// Parse one field value, accepting integral floats such as `3.0`
pub(crate) fn parse_value(name: &str, raw: &str) -> Result<u32> {
    let raw = raw.trim();
    if let Ok(v) = raw.parse::<u32>() {
        return Ok(v);
    }

    match raw.parse::<f64>() {
        Ok(v) if v < 0.0 => Err(RetentionError::InvalidRecord(format!(
            "field '{}' must be non-negative, got {}",
            name, raw
        ))),
        Ok(v) if v.fract() == 0.0 && v <= u32::MAX as f64 => Ok(v as u32),
        _ => Err(RetentionError::InvalidRecord(format!(
            "field '{}' is not a non-negative integer: '{}'",
            name, raw
        ))),
    }
}

/// A single named row of numeric features in classifier order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    values: [f64; FeatureRecord::DIM],
}

impl FeatureRow {
    /// Column names, always [`FEATURE_NAMES`]
    pub fn columns(&self) -> &'static [&'static str] {
        &FEATURE_NAMES
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.values.iter().map(|v| *v as f32).collect()
    }

    /// Named (column, value) pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.values.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pairs() -> Vec<(&'static str, &'static str)> {
        vec![
            ("time_since_last_pickup", "10"),
            ("hamper_confirmation_type", "1"),
            ("preferred_contact_methods", "1"),
            ("status", "1"),
            ("sex_new", "1"),
            ("new_age_years", "35"),
            ("hamper_demand_lag_30", "2"),
            ("latest_contact_method", "1"),
            ("dependents_qty", "3"),
            ("household", "4"),
            ("contact_frequency", "5"),
        ]
    }

    #[test]
    fn test_spec_and_names_agree() {
        assert_eq!(FEATURE_SPEC.len(), FeatureRecord::DIM);
        for (field, name) in FEATURE_SPEC.iter().zip(FEATURE_NAMES.iter()) {
            assert_eq!(field.name, *name);
        }
    }

    #[test]
    fn test_default_matches_form_defaults() {
        let record = FeatureRecord::default();
        assert_eq!(record.values(), [10, 1, 1, 1, 1, 35, 2, 1, 3, 4, 5]);
    }

    #[test]
    fn test_serde_uses_column_names() {
        let json = serde_json::to_value(FeatureRecord::default()).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), FeatureRecord::DIM);
        for name in FEATURE_NAMES {
            assert!(object.contains_key(name), "missing {}", name);
        }
    }

    #[test]
    fn test_from_pairs_reordered_input_keeps_column_order() {
        let mut pairs = sample_pairs();
        pairs.reverse();
        let record = FeatureRecord::from_pairs(pairs).unwrap();

        assert_eq!(record.time_since_last_pickup, 10);
        assert_eq!(record.new_age_years, 35);
        assert_eq!(record.contact_frequency, 5);

        let row = record.to_row();
        let columns: Vec<&str> = row.iter().map(|(c, _)| c).collect();
        assert_eq!(columns, FEATURE_NAMES.to_vec());
        assert_eq!(
            row.values(),
            &[10.0, 1.0, 1.0, 1.0, 1.0, 35.0, 2.0, 1.0, 3.0, 4.0, 5.0]
        );
    }

    #[test]
    fn test_from_pairs_missing_field() {
        let pairs: Vec<_> = sample_pairs()
            .into_iter()
            .filter(|(k, _)| *k != "household")
            .collect();
        let err = FeatureRecord::from_pairs(pairs).unwrap_err();
        assert!(err.to_string().contains("missing field 'household'"), "{}", err);
    }

    #[test]
    fn test_from_pairs_non_numeric() {
        let mut pairs = sample_pairs();
        pairs[3] = ("status", "active");
        let err = FeatureRecord::from_pairs(pairs).unwrap_err();
        assert!(matches!(err, RetentionError::InvalidRecord(_)));
        assert!(err.to_string().contains("status"));
    }

    #[test]
    fn test_from_pairs_negative_rejected() {
        let mut pairs = sample_pairs();
        pairs[5] = ("new_age_years", "-4");
        let err = FeatureRecord::from_pairs(pairs).unwrap_err();
        assert!(err.to_string().contains("non-negative"), "{}", err);
    }

    #[test]
    fn test_from_pairs_unknown_and_duplicate() {
        let mut pairs = sample_pairs();
        pairs.push(("favourite_colour", "3"));
        assert!(FeatureRecord::from_pairs(pairs).is_err());

        let mut pairs = sample_pairs();
        pairs.push(("sex_new", "0"));
        let err = FeatureRecord::from_pairs(pairs).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_parse_value_accepts_integral_float() {
        assert_eq!(parse_value("household", "4.0").unwrap(), 4);
        assert!(parse_value("household", "4.5").is_err());
        assert!(parse_value("household", "NaN").is_err());
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "contact_frequency": 5, "household": 4, "dependents_qty": "3",
            "latest_contact_method": 1, "hamper_demand_lag_30": 2,
            "new_age_years": 35, "sex_new": 1, "status": 1,
            "preferred_contact_methods": 1, "hamper_confirmation_type": 1,
            "time_since_last_pickup": 10
        }"#;
        let record = FeatureRecord::from_json(json).unwrap();
        assert_eq!(record, FeatureRecord::default());

        let err = FeatureRecord::from_json(r#"{"status": true}"#).unwrap_err();
        assert!(err.to_string().contains("not numeric"));
        assert!(FeatureRecord::from_json("[1, 2, 3]").is_err());
    }
}
