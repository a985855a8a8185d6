use crate::error::{AppError, Result};
use crate::telemetry::FeedEntry;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// One model input and the telemetry field that carries it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSpec {
    /// Column name in the training dataset
    pub name: &'static str,

    /// Field name in a telemetry feed entry
    pub field: &'static str,
}

/// Number of model inputs
pub const N_FEATURES: usize = 5;

/// Model inputs in training-column order.
///
/// The trainer rejects datasets whose feature columns differ from this list,
/// and the predictor builds its vectors from it, so both sides always agree on
/// order and count.
pub const FEATURE_SCHEMA: [FeatureSpec; N_FEATURES] = [
    FeatureSpec {
        name: "accelerometer_x",
        field: "field1",
    },
    FeatureSpec {
        name: "accelerometer_y",
        field: "field2",
    },
    FeatureSpec {
        name: "accelerometer_z",
        field: "field3",
    },
    FeatureSpec {
        name: "body_temp",
        field: "field4",
    },
    FeatureSpec {
        name: "heart_rate",
        field: "field5",
    },
];

/// Feature names in schema order
pub fn feature_names() -> Vec<String> {
    FEATURE_SCHEMA.iter().map(|spec| spec.name.to_string()).collect()
}

/// Fixed-order model input built from a single reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; N_FEATURES]);

impl FeatureVector {
    /// Read the schema fields from a feed entry, coercing each to `f64`
    pub fn from_entry(entry: &FeedEntry) -> Result<Self> {
        let mut values = [0.0; N_FEATURES];

        for (slot, spec) in values.iter_mut().zip(FEATURE_SCHEMA.iter()) {
            let raw = entry.field(spec.field).ok_or_else(|| {
                AppError::MalformedInput(format!(
                    "feed entry is missing {} ({})",
                    spec.field, spec.name
                ))
            })?;

            *slot = coerce(raw, spec)?;
        }

        Ok(Self(values))
    }

    pub fn values(&self) -> &[f64; N_FEATURES] {
        &self.0
    }

    /// Single-row matrix for the classifier
    pub fn to_array(&self) -> Array2<f64> {
        Array2::from_shape_fn((1, N_FEATURES), |(_, j)| self.0[j])
    }
}

impl From<[f64; N_FEATURES]> for FeatureVector {
    fn from(values: [f64; N_FEATURES]) -> Self {
        Self(values)
    }
}

fn coerce(raw: &serde_json::Value, spec: &FeatureSpec) -> Result<f64> {
    let value = match raw {
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    match value {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(AppError::Conversion(format!(
            "{} ({}) is not numeric: {}",
            spec.field, spec.name, raw
        ))),
    }
}
