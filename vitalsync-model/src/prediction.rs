//! Efficiency prediction score, validated into the unit interval.
//!
//! The `/prediction` endpoint has shipped the score both as a JSON number
//! and as a numeric string depending on server version, so the payload
//! accepts either and validation happens in one place. Anything that does
//! not parse into `[0, 1]` is rejected rather than coerced.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// A model-predicted efficiency score in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct EfficiencyScore(f64);

impl EfficiencyScore {
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(ModelError::ScoreOutOfRange(value));
        }
        Ok(EfficiencyScore(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for EfficiencyScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The `/prediction` payload: `{"prediction": <number or numeric string>}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionPayload {
    pub prediction: serde_json::Value,
}

impl PredictionPayload {
    /// Parse and validate the wire value into an [`EfficiencyScore`].
    pub fn score(&self) -> Result<EfficiencyScore> {
        let raw = match &self.prediction {
            serde_json::Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| ModelError::NotNumeric(n.to_string()))?,
            serde_json::Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| ModelError::NotNumeric(s.clone()))?,
            other => return Err(ModelError::NotNumeric(other.to_string())),
        };
        EfficiencyScore::new(raw)
    }
}
