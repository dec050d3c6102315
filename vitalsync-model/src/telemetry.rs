//! Telemetry wire payload and the row-form records reconstructed from it.
//!
//! The server ships telemetry in columnar form: seven parallel arrays, one
//! per measured quantity, index-aligned. Reconstruction into rows is only
//! valid when every column has the same length; a mismatch rejects the whole
//! payload rather than committing a truncated prefix.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// A single telemetry sample, one index across all seven columns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub heart_rate: f64,
    pub blood_pressure: f64,
    pub temperature: f64,
    pub moisture: f64,
    pub body_water_content: f64,
    pub fatigue_level: f64,
    pub drowsiness_level: f64,
}

/// The `/data` payload as it arrives: seven equal-length parallel arrays.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryColumns {
    pub heart_rate: Vec<f64>,
    pub blood_pressure: Vec<f64>,
    pub temperature: Vec<f64>,
    pub moisture: Vec<f64>,
    pub body_water_content: Vec<f64>,
    pub fatigue_level: Vec<f64>,
    pub drowsiness_level: Vec<f64>,
}

impl TelemetryColumns {
    /// Number of samples, taken from the leading column.
    pub fn len(&self) -> usize {
        self.heart_rate.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heart_rate.is_empty()
    }

    fn check_lengths(&self) -> Result<usize> {
        let expected = self.heart_rate.len();
        let columns: [(&'static str, usize); 6] = [
            ("blood_pressure", self.blood_pressure.len()),
            ("temperature", self.temperature.len()),
            ("moisture", self.moisture.len()),
            ("body_water_content", self.body_water_content.len()),
            ("fatigue_level", self.fatigue_level.len()),
            ("drowsiness_level", self.drowsiness_level.len()),
        ];
        for (field, actual) in columns {
            if actual != expected {
                return Err(ModelError::ColumnLengthMismatch {
                    field,
                    expected,
                    actual,
                });
            }
        }
        Ok(expected)
    }

    /// Zip the columns into index-aligned rows.
    ///
    /// All seven columns must share one length; otherwise nothing is
    /// produced.
    pub fn into_records(self) -> Result<Vec<TelemetryRecord>> {
        let n = self.check_lengths()?;
        let mut records = Vec::with_capacity(n);
        for i in 0..n {
            records.push(TelemetryRecord {
                heart_rate: self.heart_rate[i],
                blood_pressure: self.blood_pressure[i],
                temperature: self.temperature[i],
                moisture: self.moisture[i],
                body_water_content: self.body_water_content[i],
                fatigue_level: self.fatigue_level[i],
                drowsiness_level: self.drowsiness_level[i],
            });
        }
        Ok(records)
    }
}
