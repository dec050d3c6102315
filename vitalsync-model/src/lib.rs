//! Core data model definitions shared across VitalSync crates.

pub mod error;
pub mod prediction;
pub mod telemetry;

// Intentionally curated re-exports for downstream consumers.
pub use error::{ModelError, Result as ModelResult};
pub use prediction::{EfficiencyScore, PredictionPayload};
pub use telemetry::{TelemetryColumns, TelemetryRecord};
