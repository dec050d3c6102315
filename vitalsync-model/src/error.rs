use std::fmt::{self, Display};

/// Errors produced by model constructors and decode validation routines.
#[derive(Debug)]
pub enum ModelError {
    /// The seven telemetry columns do not share a single length.
    ColumnLengthMismatch { field: &'static str, expected: usize, actual: usize },
    /// A prediction value fell outside the `[0, 1]` domain.
    ScoreOutOfRange(f64),
    /// A prediction payload was not a number or a numeric string.
    NotNumeric(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::ColumnLengthMismatch {
                field,
                expected,
                actual,
            } => write!(
                f,
                "telemetry column `{field}` has length {actual}, expected {expected}"
            ),
            ModelError::ScoreOutOfRange(v) => {
                write!(f, "prediction {v} is outside [0, 1]")
            }
            ModelError::NotNumeric(raw) => {
                write!(f, "prediction payload {raw:?} is not numeric")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
