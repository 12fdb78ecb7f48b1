// cimeter - Consciousness index meter
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for cimeter
//!
//! Numerically degenerate input never surfaces here: metric functions fall
//! back to documented neutral values. Only contract violations (malformed
//! weight sets, mismatched shapes, invalid configuration) are errors.

use thiserror::Error;

/// Result type alias for cimeter operations
pub type Result<T> = std::result::Result<T, IndexError>;

/// Main error type for cimeter operations
#[derive(Error, Debug)]
pub enum IndexError {
    /// Strict mode requires a score for every weighted component
    #[error("Missing component in strict mode: {0}")]
    MissingComponent(String),

    /// Weight is negative, NaN or infinite
    #[error("Invalid weight for {component}: {value}")]
    InvalidWeight { component: String, value: f64 },

    /// Weight set is empty or sums to zero
    #[error("Weight set is empty or sums to zero")]
    EmptyWeights,

    /// Component name outside the closed set
    #[error("Unknown component: {0}")]
    UnknownComponent(String),

    /// Array shapes do not line up
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Config file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IndexError {
    pub(crate) fn shape(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        IndexError::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// True for errors caused by a malformed weight set.
    pub fn is_weight_error(&self) -> bool {
        matches!(
            self,
            IndexError::MissingComponent(_)
                | IndexError::InvalidWeight { .. }
                | IndexError::EmptyWeights
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IndexError::InvalidWeight {
            component: "sigma".to_string(),
            value: -1.0,
        };
        assert_eq!(err.to_string(), "Invalid weight for sigma: -1");

        let err = IndexError::shape("8 x 250", "8 x 249");
        assert!(err.to_string().contains("8 x 249"));
    }

    #[test]
    fn test_weight_error_classification() {
        assert!(IndexError::EmptyWeights.is_weight_error());
        assert!(IndexError::MissingComponent("phi".into()).is_weight_error());
        assert!(!IndexError::InvalidConfig("lambda".into()).is_weight_error());
    }

    #[test]
    fn test_json_error_conversion() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: IndexError = parse.unwrap_err().into();
        assert!(matches!(err, IndexError::Json(_)));
    }
}
