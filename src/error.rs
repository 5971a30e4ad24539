//! Error taxonomy for experiment design operations
//!
//! Every variant is a caller-facing, non-retryable condition: it signals a
//! mismatch between parameters and data, never a transient fault.

use thiserror::Error;

/// Errors produced by sizing, splitting and error-rate estimation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DesignError {
    #[error("Invalid input for `{parameter}`: {reason}")]
    InvalidInput { parameter: String, reason: String },

    #[error("Insufficient data in stratum {stratum}: need {required} units, got {available}")]
    InsufficientData {
        stratum: String,
        available: usize,
        required: usize,
    },

    #[error("Degenerate effect {effect} (mean {mean}): absolute effect is zero, sample size would be infinite")]
    DegenerateEffect { effect: f64, mean: f64 },

    #[error("Numeric failure: {0}")]
    Numeric(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl DesignError {
    /// Shorthand for [`DesignError::InvalidInput`]
    pub fn invalid(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for experiment design operations
pub type Result<T> = std::result::Result<T, DesignError>;

/// Check that a probability parameter lies strictly inside (0, 1)
pub(crate) fn ensure_probability(parameter: &str, value: f64) -> Result<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(DesignError::invalid(
            parameter,
            format!("must lie in (0, 1), got {}", value),
        ))
    }
}
