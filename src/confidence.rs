//! Normal-approximation confidence interval for a Bernoulli proportion
//!
//! `h ± 1.96 * sqrt(h (1 - h) / n)` with `h = k / n`, bounds clipped to
//! `[0, 1]`.

use crate::error::{DesignError, Result};
use serde::Serialize;

/// Two-sided 95% normal quantile
pub const Z_95: f64 = 1.96;

/// Interval bounds for a proportion
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn contains(&self, value: f64) -> bool {
        (self.lower..=self.upper).contains(&value)
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// 95% interval for the success probability of 0/1 outcomes
///
/// # Example
/// ```
/// use abdesign::confidence::bernoulli_confidence_interval;
///
/// let ci = bernoulli_confidence_interval(&[1.0, 0.0, 1.0, 1.0]).unwrap();
/// assert!(ci.contains(0.75));
/// ```
pub fn bernoulli_confidence_interval(values: &[f64]) -> Result<ConfidenceInterval> {
    if values.is_empty() {
        return Err(DesignError::invalid("values", "sample is empty"));
    }
    if let Some(bad) = values.iter().find(|&&v| v != 0.0 && v != 1.0) {
        return Err(DesignError::invalid(
            "values",
            format!("expected 0/1 outcomes, got {}", bad),
        ));
    }

    let n = values.len() as f64;
    let h = values.iter().sum::<f64>() / n;
    let d = Z_95 * (h * (1.0 - h) / n).sqrt();

    Ok(ConfidenceInterval {
        lower: (h - d).clamp(0.0, 1.0),
        upper: (h + d).clamp(0.0, 1.0),
    })
}
