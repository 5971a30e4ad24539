//! Sample size estimation for a two-sample comparison of means
//!
//! Normal approximation:
//!
//! ```text
//! n = ceil( (z_{1-alpha/2} + z_{1-beta})^2 * 2 * sigma^2 / epsilon^2 )
//! ```
//!
//! where `epsilon` is the absolute effect to detect. Always rounds up, so a
//! design is never under-powered by rounding.

use crate::config::ExperimentConfig;
use crate::error::{ensure_probability, DesignError, Result};
use crate::series::MetricSeries;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

/// Required sample size for one relative effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleSizeRow {
    /// Relative effect (1.03 = +3%)
    pub effect: f64,
    /// Units per group
    pub sample_size: u64,
}

/// Per-group sample size for an absolute effect `epsilon`
///
/// # Example
/// ```
/// use abdesign::sample_size::required_sample_size_abs;
///
/// let n = required_sample_size_abs(5.0, 20.0, 0.05, 0.2).unwrap();
/// assert_eq!(n, 252);
/// ```
pub fn required_sample_size_abs(epsilon: f64, std_dev: f64, alpha: f64, beta: f64) -> Result<u64> {
    ensure_probability("alpha", alpha)?;
    ensure_probability("beta", beta)?;

    if !std_dev.is_finite() || std_dev < 0.0 {
        return Err(DesignError::invalid(
            "std_dev",
            format!("must be finite and non-negative, got {}", std_dev),
        ));
    }

    if !epsilon.is_finite() || epsilon == 0.0 {
        return Err(DesignError::DegenerateEffect {
            effect: epsilon,
            mean: f64::NAN,
        });
    }

    let normal = Normal::new(0.0, 1.0).map_err(|e| DesignError::Numeric(e.to_string()))?;
    let z_alpha = normal.inverse_cdf(1.0 - alpha / 2.0);
    let z_beta = normal.inverse_cdf(1.0 - beta);

    let z_sum_squared = (z_alpha + z_beta).powi(2);
    let n = (z_sum_squared * 2.0 * std_dev.powi(2) / epsilon.powi(2)).ceil();

    if !n.is_finite() || n > u64::MAX as f64 {
        return Err(DesignError::Numeric(format!(
            "sample size overflow (epsilon={}, std_dev={})",
            epsilon, std_dev
        )));
    }

    Ok((n as u64).max(1))
}

/// Per-group sample size for a relative effect on a metric with mean `mean`
///
/// `epsilon = (relative_effect - 1) * mean`. A zero mean collapses every
/// relative effect to zero; use [`required_sample_size_abs`] instead.
pub fn required_sample_size(
    mean: f64,
    std_dev: f64,
    relative_effect: f64,
    alpha: f64,
    beta: f64,
) -> Result<u64> {
    let epsilon = (relative_effect - 1.0) * mean;
    if epsilon == 0.0 {
        return Err(DesignError::DegenerateEffect {
            effect: relative_effect,
            mean,
        });
    }
    required_sample_size_abs(epsilon, std_dev, alpha, beta)
}

/// Sample size for each relative effect, in input order
///
/// Mean and population standard deviation come from `series`. Effects are
/// neither sorted nor de-duplicated.
pub fn estimate_sample_sizes(
    series: &MetricSeries,
    effects: &[f64],
    alpha: f64,
    beta: f64,
) -> Result<Vec<SampleSizeRow>> {
    if series.is_empty() {
        return Err(DesignError::invalid("series", "metric series is empty"));
    }

    let mean = series.mean();
    let std_dev = series.std_dev();
    tracing::debug!(
        "Sizing from {} observations: mean={:.4}, std={:.4}",
        series.len(),
        mean,
        std_dev
    );

    effects
        .iter()
        .map(|&effect| {
            required_sample_size(mean, std_dev, effect, alpha, beta).map(|sample_size| {
                SampleSizeRow {
                    effect,
                    sample_size,
                }
            })
        })
        .collect()
}

/// Sample size estimator bound to a configuration's error targets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleSizeEstimator {
    pub alpha: f64,
    pub beta: f64,
}

impl Default for SampleSizeEstimator {
    fn default() -> Self {
        Self::from_config(&ExperimentConfig::default())
    }
}

impl SampleSizeEstimator {
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }

    pub fn from_config(config: &ExperimentConfig) -> Self {
        Self::new(config.alpha, config.beta)
    }

    pub fn for_relative_effect(&self, mean: f64, std_dev: f64, relative_effect: f64) -> Result<u64> {
        required_sample_size(mean, std_dev, relative_effect, self.alpha, self.beta)
    }

    pub fn for_absolute_effect(&self, epsilon: f64, std_dev: f64) -> Result<u64> {
        required_sample_size_abs(epsilon, std_dev, self.alpha, self.beta)
    }

    pub fn for_series(&self, series: &MetricSeries, effects: &[f64]) -> Result<Vec<SampleSizeRow>> {
        estimate_sample_sizes(series, effects, self.alpha, self.beta)
    }
}
