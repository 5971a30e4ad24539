//! Pluggable two-sample significance tests
//!
//! The bootstrap estimator only relies on the boolean contract
//! "two samples + alpha -> significant?", so any test can be plugged in:
//!
//! - [`WelchTTest`] (default): difference in means, unequal variances
//! - [`StudentTTest`]: pooled-variance t-test
//! - [`ProportionZTest`]: difference in proportions for 0/1 outcomes
//! - [`PValueFn`]: wrap any closure returning a p-value

use crate::error::{ensure_probability, DesignError, Result};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};
use statrs::statistics::Statistics;

/// Decision procedure over two numeric samples
///
/// Implementations must be pure: the verdict depends only on the inputs.
pub trait SignificanceTest: Send + Sync {
    /// Short name used in logs and reports
    fn name(&self) -> &'static str;

    /// Fewest observations each sample must hold
    fn min_sample_size(&self) -> usize {
        1
    }

    /// Two-sided p-value for "the samples differ"
    fn p_value(&self, sample_a: &[f64], sample_b: &[f64]) -> Result<f64>;

    /// True when the p-value is strictly below `alpha`
    fn is_significant(&self, sample_a: &[f64], sample_b: &[f64], alpha: f64) -> Result<bool> {
        ensure_probability("alpha", alpha)?;
        Ok(self.p_value(sample_a, sample_b)? < alpha)
    }
}

impl<T: SignificanceTest + ?Sized> SignificanceTest for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn min_sample_size(&self) -> usize {
        (**self).min_sample_size()
    }

    fn p_value(&self, sample_a: &[f64], sample_b: &[f64]) -> Result<f64> {
        (**self).p_value(sample_a, sample_b)
    }

    fn is_significant(&self, sample_a: &[f64], sample_b: &[f64], alpha: f64) -> Result<bool> {
        (**self).is_significant(sample_a, sample_b, alpha)
    }
}

fn ensure_samples(sample_a: &[f64], sample_b: &[f64], min_len: usize) -> Result<()> {
    for (name, sample) in [("sample_a", sample_a), ("sample_b", sample_b)] {
        if sample.is_empty() {
            return Err(DesignError::invalid(name, "sample is empty"));
        }
        if sample.len() < min_len {
            return Err(DesignError::invalid(
                name,
                format!("need at least {} observations, got {}", min_len, sample.len()),
            ));
        }
    }
    Ok(())
}

/// Two-sided p-value of a t statistic with `df` degrees of freedom
fn t_p_value(t: f64, df: f64) -> Result<f64> {
    if !t.is_finite() || !df.is_finite() {
        return Err(DesignError::Numeric(format!(
            "t statistic {} with {} degrees of freedom",
            t, df
        )));
    }
    let dist = StudentsT::new(0.0, 1.0, df).map_err(|e| DesignError::Numeric(e.to_string()))?;
    Ok((2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0))
}

/// p-value when the standard error vanishes: identical constants never
/// differ, distinct constants always do
fn degenerate_p_value(mean_a: f64, mean_b: f64) -> f64 {
    if mean_a == mean_b {
        1.0
    } else {
        0.0
    }
}

/// Welch's unequal-variance t-test (two-sided)
///
/// Computed in f64 with statrs; aprender's `ttest_ind` works in f32, which
/// loses the spread of large-magnitude metrics.
///
/// # Example
/// ```
/// use abdesign::significance::{SignificanceTest, WelchTTest};
///
/// let baseline = [10.0, 12.0, 11.0, 13.0, 10.0];
/// let treated = [25.0, 27.0, 26.0, 28.0, 25.0];
/// assert!(WelchTTest.is_significant(&baseline, &treated, 0.05).unwrap());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct WelchTTest;

impl SignificanceTest for WelchTTest {
    fn name(&self) -> &'static str {
        "welch"
    }

    fn min_sample_size(&self) -> usize {
        2
    }

    fn p_value(&self, sample_a: &[f64], sample_b: &[f64]) -> Result<f64> {
        ensure_samples(sample_a, sample_b, self.min_sample_size())?;

        let n_a = sample_a.len() as f64;
        let n_b = sample_b.len() as f64;
        let mean_a = sample_a.mean();
        let mean_b = sample_b.mean();
        let se_a = sample_a.variance() / n_a;
        let se_b = sample_b.variance() / n_b;
        let se_squared = se_a + se_b;

        if se_squared <= 0.0 {
            return Ok(degenerate_p_value(mean_a, mean_b));
        }

        let t = (mean_a - mean_b) / se_squared.sqrt();
        // Welch-Satterthwaite degrees of freedom
        let df = se_squared.powi(2) / (se_a.powi(2) / (n_a - 1.0) + se_b.powi(2) / (n_b - 1.0));

        t_p_value(t, df)
    }
}

/// Student's pooled-variance t-test (two-sided)
///
/// Assumes equal variances: `df = n_a + n_b - 2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StudentTTest;

impl SignificanceTest for StudentTTest {
    fn name(&self) -> &'static str {
        "student"
    }

    fn min_sample_size(&self) -> usize {
        2
    }

    fn p_value(&self, sample_a: &[f64], sample_b: &[f64]) -> Result<f64> {
        ensure_samples(sample_a, sample_b, self.min_sample_size())?;

        let n_a = sample_a.len() as f64;
        let n_b = sample_b.len() as f64;
        let mean_a = sample_a.mean();
        let mean_b = sample_b.mean();
        let df = n_a + n_b - 2.0;
        let pooled = ((n_a - 1.0) * sample_a.variance() + (n_b - 1.0) * sample_b.variance()) / df;
        let se_squared = pooled * (1.0 / n_a + 1.0 / n_b);

        if se_squared <= 0.0 {
            return Ok(degenerate_p_value(mean_a, mean_b));
        }

        t_p_value((mean_a - mean_b) / se_squared.sqrt(), df)
    }
}

/// Pooled two-proportion z-test for binary (0/1) outcomes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProportionZTest;

impl SignificanceTest for ProportionZTest {
    fn name(&self) -> &'static str {
        "proportion"
    }

    fn p_value(&self, sample_a: &[f64], sample_b: &[f64]) -> Result<f64> {
        ensure_samples(sample_a, sample_b, 1)?;

        if let Some(bad) = sample_a
            .iter()
            .chain(sample_b.iter())
            .find(|v| !(0.0..=1.0).contains(*v))
        {
            return Err(DesignError::invalid(
                "sample",
                format!("proportion test needs values in [0, 1], got {}", bad),
            ));
        }

        let n_a = sample_a.len() as f64;
        let n_b = sample_b.len() as f64;
        let p_a = sample_a.mean();
        let p_b = sample_b.mean();
        let pooled = (p_a * n_a + p_b * n_b) / (n_a + n_b);
        let se = (pooled * (1.0 - pooled) * (1.0 / n_a + 1.0 / n_b)).sqrt();

        if se <= 0.0 {
            return Ok(degenerate_p_value(p_a, p_b));
        }

        let z = (p_a - p_b) / se;
        let normal = Normal::new(0.0, 1.0).map_err(|e| DesignError::Numeric(e.to_string()))?;
        Ok((2.0 * (1.0 - normal.cdf(z.abs()))).clamp(0.0, 1.0))
    }
}

/// Adapter turning a p-value closure into a [`SignificanceTest`]
pub struct PValueFn<F> {
    name: &'static str,
    func: F,
}

impl<F> PValueFn<F>
where
    F: Fn(&[f64], &[f64]) -> Result<f64> + Send + Sync,
{
    pub fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> SignificanceTest for PValueFn<F>
where
    F: Fn(&[f64], &[f64]) -> Result<f64> + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn p_value(&self, sample_a: &[f64], sample_b: &[f64]) -> Result<f64> {
        (self.func)(sample_a, sample_b)
    }
}
