//! Bootstrap estimation of a test's Type I and Type II error rates
//!
//! Both estimators resample the observed pilot and control samples (with
//! replacement, same sizes) `n_iterations` times and run the significance
//! test on each replicate pair:
//!
//! - Type I: no effect injected; rate = share of significant replicates
//! - Type II: pilot replicate scaled by each effect; rate = share of
//!   replicates where the test misses the injected effect
//!
//! Replicate `i` always draws from the same sub-stream of the seed, and the
//! per-replicate verdicts are reduced by counting, so the loop is split across
//! worker threads without changing the result.

use crate::config::ExperimentConfig;
use crate::error::{ensure_probability, DesignError, Result};
use crate::random::RandomStream;
use crate::significance::{SignificanceTest, WelchTTest};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Estimated error rate for one effect size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorEstimate {
    /// Injected relative effect (1.0 = no effect, Type I)
    pub effect: f64,

    /// Estimated error rate in [0, 1]
    pub rate: f64,

    /// Replicates the test flagged as significant
    pub significant: usize,

    /// Replicates evaluated
    pub iterations: usize,
}

/// Bootstrap error-rate estimator over a pluggable significance test
///
/// # Example
/// ```
/// use abdesign::bootstrap::BootstrapErrorEstimator;
/// use abdesign::config::ExperimentConfig;
/// use abdesign::significance::WelchTTest;
///
/// let pilot: Vec<f64> = (0..50).map(|i| 100.0 + (i % 10) as f64).collect();
/// let control = pilot.clone();
/// let config = ExperimentConfig::default().with_seed(42).with_iterations(500);
///
/// let estimator = BootstrapErrorEstimator::new(WelchTTest, &config);
/// let type_ii = estimator.estimate_type_ii_error(&pilot, &control, &[1.5]).unwrap();
/// assert!(type_ii[0].rate < 0.01);
/// ```
#[derive(Debug, Clone)]
pub struct BootstrapErrorEstimator<T = WelchTTest> {
    test: T,
    alpha: f64,
    n_iterations: usize,
    seed: u64,
    workers: usize,
}

impl Default for BootstrapErrorEstimator<WelchTTest> {
    fn default() -> Self {
        Self::new(WelchTTest, &ExperimentConfig::default())
    }
}

impl<T: SignificanceTest> BootstrapErrorEstimator<T> {
    pub fn new(test: T, config: &ExperimentConfig) -> Self {
        Self {
            test,
            alpha: config.alpha,
            n_iterations: config.n_iterations,
            // An unseeded estimator fixes its seed once so every call replays
            seed: RandomStream::new(config.seed).seed(),
            workers: config.workers.max(1),
        }
    }

    pub fn test(&self) -> &T {
        &self.test
    }

    /// Base seed of every replicate stream
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Empirical false-positive rate of the test on these two samples
    ///
    /// Only approaches `alpha` when pilot and control truly share a
    /// distribution; otherwise it measures the power to detect the difference
    /// already present.
    pub fn estimate_type_i_error(&self, pilot: &[f64], control: &[f64]) -> Result<ErrorEstimate> {
        let counts = self.count_significant(pilot, control, &[1.0])?;
        let estimate = ErrorEstimate {
            effect: 1.0,
            rate: counts[0] as f64 / self.n_iterations as f64,
            significant: counts[0],
            iterations: self.n_iterations,
        };

        tracing::info!(
            "Type I error ({}): {:.4} over {} replicates",
            self.test.name(),
            estimate.rate,
            self.n_iterations
        );
        Ok(estimate)
    }

    /// Empirical false-negative rate for each injected relative effect
    ///
    /// One estimate per effect, in input order. Every effect is evaluated on
    /// the same replicate pairs; only the scale applied to the pilot side
    /// differs.
    pub fn estimate_type_ii_error(
        &self,
        pilot: &[f64],
        control: &[f64],
        effects: &[f64],
    ) -> Result<Vec<ErrorEstimate>> {
        if effects.is_empty() {
            return Err(DesignError::invalid("effects", "at least one effect is required"));
        }
        if let Some(bad) = effects.iter().find(|e| !e.is_finite()) {
            return Err(DesignError::invalid("effects", format!("effect must be finite, got {}", bad)));
        }

        let counts = self.count_significant(pilot, control, effects)?;
        let estimates: Vec<ErrorEstimate> = effects
            .iter()
            .zip(counts)
            .map(|(&effect, significant)| ErrorEstimate {
                effect,
                rate: 1.0 - significant as f64 / self.n_iterations as f64,
                significant,
                iterations: self.n_iterations,
            })
            .collect();

        for estimate in &estimates {
            tracing::info!(
                "Type II error ({}) at effect {}: {:.4}",
                self.test.name(),
                estimate.effect,
                estimate.rate
            );
        }
        Ok(estimates)
    }

    fn validate(&self, pilot: &[f64], control: &[f64]) -> Result<()> {
        // Resamples keep the input sizes, so the test's minimum applies here
        let required = self.test.min_sample_size().max(1);
        for (name, sample) in [("pilot", pilot), ("control", control)] {
            if sample.is_empty() {
                return Err(DesignError::invalid(name, "sample is empty"));
            }
            if sample.len() < required {
                return Err(DesignError::invalid(
                    name,
                    format!(
                        "the {} test needs at least {} observations, got {}",
                        self.test.name(),
                        required,
                        sample.len()
                    ),
                ));
            }
        }
        if self.n_iterations == 0 {
            return Err(DesignError::invalid(
                "n_iterations",
                "must be a positive integer, got 0",
            ));
        }
        ensure_probability("alpha", self.alpha)
    }

    /// Significant replicate count for each pilot scale
    fn count_significant(&self, pilot: &[f64], control: &[f64], scales: &[f64]) -> Result<Vec<usize>> {
        self.validate(pilot, control)?;

        let base = RandomStream::seeded(self.seed);
        let workers = self.workers.min(self.n_iterations);
        let chunk = self.n_iterations.div_ceil(workers);
        let ranges: Vec<Range<usize>> = (0..workers)
            .map(|w| (w * chunk)..((w + 1) * chunk).min(self.n_iterations))
            .filter(|r| !r.is_empty())
            .collect();

        tracing::debug!(
            "Bootstrapping {} replicates (pilot n={}, control n={}) on {} workers, seed={}",
            self.n_iterations,
            pilot.len(),
            control.len(),
            ranges.len(),
            base.seed()
        );

        let partials: Vec<Result<Vec<usize>>> = if ranges.len() == 1 {
            ranges
                .into_iter()
                .map(|range| self.run_replicates(&base, range, pilot, control, scales))
                .collect()
        } else {
            let base = &base;
            crossbeam::scope(|scope| {
                let handles: Vec<_> = ranges
                    .into_iter()
                    .map(|range| {
                        scope.spawn(move |_| self.run_replicates(base, range, pilot, control, scales))
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| {
                        handle.join().unwrap_or_else(|_| {
                            Err(DesignError::Numeric("bootstrap worker panicked".to_string()))
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .map_err(|_| DesignError::Numeric("bootstrap worker panicked".to_string()))?
        };

        let mut totals = vec![0usize; scales.len()];
        for partial in partials {
            for (total, count) in totals.iter_mut().zip(partial?) {
                *total += count;
            }
        }
        Ok(totals)
    }

    fn run_replicates(
        &self,
        base: &RandomStream,
        range: Range<usize>,
        pilot: &[f64],
        control: &[f64],
        scales: &[f64],
    ) -> Result<Vec<usize>> {
        let mut counts = vec![0usize; scales.len()];
        let mut pilot_resample = Vec::with_capacity(pilot.len());
        let mut control_resample = Vec::with_capacity(control.len());
        let mut scaled = Vec::with_capacity(pilot.len());

        for replicate in range {
            let mut rng = base.replicate(replicate as u64);
            rng.resample_into(pilot, &mut pilot_resample);
            rng.resample_into(control, &mut control_resample);

            for (count, &scale) in counts.iter_mut().zip(scales) {
                let treated: &[f64] = if scale == 1.0 {
                    &pilot_resample
                } else {
                    scaled.clear();
                    scaled.extend(pilot_resample.iter().map(|v| v * scale));
                    &scaled
                };
                if self.test.is_significant(treated, &control_resample, self.alpha)? {
                    *count += 1;
                }
            }
        }

        Ok(counts)
    }
}

/// Type I error of Welch's t-test on these samples
pub fn estimate_type_i_error(
    pilot: &[f64],
    control: &[f64],
    alpha: f64,
    n_iterations: usize,
    seed: Option<u64>,
) -> Result<f64> {
    let config = ExperimentConfig {
        alpha,
        n_iterations,
        seed,
        ..ExperimentConfig::default()
    };
    BootstrapErrorEstimator::new(WelchTTest, &config)
        .estimate_type_i_error(pilot, control)
        .map(|estimate| estimate.rate)
}

/// Type II error of Welch's t-test for each effect, in input order
pub fn estimate_type_ii_error(
    pilot: &[f64],
    control: &[f64],
    effects: &[f64],
    alpha: f64,
    n_iterations: usize,
    seed: Option<u64>,
) -> Result<Vec<ErrorEstimate>> {
    let config = ExperimentConfig {
        alpha,
        n_iterations,
        seed,
        ..ExperimentConfig::default()
    };
    BootstrapErrorEstimator::new(WelchTTest, &config).estimate_type_ii_error(pilot, control, effects)
}
