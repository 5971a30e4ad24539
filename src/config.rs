//! Configuration for experiment design and validation
//!
//! One struct carries every tunable that the sizing, splitting and bootstrap
//! operations accept. Loadable from a TOML file so an analysis can be rerun
//! with identical parameters.
//!
//! # Example abdesign.toml
//!
//! ```toml
//! alpha = 0.05
//! beta = 0.2
//! n_iterations = 20000
//! seed = 42
//! ```

use crate::error::{ensure_probability, DesignError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default number of bootstrap replicates
pub const DEFAULT_ITERATIONS: usize = 10_000;

/// Configuration shared by all experiment design operations
///
/// # Example
/// ```
/// use abdesign::config::ExperimentConfig;
///
/// let config = ExperimentConfig::default();
/// assert_eq!(config.alpha, 0.05); // 95% confidence
/// assert_eq!(config.n_iterations, 10_000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Significance level (Type I error rate) of the test
    ///
    /// - 0.05 (default): 95% confidence level
    /// - 0.01: stricter, fewer false positives, larger samples
    pub alpha: f64,

    /// Target Type II error rate used when sizing an experiment
    ///
    /// Power is `1 - beta`. Default 0.2 (80% power).
    pub beta: f64,

    /// Number of bootstrap replicates
    pub n_iterations: usize,

    /// Seed for every random draw; `None` gives a fresh draw per call
    pub seed: Option<u64>,

    /// Worker threads for the bootstrap loop
    ///
    /// Results do not depend on this value.
    pub workers: usize,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            beta: 0.2,
            n_iterations: DEFAULT_ITERATIONS,
            seed: None,
            workers: default_workers(),
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl ExperimentConfig {
    /// Strict configuration: 99% confidence, 90% power
    pub fn strict() -> Self {
        Self {
            alpha: 0.01,
            beta: 0.1,
            ..Self::default()
        }
    }

    /// Permissive configuration: 90% confidence, 70% power
    pub fn permissive() -> Self {
        Self {
            alpha: 0.10,
            beta: 0.3,
            ..Self::default()
        }
    }

    /// Same configuration with a fixed seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Same configuration with a different replicate count
    pub fn with_iterations(mut self, n_iterations: usize) -> Self {
        self.n_iterations = n_iterations;
        self
    }

    /// Load configuration from a TOML file; missing fields take defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            DesignError::Parse(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| DesignError::Parse(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        ensure_probability("alpha", self.alpha)?;
        ensure_probability("beta", self.beta)?;

        if self.n_iterations == 0 {
            return Err(DesignError::invalid(
                "n_iterations",
                "must be a positive integer, got 0",
            ));
        }

        if self.workers == 0 {
            return Err(DesignError::invalid("workers", "must be >= 1, got 0"));
        }

        Ok(())
    }
}
