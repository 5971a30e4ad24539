//! Bootstrap error-rate estimation tests
//!
//! Samples are drawn from seeded normal distributions so every assertion is
//! deterministic.

use abdesign::bootstrap::{estimate_type_i_error, estimate_type_ii_error, BootstrapErrorEstimator};
use abdesign::config::ExperimentConfig;
use abdesign::significance::{PValueFn, StudentTTest, WelchTTest};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

fn normal_sample(mean: f64, std: f64, n: usize, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let normal = Normal::new(mean, std).unwrap();
    (0..n).map(|_| normal.sample(&mut rng)).collect()
}

/// Two samples holding the same values in different order
fn matched_pair(n: usize) -> (Vec<f64>, Vec<f64>) {
    let pilot = normal_sample(100.0, 10.0, n, 7);
    let mut control = pilot.clone();
    control.shuffle(&mut ChaCha8Rng::seed_from_u64(8));
    (pilot, control)
}

#[test]
fn test_type_i_error_close_to_alpha() {
    let (pilot, control) = matched_pair(200);
    let rate = estimate_type_i_error(&pilot, &control, 0.05, 20_000, Some(42)).unwrap();
    assert!(
        (0.03..=0.07).contains(&rate),
        "Type I error {} outside [0.03, 0.07]",
        rate
    );
}

#[test]
fn test_type_i_error_tracks_alpha() {
    let (pilot, control) = matched_pair(200);
    let strict = estimate_type_i_error(&pilot, &control, 0.01, 5_000, Some(3)).unwrap();
    let loose = estimate_type_i_error(&pilot, &control, 0.10, 5_000, Some(3)).unwrap();
    assert!(strict < loose);
    assert!(strict <= 0.03);
}

#[test]
fn test_large_effect_is_almost_always_detected() {
    let (pilot, control) = matched_pair(200);
    let estimates = estimate_type_ii_error(&pilot, &control, &[1.5], 0.05, 2_000, Some(42)).unwrap();
    assert_eq!(estimates.len(), 1);
    assert!(estimates[0].rate < 0.01, "Type II error {}", estimates[0].rate);
}

#[test]
fn test_type_ii_error_shrinks_with_effect() {
    let (pilot, control) = matched_pair(200);
    let effects = [1.005, 1.02, 1.5];
    let estimates = estimate_type_ii_error(&pilot, &control, &effects, 0.05, 2_000, Some(11)).unwrap();
    assert!(estimates[0].rate > estimates[1].rate);
    assert!(estimates[1].rate > estimates[2].rate);
    for (estimate, effect) in estimates.iter().zip(effects) {
        assert_eq!(estimate.effect, effect);
        assert!((0.0..=1.0).contains(&estimate.rate));
    }
}

#[test]
fn test_seed_makes_estimates_reproducible() {
    let pilot = normal_sample(50.0, 5.0, 80, 1);
    let control = normal_sample(50.5, 5.0, 80, 2);
    let a = estimate_type_ii_error(&pilot, &control, &[1.01, 1.03], 0.05, 1_000, Some(99)).unwrap();
    let b = estimate_type_ii_error(&pilot, &control, &[1.01, 1.03], 0.05, 1_000, Some(99)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_parallel_and_serial_runs_agree() {
    let pilot = normal_sample(10.0, 2.0, 60, 4);
    let control = normal_sample(10.1, 2.0, 60, 5);
    let serial = ExperimentConfig {
        n_iterations: 1_003,
        seed: Some(17),
        workers: 1,
        ..ExperimentConfig::default()
    };
    let parallel = ExperimentConfig {
        workers: 8,
        ..serial.clone()
    };
    let a = BootstrapErrorEstimator::new(WelchTTest, &serial)
        .estimate_type_i_error(&pilot, &control)
        .unwrap();
    let b = BootstrapErrorEstimator::new(WelchTTest, &parallel)
        .estimate_type_i_error(&pilot, &control)
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_student_test_is_pluggable() {
    let (pilot, control) = matched_pair(150);
    let config = ExperimentConfig::default().with_seed(5).with_iterations(2_000);
    let estimator = BootstrapErrorEstimator::new(StudentTTest, &config);
    let estimate = estimator.estimate_type_i_error(&pilot, &control).unwrap();
    assert!(estimate.rate < 0.1, "Type I error {}", estimate.rate);
}

#[test]
fn test_custom_test_closure() {
    // Flags replicates whose pilot mean exceeds the control mean
    let higher_mean = PValueFn::new("higher-mean", |a: &[f64], b: &[f64]| {
        let mean = |xs: &[f64]| xs.iter().sum::<f64>() / xs.len() as f64;
        Ok(if mean(a) > mean(b) { 0.0 } else { 1.0 })
    });
    let pilot = normal_sample(100.0, 1.0, 100, 12);
    let control = normal_sample(90.0, 1.0, 100, 13);
    let config = ExperimentConfig::default().with_seed(1).with_iterations(500);
    let estimator = BootstrapErrorEstimator::new(higher_mean, &config);
    assert_eq!(estimator.estimate_type_i_error(&pilot, &control).unwrap().rate, 1.0);
}
