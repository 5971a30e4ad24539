//! abdesign - experiment design and validation toolkit
//!
//! This library sizes controlled experiments, splits populations into
//! stratified pilot/control groups, and validates a significance test's
//! Type I and Type II error rates by bootstrap resampling.

pub mod aggregation;
pub mod bootstrap;
pub mod cli;
pub mod confidence;
pub mod config;
pub mod csv_output;
pub mod error;
pub mod json_output;
pub mod population;
pub mod random;
pub mod report;
pub mod sample_size;
pub mod series;
pub mod significance;
pub mod stratified;

pub use error::{DesignError, Result};
