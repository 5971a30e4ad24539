//! CLI argument parsing for abdesign

use crate::significance::{ProportionZTest, SignificanceTest, StudentTTest, WelchTTest};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

/// Significance test used by the bootstrap estimators
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TestKind {
    /// Welch's unequal-variance t-test (default)
    Welch,
    /// Student's pooled-variance t-test
    Student,
    /// Two-proportion z-test for 0/1 metrics
    Proportion,
}

impl TestKind {
    pub fn build(self) -> Box<dyn SignificanceTest> {
        match self {
            TestKind::Welch => Box::new(WelchTTest),
            TestKind::Student => Box::new(StudentTTest),
            TestKind::Proportion => Box::new(ProportionZTest),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "abdesign")]
#[command(version)]
#[command(about = "Design and validate A/B experiments: sample size, stratified groups, bootstrap error rates", long_about = None)]
pub struct Cli {
    /// Load experiment parameters from a TOML file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Significance level (overrides config file)
    #[arg(long, global = true, value_name = "ALPHA")]
    pub alpha: Option<f64>,

    /// Random seed for reproducible draws (overrides config file)
    #[arg(long, global = true, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Enable debug tracing to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Minimum per-group sample size for each relative effect
    SampleSize(SampleSizeArgs),
    /// Split a population into stratified pilot and control groups
    Split(SplitArgs),
    /// Estimate the Type I error of a test by bootstrap
    Type1(BootstrapArgs),
    /// Estimate the Type II error of a test for injected effects
    Type2(Type2Args),
    /// Aggregate sales records into daily metrics
    Aggregate(AggregateArgs),
    /// Confidence interval for a 0/1 outcome column
    Confidence(ConfidenceArgs),
}

#[derive(Args, Debug)]
pub struct SampleSizeArgs {
    /// Relative effects to size for (e.g., 1.03 = +3%)
    #[arg(long, value_delimiter = ',', required_unless_present = "epsilon")]
    pub effects: Vec<f64>,

    /// Target Type II error (overrides config file)
    #[arg(long, value_name = "BETA")]
    pub beta: Option<f64>,

    /// JSON file with historical metric values
    #[arg(long, value_name = "FILE", conflicts_with_all = ["mean", "std"])]
    pub metric_file: Option<PathBuf>,

    /// Metric column when the file holds records
    #[arg(long, value_name = "COLUMN")]
    pub metric: Option<String>,

    /// Metric mean (with --std, instead of --metric-file)
    #[arg(long, requires = "std")]
    pub mean: Option<f64>,

    /// Metric standard deviation
    #[arg(long)]
    pub std: Option<f64>,

    /// Absolute effect to size for (with --std)
    #[arg(long, requires = "std", conflicts_with = "metric_file")]
    pub epsilon: Option<f64>,
}

#[derive(Args, Debug)]
pub struct SplitArgs {
    /// JSON file with population records
    #[arg(long, value_name = "FILE")]
    pub population: PathBuf,

    /// Stratification columns
    #[arg(long, value_delimiter = ',', required = true)]
    pub strata: Vec<String>,

    /// Units per group
    #[arg(long)]
    pub group_size: usize,

    /// JSON file with explicit stratum weights
    #[arg(long, value_name = "FILE")]
    pub weights: Option<PathBuf>,

    /// Column holding the unit identifier (row index when absent)
    #[arg(long, default_value = "id")]
    pub id_column: String,
}

#[derive(Args, Debug)]
pub struct BootstrapArgs {
    /// JSON file with pilot group values or records
    #[arg(long, value_name = "FILE")]
    pub pilot: PathBuf,

    /// JSON file with control group values or records
    #[arg(long, value_name = "FILE")]
    pub control: PathBuf,

    /// Metric column when the files hold records
    #[arg(long, value_name = "COLUMN")]
    pub metric: Option<String>,

    /// Bootstrap replicates (overrides config file)
    #[arg(long, value_name = "N")]
    pub iterations: Option<usize>,

    /// Significance test to validate
    #[arg(long, value_enum, default_value = "welch")]
    pub test: TestKind,

    /// Worker threads (results do not depend on this)
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,
}

#[derive(Args, Debug)]
pub struct Type2Args {
    #[command(flatten)]
    pub bootstrap: BootstrapArgs,

    /// Relative effects to inject into the pilot group
    #[arg(long, value_delimiter = ',', required = true)]
    pub effects: Vec<f64>,
}

#[derive(Args, Debug)]
pub struct AggregateArgs {
    /// JSON file with sales records
    #[arg(long, value_name = "FILE")]
    pub sales: PathBuf,

    /// First day of the period (YYYY-MM-DD, included)
    #[arg(long)]
    pub begin: String,

    /// Day after the period (YYYY-MM-DD, excluded)
    #[arg(long)]
    pub end: String,

    #[arg(long, default_value = "cost")]
    pub cost: String,

    #[arg(long, default_value = "date")]
    pub date: String,

    #[arg(long, default_value = "sale_id")]
    pub sale_id: String,

    /// Keep rows whose field matches one of the values (field=v1,v2); repeatable
    #[arg(long = "filter", value_name = "FIELD=VALUES")]
    pub filters: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ConfidenceArgs {
    /// JSON file with 0/1 outcomes or records
    #[arg(long, value_name = "FILE")]
    pub values: PathBuf,

    /// Outcome column when the file holds records
    #[arg(long, value_name = "COLUMN")]
    pub metric: Option<String>,
}
