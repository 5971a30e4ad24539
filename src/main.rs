use abdesign::aggregation::{parse_date, SalesAggregation};
use abdesign::bootstrap::BootstrapErrorEstimator;
use abdesign::cli::{
    AggregateArgs, BootstrapArgs, Cli, Command, ConfidenceArgs, OutputFormat, SampleSizeArgs,
    SplitArgs, Type2Args,
};
use abdesign::confidence::bernoulli_confidence_interval;
use abdesign::config::ExperimentConfig;
use abdesign::csv_output::CsvTable;
use abdesign::json_output::{JsonGroups, JsonOutput, JsonParameters, JsonResult};
use abdesign::population::{weights_from_json, Population};
use abdesign::report;
use abdesign::sample_size::{SampleSizeEstimator, SampleSizeRow};
use abdesign::series::MetricSeries;
use abdesign::significance::SignificanceTest;
use abdesign::stratified::split_stratified;
use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn read_series(path: &Path, column: Option<&str>) -> Result<MetricSeries> {
    let value = read_json(path)?;
    MetricSeries::from_json(&value, column)
        .with_context(|| format!("Failed to read metric values from {}", path.display()))
}

/// Config file (or defaults) with command-line overrides applied
fn load_config(cli: &Cli) -> Result<ExperimentConfig> {
    let mut config = match &cli.config {
        Some(path) => ExperimentConfig::from_file(path)?,
        None => ExperimentConfig::default(),
    };
    if let Some(alpha) = cli.alpha {
        config.alpha = alpha;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    Ok(config)
}

/// Print a result in the requested format; only the chosen rendering runs
fn emit(
    format: OutputFormat,
    command: &str,
    parameters: JsonParameters,
    text: impl FnOnce() -> String,
    csv: impl FnOnce() -> CsvTable,
    json: impl FnOnce() -> JsonResult,
) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", text()),
        OutputFormat::Csv => print!("{}", csv().to_csv()),
        OutputFormat::Json => {
            let output = JsonOutput::new(command, parameters, json());
            println!("{}", output.to_json()?);
        }
    }
    Ok(())
}

fn run_sample_size(args: SampleSizeArgs, mut config: ExperimentConfig, format: OutputFormat) -> Result<()> {
    if let Some(beta) = args.beta {
        config.beta = beta;
    }
    config.validate()?;
    let estimator = SampleSizeEstimator::from_config(&config);

    let rows = match (args.epsilon, args.metric_file, args.mean, args.std) {
        (Some(epsilon), _, _, Some(std)) => vec![SampleSizeRow {
            effect: epsilon,
            sample_size: estimator.for_absolute_effect(epsilon, std)?,
        }],
        (None, Some(path), _, _) => {
            let series = read_series(&path, args.metric.as_deref())?;
            estimator.for_series(&series, &args.effects)?
        }
        (None, None, Some(mean), Some(std)) => args
            .effects
            .iter()
            .map(|&effect| {
                estimator
                    .for_relative_effect(mean, std, effect)
                    .map(|sample_size| SampleSizeRow { effect, sample_size })
            })
            .collect::<abdesign::Result<Vec<_>>>()?,
        _ => anyhow::bail!(
            "Specify --metric-file, or --mean and --std, or --epsilon and --std"
        ),
    };

    let parameters = JsonParameters {
        alpha: Some(config.alpha),
        beta: Some(config.beta),
        ..JsonParameters::default()
    };
    emit(
        format,
        "sample-size",
        parameters,
        || report::sample_size_report(&rows, config.alpha, config.beta),
        || CsvTable::from_sample_sizes(&rows),
        || JsonResult::SampleSizes(rows.clone()),
    )
}

fn run_split(args: SplitArgs, config: ExperimentConfig, format: OutputFormat) -> Result<()> {
    let population = Population::from_json(&read_json(&args.population)?, &args.id_column)
        .with_context(|| format!("Failed to load population from {}", args.population.display()))?;
    let weights = match &args.weights {
        Some(path) => Some(weights_from_json(&read_json(path)?)?),
        None => None,
    };

    let assignment = split_stratified(
        &population,
        &args.strata,
        args.group_size,
        weights.as_ref(),
        config.seed,
    )?;

    let parameters = JsonParameters {
        seed: Some(assignment.seed),
        ..JsonParameters::default()
    };
    emit(
        format,
        "split",
        parameters,
        || report::split_report(&assignment),
        || CsvTable::from_assignment(&assignment),
        || JsonResult::Groups(JsonGroups::from(&assignment)),
    )
}

fn bootstrap_setup(
    args: &BootstrapArgs,
    mut config: ExperimentConfig,
) -> Result<(MetricSeries, MetricSeries, ExperimentConfig)> {
    if let Some(iterations) = args.iterations {
        config.n_iterations = iterations;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    config.validate()?;

    let pilot = read_series(&args.pilot, args.metric.as_deref())?;
    let control = read_series(&args.control, args.metric.as_deref())?;
    Ok((pilot, control, config))
}

fn bootstrap_parameters(config: &ExperimentConfig, test: &str, seed: u64) -> JsonParameters {
    JsonParameters {
        alpha: Some(config.alpha),
        n_iterations: Some(config.n_iterations),
        seed: Some(seed),
        test: Some(test.to_string()),
        ..JsonParameters::default()
    }
}

fn run_type1(args: BootstrapArgs, config: ExperimentConfig, format: OutputFormat) -> Result<()> {
    let (pilot, control, config) = bootstrap_setup(&args, config)?;
    let estimator = BootstrapErrorEstimator::new(args.test.build(), &config);
    let test_name = estimator.test().name();
    let estimate = estimator.estimate_type_i_error(pilot.values(), control.values())?;

    let estimates = vec![estimate];
    emit(
        format,
        "type1",
        bootstrap_parameters(&config, test_name, estimator.seed()),
        || report::error_rate_report("TYPE I", test_name, &estimates),
        || CsvTable::from_error_estimates(&estimates),
        || JsonResult::ErrorRates(estimates.clone()),
    )
}

fn run_type2(args: Type2Args, config: ExperimentConfig, format: OutputFormat) -> Result<()> {
    let (pilot, control, config) = bootstrap_setup(&args.bootstrap, config)?;
    let estimator = BootstrapErrorEstimator::new(args.bootstrap.test.build(), &config);
    let test_name = estimator.test().name();
    let estimates =
        estimator.estimate_type_ii_error(pilot.values(), control.values(), &args.effects)?;

    emit(
        format,
        "type2",
        bootstrap_parameters(&config, test_name, estimator.seed()),
        || report::error_rate_report("TYPE II", test_name, &estimates),
        || CsvTable::from_error_estimates(&estimates),
        || JsonResult::ErrorRates(estimates.clone()),
    )
}

/// Parse `field=v1,v2`; values are JSON literals when they parse, else strings
fn parse_filter(expr: &str) -> Result<(String, Vec<Value>)> {
    let (field, values) = expr
        .split_once('=')
        .with_context(|| format!("Invalid filter `{}` (expected FIELD=V1,V2)", expr))?;
    let allowed = values
        .split(',')
        .map(|v| serde_json::from_str(v).unwrap_or_else(|_| Value::String(v.to_string())))
        .collect();
    Ok((field.to_string(), allowed))
}

fn run_aggregate(args: AggregateArgs, format: OutputFormat) -> Result<()> {
    let mut aggregation = SalesAggregation::new(parse_date(&args.begin)?, parse_date(&args.end)?);
    aggregation.cost_column = args.cost;
    aggregation.date_column = args.date;
    aggregation.sale_id_column = args.sale_id;
    for expr in &args.filters {
        let (field, allowed) = parse_filter(expr)?;
        aggregation = aggregation.with_filter(field, allowed);
    }

    let records = read_json(&args.sales)?;
    let rows = records
        .as_array()
        .with_context(|| format!("{} must hold a JSON array", args.sales.display()))?;
    let days = aggregation.aggregate(rows)?;

    emit(
        format,
        "aggregate",
        JsonParameters::default(),
        || report::daily_metrics_report(&days),
        || CsvTable::from_daily_metrics(&days),
        || JsonResult::DailyMetrics(days.clone()),
    )
}

fn run_confidence(args: ConfidenceArgs, format: OutputFormat) -> Result<()> {
    let series = read_series(&args.values, args.metric.as_deref())?;
    let interval = bernoulli_confidence_interval(series.values())?;

    emit(
        format,
        "confidence",
        JsonParameters::default(),
        || report::interval_report(&interval),
        || CsvTable::from_interval(&interval),
        || JsonResult::ConfidenceInterval(interval),
    )
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(cli.debug);

    let config = load_config(&cli)?;
    let format = cli.format;

    match cli.command {
        Command::SampleSize(args) => run_sample_size(args, config, format),
        Command::Split(args) => run_split(args, config, format),
        Command::Type1(args) => run_type1(args, config, format),
        Command::Type2(args) => run_type2(args, config, format),
        Command::Aggregate(args) => run_aggregate(args, format),
        Command::Confidence(args) => run_confidence(args, format),
    }
}
