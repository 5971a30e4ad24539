// CLI integration tests: every subcommand end to end over temp JSON files
#![allow(deprecated)] // Command::cargo_bin is deprecated but still functional

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn abdesign() -> Command {
    Command::cargo_bin("abdesign").unwrap()
}

fn write_json(dir: &TempDir, name: &str, value: &Value) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
    path
}

/// 40 pilot and 40 control values around 100
fn write_samples(dir: &TempDir) -> (PathBuf, PathBuf) {
    let pilot: Vec<f64> = (0..40).map(|i| 95.0 + (i % 11) as f64).collect();
    let control: Vec<f64> = (0..40).map(|i| 95.0 + ((i * 7) % 11) as f64).collect();
    (
        write_json(dir, "pilot.json", &json!(pilot)),
        write_json(dir, "control.json", &json!(control)),
    )
}

fn write_population(dir: &TempDir) -> PathBuf {
    let records: Vec<Value> = (0..200)
        .map(|i| json!({"id": i, "segment": if i % 4 == 0 { "A" } else { "B" }}))
        .collect();
    write_json(dir, "population.json", &Value::Array(records))
}

// ============================================================================
// sample-size
// ============================================================================

#[test]
fn test_sample_size_from_moments() {
    abdesign()
        .args(["sample-size", "--mean", "100", "--std", "20", "--effects", "1.05"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SAMPLE SIZE"))
        .stdout(predicate::str::contains("252"));
}

#[test]
fn test_sample_size_from_metric_file_json() {
    let dir = TempDir::new().unwrap();
    let history = write_json(
        &dir,
        "history.json",
        &json!([{"revenue": 80.0}, {"revenue": 120.0}, {"revenue": 80.0}, {"revenue": 120.0}]),
    );

    let output = abdesign()
        .arg("sample-size")
        .arg("--metric-file")
        .arg(&history)
        .args(["--metric", "revenue", "--effects", "1.05,1.10", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["command"], "sample-size");
    assert_eq!(json["result"]["sample_sizes"][0]["sample_size"], 252);
    assert_eq!(json["result"]["sample_sizes"][1]["effect"], 1.1);
}

#[test]
fn test_sample_size_absolute_effect_csv() {
    abdesign()
        .args(["sample-size", "--epsilon", "5", "--std", "20", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("effect,sample_size"))
        .stdout(predicate::str::contains("5,252"));
}

#[test]
fn test_sample_size_degenerate_effect_fails() {
    abdesign()
        .args(["sample-size", "--mean", "0", "--std", "20", "--effects", "1.05"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Degenerate effect"));
}

#[test]
fn test_sample_size_config_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("abdesign.toml");
    fs::write(&config, "alpha = 0.01\nbeta = 0.1\n").unwrap();

    abdesign()
        .arg("--config")
        .arg(&config)
        .args(["sample-size", "--mean", "100", "--std", "20", "--effects", "1.05"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alpha=0.01"))
        .stdout(predicate::str::contains("power=90%"));
}

// ============================================================================
// split
// ============================================================================

#[test]
fn test_split_json_groups() {
    let dir = TempDir::new().unwrap();
    let population = write_population(&dir);

    let output = abdesign()
        .arg("split")
        .arg("--population")
        .arg(&population)
        .args(["--strata", "segment", "--group-size", "20", "--seed", "42", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["parameters"]["seed"], 42);
    let pilot = json["result"]["groups"]["pilot"].as_array().unwrap();
    let control = json["result"]["groups"]["control"].as_array().unwrap();
    assert_eq!(pilot.len(), 20);
    assert_eq!(control.len(), 20);
    let a_count = pilot.iter().filter(|r| r["segment"] == "A").count();
    assert_eq!(a_count, 5);
    assert!(pilot.iter().all(|p| !control.contains(p)));
}

#[test]
fn test_split_same_seed_same_output() {
    let dir = TempDir::new().unwrap();
    let population = write_population(&dir);
    let run = || {
        abdesign()
            .arg("split")
            .arg("--population")
            .arg(&population)
            .args(["--strata", "segment", "--group-size", "10", "--seed", "7", "--format", "csv"])
            .output()
            .unwrap()
            .stdout
    };
    let first = run();
    assert!(String::from_utf8_lossy(&first).starts_with("group,unit_id,id,segment"));
    assert_eq!(first, run());
}

#[test]
fn test_split_insufficient_data() {
    let dir = TempDir::new().unwrap();
    let population = write_population(&dir);
    abdesign()
        .arg("split")
        .arg("--population")
        .arg(&population)
        .args(["--strata", "segment", "--group-size", "150"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Insufficient data in stratum (A)"));
}

#[test]
fn test_split_with_weights_file() {
    let dir = TempDir::new().unwrap();
    let population = write_population(&dir);
    let weights = write_json(
        &dir,
        "weights.json",
        &json!([{"key": ["A"], "weight": 0.5}, {"key": ["B"], "weight": 0.5}]),
    );
    abdesign()
        .arg("split")
        .arg("--population")
        .arg(&population)
        .arg("--weights")
        .arg(&weights)
        .args(["--strata", "segment", "--group-size", "10", "--seed", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(A) weight=0.5000 quota=5 available=50"));
}

// ============================================================================
// type1 / type2
// ============================================================================

#[test]
fn test_type1_text_report() {
    let dir = TempDir::new().unwrap();
    let (pilot, control) = write_samples(&dir);
    abdesign()
        .arg("type1")
        .arg("--pilot")
        .arg(&pilot)
        .arg("--control")
        .arg(&control)
        .args(["--iterations", "500", "--seed", "42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("TYPE I ERROR (welch test, 500 replicates)"));
}

#[test]
fn test_type1_reports_seed_when_unseeded() {
    let dir = TempDir::new().unwrap();
    let (pilot, control) = write_samples(&dir);
    let output = abdesign()
        .arg("type1")
        .arg("--pilot")
        .arg(&pilot)
        .arg("--control")
        .arg(&control)
        .args(["--iterations", "100", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(json["parameters"]["seed"].is_u64());
}

#[test]
fn test_type2_json_rates() {
    let dir = TempDir::new().unwrap();
    let (pilot, control) = write_samples(&dir);
    let output = abdesign()
        .arg("type2")
        .arg("--pilot")
        .arg(&pilot)
        .arg("--control")
        .arg(&control)
        .args(["--effects", "1.5,1.001", "--iterations", "400", "--seed", "3", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    let rates = json["result"]["error_rates"].as_array().unwrap();
    assert_eq!(rates.len(), 2);
    assert_eq!(rates[0]["effect"], 1.5);
    assert!(rates[0]["rate"].as_f64().unwrap() < 0.01);
    assert!(rates[1]["rate"].as_f64().unwrap() > 0.5);
    assert_eq!(json["parameters"]["test"], "welch");
}

#[test]
fn test_type2_csv_matches_json() {
    let dir = TempDir::new().unwrap();
    let (pilot, control) = write_samples(&dir);
    let run = |format: &str| {
        abdesign()
            .arg("type2")
            .arg("--pilot")
            .arg(&pilot)
            .arg("--control")
            .arg(&control)
            .args(["--effects", "1.5", "--iterations", "200", "--seed", "9", "--format", format])
            .output()
            .unwrap()
    };

    let csv = String::from_utf8(run("csv").stdout).unwrap();
    let json: Value = serde_json::from_slice(&run("json").stdout).unwrap();
    let significant = json["result"]["error_rates"][0]["significant"].as_u64().unwrap();
    assert!(csv.starts_with("effect,rate,significant,iterations\n"));
    assert!(csv.contains(&format!(",{},200", significant)));
}

#[test]
fn test_split_missing_strata_column() {
    let dir = TempDir::new().unwrap();
    let population = write_population(&dir);
    abdesign()
        .arg("split")
        .arg("--population")
        .arg(&population)
        .args(["--strata", "country", "--group-size", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("has no column `country`"));
}

#[test]
fn test_type1_rejects_single_observation() {
    let dir = TempDir::new().unwrap();
    let (pilot, _) = write_samples(&dir);
    let single = write_json(&dir, "single.json", &json!([100.0]));
    abdesign()
        .arg("type1")
        .arg("--pilot")
        .arg(&pilot)
        .arg("--control")
        .arg(&single)
        .args(["--iterations", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("`control`: the welch test needs at least 2 observations"));
}

#[test]
fn test_type1_rejects_empty_sample() {
    let dir = TempDir::new().unwrap();
    let (pilot, _) = write_samples(&dir);
    let empty = write_json(&dir, "empty.json", &json!([]));
    abdesign()
        .arg("type1")
        .arg("--pilot")
        .arg(&pilot)
        .arg("--control")
        .arg(&empty)
        .args(["--iterations", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sample is empty"));
}

// ============================================================================
// aggregate / confidence
// ============================================================================

#[test]
fn test_aggregate_daily_metrics_csv() {
    let dir = TempDir::new().unwrap();
    let sales = write_json(
        &dir,
        "sales.json",
        &json!([
            {"sale_id": 1, "date": "2024-03-01 10:00:00", "cost": 10.0, "shop": 1},
            {"sale_id": 1, "date": "2024-03-01 10:00:00", "cost": 5.0, "shop": 1},
            {"sale_id": 2, "date": "2024-03-02 12:00:00", "cost": 30.0, "shop": 2}
        ]),
    );
    abdesign()
        .arg("aggregate")
        .arg("--sales")
        .arg(&sales)
        .args(["--begin", "2024-03-01", "--end", "2024-03-04", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-03-01,15,1,15,2"))
        .stdout(predicate::str::contains("2024-03-02,30,1,30,1"))
        .stdout(predicate::str::contains("2024-03-03,0,0,0,0"));
}

#[test]
fn test_aggregate_with_filter() {
    let dir = TempDir::new().unwrap();
    let sales = write_json(
        &dir,
        "sales.json",
        &json!([
            {"sale_id": 1, "date": "2024-03-01", "cost": 10.0, "shop": 1},
            {"sale_id": 2, "date": "2024-03-01", "cost": 30.0, "shop": 2}
        ]),
    );
    abdesign()
        .arg("aggregate")
        .arg("--sales")
        .arg(&sales)
        .args(["--begin", "2024-03-01", "--end", "2024-03-02", "--filter", "shop=2", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-03-01,30,1,30,1"));
}

#[test]
fn test_confidence_interval() {
    let dir = TempDir::new().unwrap();
    let outcomes = write_json(&dir, "outcomes.json", &json!([1, 0, 1, 1, 0, 1, 0, 1]));
    abdesign()
        .arg("confidence")
        .arg("--values")
        .arg(&outcomes)
        .assert()
        .success()
        .stdout(predicate::str::contains("95% confidence interval: ["));
}

#[test]
fn test_confidence_rejects_non_binary() {
    let dir = TempDir::new().unwrap();
    let outcomes = write_json(&dir, "outcomes.json", &json!([1, 0, 2]));
    abdesign()
        .arg("confidence")
        .arg("--values")
        .arg(&outcomes)
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected 0/1 outcomes"));
}

#[test]
fn test_debug_flag_logs_to_stderr() {
    abdesign()
        .args(["--debug", "sample-size", "--mean", "100", "--std", "20", "--effects", "1.05"])
        .assert()
        .success()
        .stdout(predicate::str::contains("252"));
}
