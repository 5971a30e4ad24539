//! JSON output format for experiment design results

use crate::aggregation::DailyMetrics;
use crate::bootstrap::ErrorEstimate;
use crate::confidence::ConfidenceInterval;
use crate::population::Population;
use crate::sample_size::SampleSizeRow;
use crate::stratified::{GroupAssignment, StratumAllocation};
use serde::Serialize;
use serde_json::Value;

/// Parameters the result was computed with
#[derive(Debug, Clone, Default, Serialize)]
pub struct JsonParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_iterations: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test: Option<String>,
}

/// Pilot/control groups as original records
#[derive(Debug, Clone, Serialize)]
pub struct JsonGroups {
    pub pilot: Value,
    pub control: Value,
    pub strata: Vec<StratumAllocation>,
}

impl From<&GroupAssignment> for JsonGroups {
    fn from(assignment: &GroupAssignment) -> Self {
        Self {
            pilot: Population::records(&assignment.pilot),
            control: Population::records(&assignment.control),
            strata: assignment.allocations.clone(),
        }
    }
}

/// Command result payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonResult {
    SampleSizes(Vec<SampleSizeRow>),
    Groups(JsonGroups),
    ErrorRates(Vec<ErrorEstimate>),
    DailyMetrics(Vec<DailyMetrics>),
    ConfidenceInterval(ConfidenceInterval),
}

/// Root JSON output structure
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Format version identifier
    pub version: String,
    /// Format name
    pub format: String,
    /// Subcommand that produced the result
    pub command: String,
    pub parameters: JsonParameters,
    pub result: JsonResult,
}

impl JsonOutput {
    pub fn new(command: impl Into<String>, parameters: JsonParameters, result: JsonResult) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "abdesign-json-v1".to_string(),
            command: command.into(),
            parameters,
            result,
        }
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
