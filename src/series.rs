//! Metric series: one numeric observation per analysis unit
//!
//! This is the column the upstream aggregation hands to the estimators
//! (daily revenue, purchase amount per user, ...).

use crate::error::{DesignError, Result};
use serde_json::Value;
use statrs::statistics::Statistics;

/// Immutable collection of metric observations
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricSeries {
    values: Vec<f64>,
}

impl MetricSeries {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Arithmetic mean (NaN when empty)
    pub fn mean(&self) -> f64 {
        self.values.iter().mean()
    }

    /// Population standard deviation (divisor `n`)
    pub fn std_dev(&self) -> f64 {
        self.values.iter().population_std_dev()
    }

    /// Parse a numeric column from JSON
    ///
    /// Accepts either an array of numbers, or an array of objects together
    /// with the name of the numeric `column` to extract.
    pub fn from_json(value: &Value, column: Option<&str>) -> Result<Self> {
        let items = value
            .as_array()
            .ok_or_else(|| DesignError::Parse("expected a JSON array".to_string()))?;

        let values = items
            .iter()
            .enumerate()
            .map(|(row, item)| {
                let cell = match (item, column) {
                    (Value::Object(fields), Some(name)) => fields.get(name).ok_or_else(|| {
                        DesignError::Parse(format!("row {}: missing column `{}`", row, name))
                    })?,
                    (Value::Object(_), None) => {
                        return Err(DesignError::Parse(format!(
                            "row {}: records need a metric column name",
                            row
                        )))
                    }
                    (other, _) => other,
                };
                cell.as_f64().ok_or_else(|| {
                    DesignError::Parse(format!("row {}: `{}` is not a number", row, cell))
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        Ok(Self::new(values))
    }
}

impl From<Vec<f64>> for MetricSeries {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl From<&[f64]> for MetricSeries {
    fn from(values: &[f64]) -> Self {
        Self::new(values.to_vec())
    }
}
