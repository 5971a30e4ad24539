//! Labeled population: the rows a stratified split allocates
//!
//! Each unit keeps every original column, so a group assignment can be joined
//! back to any other dataset keyed by the same identifier.

use crate::error::{DesignError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A row of the population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationUnit {
    /// Stable identifier (id column value, or original row index)
    pub id: String,
    /// All original columns, including the id column
    pub fields: Map<String, Value>,
}

impl PopulationUnit {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Composite stratum key for the given attribute columns
    ///
    /// Every column must be present; an explicit JSON `null` is a value of
    /// its own.
    pub fn stratum_key(&self, columns: &[String]) -> Result<StratumKey> {
        columns
            .iter()
            .map(|column| {
                let value = self.fields.get(column).ok_or_else(|| {
                    DesignError::invalid(
                        "strata_columns",
                        format!("unit {} has no column `{}`", self.id, column),
                    )
                })?;
                StratumValue::from_json(value).map_err(|reason| {
                    DesignError::invalid("strata_columns", format!("unit {}: {}", self.id, reason))
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(StratumKey)
    }
}

/// One stratification attribute value
///
/// Keeps the JSON type, so the string `"1"` and the number `1` (or `null`
/// and `"null"`) are different strata. Variants order before one another in
/// declaration order; numbers compare numerically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StratumValue {
    Null,
    Bool(bool),
    Number(NumberKey),
    String(String),
}

impl StratumValue {
    /// Scalar JSON value; arrays and objects are rejected
    pub fn from_json(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::Null => Ok(Self::Null),
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Number(n) => n
                .as_f64()
                .map(|v| Self::Number(NumberKey::new(v)))
                .ok_or_else(|| format!("number {} is out of range", n)),
            Value::String(text) => Ok(Self::String(text.clone())),
            other => Err(format!("stratum values must be scalars, got {}", other)),
        }
    }
}

impl fmt::Display for StratumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StratumValue::Null => f.write_str("null"),
            StratumValue::Bool(b) => write!(f, "{}", b),
            StratumValue::Number(n) => write!(f, "{}", n.0),
            StratumValue::String(text) => f.write_str(text),
        }
    }
}

impl From<&str> for StratumValue {
    fn from(text: &str) -> Self {
        Self::String(text.to_string())
    }
}

impl From<String> for StratumValue {
    fn from(text: String) -> Self {
        Self::String(text)
    }
}

impl From<f64> for StratumValue {
    fn from(value: f64) -> Self {
        Self::Number(NumberKey::new(value))
    }
}

impl From<bool> for StratumValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// f64 under `total_cmp`, usable as a map key
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NumberKey(f64);

impl NumberKey {
    pub fn new(value: f64) -> Self {
        // -0.0 and 0.0 are one stratum
        Self(if value == 0.0 { 0.0 } else { value })
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl PartialEq for NumberKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NumberKey {}

impl PartialOrd for NumberKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NumberKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for NumberKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

/// Composite key of stratification attribute values
///
/// Ordering is lexicographic over the components.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StratumKey(pub Vec<StratumValue>);

impl StratumKey {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<StratumValue>,
    {
        Self(values.into_iter().map(Into::into).collect())
    }

    /// Parse a key from JSON: an array of values or a single scalar
    pub fn from_json(value: &Value) -> Result<Self> {
        let parts = match value {
            Value::Array(parts) => parts.iter().collect(),
            scalar => vec![scalar],
        };
        parts
            .into_iter()
            .map(|part| StratumValue::from_json(part).map_err(DesignError::Parse))
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }
}

impl fmt::Display for StratumKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "({})", parts.join(", "))
    }
}

fn id_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Explicit stratum weights
pub type StratumWeights = BTreeMap<StratumKey, f64>;

/// Parse weights from `[{"key": [...], "weight": w}, ...]`
pub fn weights_from_json(value: &Value) -> Result<StratumWeights> {
    let entries = value
        .as_array()
        .ok_or_else(|| DesignError::Parse("weights must be a JSON array".to_string()))?;

    let mut weights = StratumWeights::new();
    for (i, entry) in entries.iter().enumerate() {
        let key = entry
            .get("key")
            .ok_or_else(|| DesignError::Parse(format!("weight entry {}: missing `key`", i)))?;
        let weight = entry
            .get("weight")
            .and_then(Value::as_f64)
            .ok_or_else(|| DesignError::Parse(format!("weight entry {}: missing numeric `weight`", i)))?;
        weights.insert(StratumKey::from_json(key)?, weight);
    }
    Ok(weights)
}

/// Ordered collection of population units
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Population {
    units: Vec<PopulationUnit>,
}

impl Population {
    pub fn new(units: Vec<PopulationUnit>) -> Self {
        Self { units }
    }

    pub fn units(&self) -> &[PopulationUnit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Build from a JSON array of objects
    ///
    /// The unit id is the value of `id_column` when the record has it,
    /// otherwise the zero-based row index.
    pub fn from_json(value: &Value, id_column: &str) -> Result<Self> {
        let rows = value
            .as_array()
            .ok_or_else(|| DesignError::Parse("population must be a JSON array".to_string()))?;

        let units = rows
            .iter()
            .enumerate()
            .map(|(row, item)| {
                let fields = item
                    .as_object()
                    .ok_or_else(|| DesignError::Parse(format!("row {}: expected an object", row)))?;
                let id = fields
                    .get(id_column)
                    .map(id_text)
                    .unwrap_or_else(|| row.to_string());
                Ok(PopulationUnit::new(id, fields.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(units))
    }

    /// Render units back as JSON records
    pub fn records(units: &[PopulationUnit]) -> Value {
        Value::Array(units.iter().map(|u| Value::Object(u.fields.clone())).collect())
    }
}

impl FromIterator<PopulationUnit> for Population {
    fn from_iter<T: IntoIterator<Item = PopulationUnit>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
