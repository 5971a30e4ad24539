//! Daily sales metrics from transaction-level records
//!
//! Upstream of the estimators: turns item-level sales rows into one row per
//! day of a half-open period `[begin, end)`:
//!
//! - `revenue`: total cost of all sales that day
//! - `number_purchases`: distinct sales that day
//! - `average_check`: mean sale total
//! - `average_number_items`: mean item count per sale
//!
//! A sale spanning several rows is dated by its earliest row. Days without
//! sales are present with all metrics 0.

use crate::error::{DesignError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// Column names and period for an aggregation run
#[derive(Debug, Clone, PartialEq)]
pub struct SalesAggregation {
    pub cost_column: String,
    pub date_column: String,
    pub sale_id_column: String,
    /// First day included
    pub begin: NaiveDate,
    /// First day excluded
    pub end: NaiveDate,
    /// Keep only rows whose `field` value is one of the listed values
    pub filters: BTreeMap<String, Vec<Value>>,
}

/// Metrics for one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyMetrics {
    pub date: NaiveDate,
    pub revenue: f64,
    pub number_purchases: f64,
    pub average_check: f64,
    pub average_number_items: f64,
}

impl DailyMetrics {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            revenue: 0.0,
            number_purchases: 0.0,
            average_check: 0.0,
            average_number_items: 0.0,
        }
    }

    /// Value of a metric by column name
    pub fn metric(&self, name: &str) -> Option<f64> {
        match name {
            "revenue" => Some(self.revenue),
            "number_purchases" => Some(self.number_purchases),
            "average_check" => Some(self.average_check),
            "average_number_items" => Some(self.average_number_items),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Sale {
    total: f64,
    items: usize,
    date: NaiveDate,
}

/// Parse the date part of `YYYY-MM-DD[ HH:MM:SS]` / `YYYY-MM-DDTHH:MM:SS`
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    let day = text
        .get(..10)
        .ok_or_else(|| DesignError::Parse(format!("invalid date `{}`", text)))?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| DesignError::Parse(format!("invalid date `{}`: {}", text, e)))
}

impl SalesAggregation {
    /// Aggregation with the conventional column names `cost`, `date`, `sale_id`
    pub fn new(begin: NaiveDate, end: NaiveDate) -> Self {
        Self {
            cost_column: "cost".to_string(),
            date_column: "date".to_string(),
            sale_id_column: "sale_id".to_string(),
            begin,
            end,
            filters: BTreeMap::new(),
        }
    }

    pub fn with_filter(mut self, field: impl Into<String>, allowed: Vec<Value>) -> Self {
        self.filters.insert(field.into(), allowed);
        self
    }

    fn keep(&self, row: &Map<String, Value>) -> bool {
        self.filters.iter().all(|(field, allowed)| {
            row.get(field)
                .map(|value| allowed.contains(value))
                .unwrap_or(false)
        })
    }

    fn field<'a>(&self, row: &'a Map<String, Value>, index: usize, name: &str) -> Result<&'a Value> {
        row.get(name)
            .ok_or_else(|| DesignError::Parse(format!("row {}: missing column `{}`", index, name)))
    }

    /// Aggregate records into one row per day of the period, ascending
    pub fn aggregate(&self, records: &[Value]) -> Result<Vec<DailyMetrics>> {
        if self.begin >= self.end {
            return Err(DesignError::invalid(
                "period",
                format!("begin {} must precede end {}", self.begin, self.end),
            ));
        }

        let mut sales: HashMap<String, Sale> = HashMap::new();
        for (index, record) in records.iter().enumerate() {
            let row = record
                .as_object()
                .ok_or_else(|| DesignError::Parse(format!("row {}: expected an object", index)))?;
            if !self.keep(row) {
                continue;
            }

            let date_value = self.field(row, index, &self.date_column)?;
            let date = parse_date(date_value.as_str().unwrap_or_default())?;
            if date < self.begin || date >= self.end {
                continue;
            }

            let cost = self
                .field(row, index, &self.cost_column)?
                .as_f64()
                .ok_or_else(|| DesignError::Parse(format!("row {}: cost is not a number", index)))?;
            let sale_id = match self.field(row, index, &self.sale_id_column)? {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };

            let sale = sales.entry(sale_id).or_insert(Sale {
                total: 0.0,
                items: 0,
                date,
            });
            sale.total += cost;
            sale.items += 1;
            sale.date = sale.date.min(date);
        }

        let mut by_day: BTreeMap<NaiveDate, Vec<&Sale>> = BTreeMap::new();
        for sale in sales.values() {
            by_day.entry(sale.date).or_default().push(sale);
        }

        let days: Vec<DailyMetrics> = self
            .begin
            .iter_days()
            .take_while(|day| *day < self.end)
            .map(|day| match by_day.get(&day) {
                Some(day_sales) => {
                    let count = day_sales.len() as f64;
                    let revenue: f64 = day_sales.iter().map(|s| s.total).sum();
                    let items: usize = day_sales.iter().map(|s| s.items).sum();
                    DailyMetrics {
                        date: day,
                        revenue,
                        number_purchases: count,
                        average_check: revenue / count,
                        average_number_items: items as f64 / count,
                    }
                }
                None => DailyMetrics::empty(day),
            })
            .collect();

        tracing::debug!(
            "Aggregated {} sales into {} days ({}..{})",
            sales.len(),
            days.len(),
            self.begin,
            self.end
        );
        Ok(days)
    }
}
