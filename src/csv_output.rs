//! CSV output format for experiment design results
//!
//! One table type covers every result: sample sizes, error estimates, daily
//! metrics and group assignments (one row per unit, tagged with its group).

use crate::aggregation::DailyMetrics;
use crate::bootstrap::ErrorEstimate;
use crate::confidence::ConfidenceInterval;
use crate::population::PopulationUnit;
use crate::sample_size::SampleSizeRow;
use crate::stratified::GroupAssignment;
use serde_json::Value;
use std::collections::BTreeSet;

/// CSV table with a fixed header
#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Create an empty table with the given columns
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Add a row (cells in header order)
    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn format_row(cells: &[String]) -> String {
        cells
            .iter()
            .map(|c| Self::escape_field(c))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::new();

        output.push_str(&Self::format_row(&self.header));
        output.push('\n');

        for row in &self.rows {
            output.push_str(&Self::format_row(row));
            output.push('\n');
        }

        output
    }

    pub fn from_sample_sizes(rows: &[SampleSizeRow]) -> Self {
        let mut table = Self::new(["effect", "sample_size"]);
        for row in rows {
            table.add_row(vec![row.effect.to_string(), row.sample_size.to_string()]);
        }
        table
    }

    pub fn from_error_estimates(estimates: &[ErrorEstimate]) -> Self {
        let mut table = Self::new(["effect", "rate", "significant", "iterations"]);
        for e in estimates {
            table.add_row(vec![
                e.effect.to_string(),
                e.rate.to_string(),
                e.significant.to_string(),
                e.iterations.to_string(),
            ]);
        }
        table
    }

    pub fn from_daily_metrics(days: &[DailyMetrics]) -> Self {
        let mut table = Self::new([
            "date",
            "revenue",
            "number_purchases",
            "average_check",
            "average_number_items",
        ]);
        for d in days {
            table.add_row(vec![
                d.date.to_string(),
                d.revenue.to_string(),
                d.number_purchases.to_string(),
                d.average_check.to_string(),
                d.average_number_items.to_string(),
            ]);
        }
        table
    }

    pub fn from_interval(interval: &ConfidenceInterval) -> Self {
        let mut table = Self::new(["lower", "upper"]);
        table.add_row(vec![interval.lower.to_string(), interval.upper.to_string()]);
        table
    }

    /// Units of both groups, `group` first, then the union of all columns
    pub fn from_assignment(assignment: &GroupAssignment) -> Self {
        let columns: BTreeSet<&str> = assignment
            .pilot
            .iter()
            .chain(assignment.control.iter())
            .flat_map(|u| u.fields.keys().map(String::as_str))
            .collect();

        let mut table = Self::new(
            ["group", "unit_id"]
                .into_iter()
                .chain(columns.iter().copied()),
        );

        let groups = [("pilot", &assignment.pilot), ("control", &assignment.control)];
        for (group, units) in groups {
            for unit in units.iter() {
                table.add_row(unit_row(group, unit, &columns));
            }
        }
        table
    }
}

fn unit_row(group: &str, unit: &PopulationUnit, columns: &BTreeSet<&str>) -> Vec<String> {
    let mut row = vec![group.to_string(), unit.id.clone()];
    row.extend(columns.iter().map(|c| match unit.fields.get(*c) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }));
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_csv_escape_field_simple() {
        assert_eq!(CsvTable::escape_field("hello"), "hello");
    }

    #[test]
    fn test_csv_escape_field_with_comma() {
        assert_eq!(CsvTable::escape_field("hello,world"), "\"hello,world\"");
    }

    #[test]
    fn test_csv_escape_field_with_quote() {
        assert_eq!(CsvTable::escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_sample_size_table() {
        let csv = CsvTable::from_sample_sizes(&[SampleSizeRow {
            effect: 1.05,
            sample_size: 252,
        }])
        .to_csv();
        assert_eq!(csv, "effect,sample_size\n1.05,252\n");
    }

    #[test]
    fn test_error_estimate_table() {
        let csv = CsvTable::from_error_estimates(&[ErrorEstimate {
            effect: 1.0,
            rate: 0.05,
            significant: 50,
            iterations: 1000,
        }])
        .to_csv();
        assert!(csv.contains("effect,rate,significant,iterations"));
        assert!(csv.contains("1,0.05,50,1000"));
    }

    #[test]
    fn test_assignment_table_union_of_columns() {
        let pilot = PopulationUnit::new(
            "1",
            json!({"id": 1, "os": "ios"}).as_object().cloned().unwrap_or_default(),
        );
        let control = PopulationUnit::new(
            "2",
            json!({"id": 2, "city": "Kazan, RU"}).as_object().cloned().unwrap_or_default(),
        );
        let assignment = GroupAssignment {
            pilot: vec![pilot],
            control: vec![control],
            allocations: Vec::new(),
            seed: 0,
        };

        let csv = CsvTable::from_assignment(&assignment).to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "group,unit_id,city,id,os");
        assert_eq!(lines[1], "pilot,1,,1,ios");
        assert_eq!(lines[2], "control,2,\"Kazan, RU\",2,");
    }
}
