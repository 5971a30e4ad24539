//! Human-readable text reports

use crate::aggregation::DailyMetrics;
use crate::bootstrap::ErrorEstimate;
use crate::confidence::ConfidenceInterval;
use crate::sample_size::SampleSizeRow;
use crate::stratified::GroupAssignment;

/// Sample size per effect
pub fn sample_size_report(rows: &[SampleSizeRow], alpha: f64, beta: f64) -> String {
    let mut report = String::new();
    report.push_str(&format!(
        "📐 SAMPLE SIZE (alpha={}, power={:.0}%)\n\n",
        alpha,
        (1.0 - beta) * 100.0
    ));
    report.push_str(&format!("{:>10}  {:>12}\n", "effect", "per group"));
    for row in rows {
        report.push_str(&format!("{:>10}  {:>12}\n", row.effect, row.sample_size));
    }
    report
}

/// Group sizes and per-stratum plan
pub fn split_report(assignment: &GroupAssignment) -> String {
    let mut report = String::new();
    report.push_str(&format!(
        "🎯 STRATIFIED SPLIT (seed={})\n\n",
        assignment.seed
    ));
    report.push_str(&format!("Pilot units:   {}\n", assignment.pilot.len()));
    report.push_str(&format!("Control units: {}\n", assignment.control.len()));

    if !assignment.allocations.is_empty() {
        report.push_str("\n📊 Strata:\n");
        for a in &assignment.allocations {
            report.push_str(&format!(
                "  {} weight={:.4} quota={} available={}\n",
                a.key, a.weight, a.quota, a.available
            ));
        }
    }

    report.push_str("\nPilot ids: ");
    report.push_str(&assignment.pilot_ids().join(", "));
    report.push_str("\nControl ids: ");
    report.push_str(&assignment.control_ids().join(", "));
    report.push('\n');
    report
}

/// Bootstrap error rates
pub fn error_rate_report(kind: &str, test: &str, estimates: &[ErrorEstimate]) -> String {
    let mut report = String::new();
    let iterations = estimates.first().map(|e| e.iterations).unwrap_or(0);
    report.push_str(&format!(
        "🔁 {} ERROR ({} test, {} replicates)\n\n",
        kind, test, iterations
    ));
    for e in estimates {
        report.push_str(&format!(
            "  effect={} rate={:.4} (significant {}/{})\n",
            e.effect, e.rate, e.significant, e.iterations
        ));
    }
    report
}

/// Daily metrics table
pub fn daily_metrics_report(days: &[DailyMetrics]) -> String {
    let mut report = String::new();
    report.push_str(&format!(
        "{:<12} {:>12} {:>10} {:>12} {:>10}\n",
        "date", "revenue", "purchases", "avg_check", "avg_items"
    ));
    for d in days {
        report.push_str(&format!(
            "{:<12} {:>12.2} {:>10} {:>12.2} {:>10.2}\n",
            d.date.to_string(),
            d.revenue,
            d.number_purchases,
            d.average_check,
            d.average_number_items
        ));
    }
    report
}

pub fn interval_report(interval: &ConfidenceInterval) -> String {
    format!(
        "95% confidence interval: [{:.6}, {:.6}]\n",
        interval.lower, interval.upper
    )
}
