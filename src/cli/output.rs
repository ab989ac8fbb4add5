//! Human-readable run report.
//!
//! The report goes to the log stream; there is no machine-readable format.

use crate::coordinator::AggregateResult;

/// Lines describing a finished run, in print order.
#[must_use]
pub fn report_lines(result: &AggregateResult) -> Vec<String> {
    let mut lines = Vec::with_capacity(result.worker_elapsed.len() + 4);
    lines.push(format!("Samples used: {}", result.denominator));
    lines.push(format!("Integral estimate: {}", result.integral_estimate));
    lines.push(format!("Pi estimation: {}", result.pi_estimate));
    if let Some(slowest) = result
        .worker_elapsed
        .iter()
        .copied()
        .fold(None, |acc: Option<f64>, t| Some(acc.map_or(t, |a| a.max(t))))
    {
        lines.push(format!("Slowest worker compute time: {slowest:.6}s"));
    }
    lines.push(format!(
        "Total execution time: {:.6}s",
        result.total_elapsed_seconds
    ));
    lines
}

/// Write the report to the log stream.
pub fn log_report(result: &AggregateResult) {
    for line in report_lines(result) {
        tracing::info!("{line}");
    }
}
