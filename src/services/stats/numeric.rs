use serde_json::Value;

use super::value::as_number;

/// Summary statistics over the coercible numeric subset of a column.
#[derive(Debug, Clone, Copy)]
pub struct NumericSummary {
    pub sum: f64,
    pub mean: f64,
    pub median: f64,
    pub min_val: f64,
    pub max_val: f64,
    pub std_dev: f64,
    pub variance: f64,
    pub percentile_25: f64,
    pub percentile_50: f64,
    pub percentile_75: f64,
    pub percentile_90: f64,
}

/// Non-coercible values are dropped silently; a column with no coercible
/// values yields `None` rather than an error.
pub fn compute_numeric(values: &[Value]) -> Option<NumericSummary> {
    let numbers: Vec<f64> = values.iter().filter_map(as_number).collect();
    if numbers.is_empty() {
        return None;
    }

    let mut sorted = numbers.clone();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = numbers.len();
    let sum: f64 = numbers.iter().sum();
    let mean = sum / n as f64;

    // Sample (n-1) statistics; a single observation pins both at zero.
    let (variance, std_dev) = if n > 1 {
        let var = numbers.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        (var, var.sqrt())
    } else {
        (0.0, 0.0)
    };

    Some(NumericSummary {
        sum,
        mean,
        median: median_of(&sorted),
        min_val: sorted[0],
        max_val: sorted[n - 1],
        std_dev,
        variance,
        percentile_25: percentile(&sorted, 25.0),
        percentile_50: percentile(&sorted, 50.0),
        percentile_75: percentile(&sorted, 75.0),
        percentile_90: percentile(&sorted, 90.0),
    })
}

fn median_of(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Linear interpolation between the two bracketing order statistics.
/// Expects an ascending, non-empty slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let k = (sorted.len() - 1) as f64 * p / 100.0;
    let f = k.floor() as usize;
    let c = (f + 1).min(sorted.len() - 1);
    sorted[f] + (k - f as f64) * (sorted[c] - sorted[f])
}
