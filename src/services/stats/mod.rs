pub mod categorical;
pub mod distribution;
pub mod infer;
pub mod numeric;
pub mod trend;
pub mod value;

pub use infer::infer;

use std::collections::HashSet;

use serde_json::Value;

use crate::models::{ColumnStats, ColumnType};
use value::{as_text, is_missing};

/// Full per-column analysis using the type recorded at ingestion (never
/// re-inferred, so a column's treatment is stable across repeated calls).
/// Pure and synchronous; callers may fan out across columns freely.
pub fn analyze_column(column: &str, values: &[Value], column_type: ColumnType) -> ColumnStats {
    let non_null: Vec<&Value> = values.iter().filter(|v| !is_missing(v)).collect();
    let unique: HashSet<String> = non_null.iter().map(|v| as_text(v)).collect();

    let mut stats = ColumnStats::new(
        column.to_string(),
        column_type,
        values.len(),
        non_null.len(),
        unique.len(),
        distribution::build_distribution(values, column_type),
    );

    if column_type == ColumnType::Numeric {
        if let Some(summary) = numeric::compute_numeric(values) {
            stats.sum = Some(summary.sum);
            stats.mean = Some(summary.mean);
            stats.median = Some(summary.median);
            stats.min_val = Some(summary.min_val);
            stats.max_val = Some(summary.max_val);
            stats.std_dev = Some(summary.std_dev);
            stats.variance = Some(summary.variance);
            stats.percentile_25 = Some(summary.percentile_25);
            stats.percentile_50 = Some(summary.percentile_50);
            stats.percentile_75 = Some(summary.percentile_75);
            stats.percentile_90 = Some(summary.percentile_90);
        }
        stats.trend_data = Some(trend::extract_trend(values));
    } else if let Some(summary) = categorical::compute_categorical(values) {
        stats.value_counts = Some(summary.value_counts);
        stats.mode = Some(summary.mode);
    }

    stats
}
