use serde_json::Value;

use super::value::as_number;
use crate::models::TrendPoint;

pub const MAX_TREND_POINTS: usize = 500;

/// (row index, value) pairs for line charts, capped at the first 500
/// coercible values. Rows that do not coerce are skipped without
/// renumbering the indices that follow.
pub fn extract_trend(values: &[Value]) -> Vec<TrendPoint> {
    values
        .iter()
        .enumerate()
        .filter_map(|(index, v)| as_number(v).map(|value| TrendPoint { index, value }))
        .take(MAX_TREND_POINTS)
        .collect()
}
