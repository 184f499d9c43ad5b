use serde_json::Value;

use super::value::{as_number, is_missing};
use crate::models::ColumnType;

const TYPE_SAMPLE_ROWS: usize = 100;
const NUMERIC_FRACTION: f64 = 0.8;
const DATE_FRACTION: f64 = 0.5;
const DATE_MIN_LEN: usize = 8;

/// Classify a column from its raw values, sampling at most the first 100
/// non-missing cells.
///
/// The numeric check takes priority over the date check: a column of pure
/// integer dates (e.g. 20240101) classifies as numeric even though it is
/// date-shaped. Callers rely on this priority staying put.
pub fn infer(values: &[Value]) -> ColumnType {
    let non_null: Vec<&Value> = values.iter().filter(|v| !is_missing(v)).collect();
    if non_null.is_empty() {
        return ColumnType::Empty;
    }

    let sample = &non_null[..non_null.len().min(TYPE_SAMPLE_ROWS)];
    let mut numeric_count = 0usize;
    let mut date_count = 0usize;

    for value in sample {
        if as_number(value).is_some() {
            numeric_count += 1;
        }
        if let Value::String(s) = value {
            if is_date_shaped(s) {
                date_count += 1;
            }
        }
    }

    let sample_size = sample.len() as f64;
    if numeric_count as f64 / sample_size >= NUMERIC_FRACTION {
        ColumnType::Numeric
    } else if date_count as f64 / sample_size >= DATE_FRACTION {
        ColumnType::Date
    } else {
        ColumnType::Categorical
    }
}

// Cheap heuristic, not a parse: a separator character plus a minimum length.
fn is_date_shaped(s: &str) -> bool {
    s.len() >= DATE_MIN_LEN && s.contains(['-', '/', ':'])
}
