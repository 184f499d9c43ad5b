use serde_json::Value;

use super::categorical::tally;
use super::value::as_number;
use crate::models::{Bucket, CategoryCount, ColumnType, Distribution};

pub const MAX_BUCKETS: usize = 10;
pub const MAX_CATEGORIES: usize = 10;

/// Chart-ready distribution for one column: histogram buckets for numeric
/// columns, top value counts for everything else (dates included).
pub fn build_distribution(values: &[Value], column_type: ColumnType) -> Distribution {
    match column_type {
        ColumnType::Numeric => Distribution::Numeric(histogram(values)),
        _ => Distribution::Categorical(top_categories(values)),
    }
}

fn histogram(values: &[Value]) -> Vec<Bucket> {
    let numbers: Vec<f64> = values.iter().filter_map(as_number).collect();
    if numbers.is_empty() {
        return Vec::new();
    }

    let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
    let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if min == max {
        return vec![Bucket {
            range: format!("{}", min),
            count: numbers.len(),
            start: min,
            end: max,
        }];
    }

    let bucket_count = distinct_count(&numbers).min(MAX_BUCKETS);
    let width = (max - min) / bucket_count as f64;

    (0..bucket_count)
        .map(|i| {
            let start = min + i as f64 * width;
            let end = min + (i + 1) as f64 * width;
            let last = i == bucket_count - 1;
            // Half-open buckets, except the top edge of the last one is
            // inclusive so the maximum never falls out to rounding.
            let count = numbers
                .iter()
                .filter(|&&v| (start <= v && v < end) || (last && v == max))
                .count();
            Bucket {
                range: format!("{:.2}-{:.2}", start, end),
                count,
                start,
                end,
            }
        })
        .collect()
}

fn distinct_count(numbers: &[f64]) -> usize {
    let mut sorted = numbers.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted.dedup();
    sorted.len()
}

fn top_categories(values: &[Value]) -> Vec<CategoryCount> {
    let mut entries: Vec<(String, u64)> = tally(values).into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.truncate(MAX_CATEGORIES);
    entries
        .into_iter()
        .map(|(name, value)| CategoryCount { name, value })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn buckets(values: &[Value]) -> Vec<Bucket> {
        match build_distribution(values, ColumnType::Numeric) {
            Distribution::Numeric(b) => b,
            Distribution::Categorical(_) => panic!("expected numeric distribution"),
        }
    }

    #[test]
    fn identical_values_collapse_to_one_bucket() {
        let values = vec![json!(5), json!(5), json!(5), json!(5)];
        let b = buckets(&values);
        assert_eq!(b.len(), 1);
        assert_eq!(b[0].count, 4);
        assert_eq!(b[0].start, 5.0);
        assert_eq!(b[0].end, 5.0);
        assert_eq!(b[0].range, "5");
    }

    #[test]
    fn bucket_counts_sum_to_coercible_values() {
        let values: Vec<Value> = (1..=20)
            .map(|i| json!(i))
            .chain([Value::Null, json!("junk"), json!("")])
            .collect();
        let b = buckets(&values);
        assert_eq!(b.len(), MAX_BUCKETS);
        assert_eq!(b.iter().map(|bucket| bucket.count).sum::<usize>(), 20);
    }

    #[test]
    fn last_bucket_includes_the_maximum() {
        let values: Vec<Value> = (0..=10).map(|i| json!(i)).collect();
        let b = buckets(&values);
        assert_eq!(b.last().unwrap().count, 2); // 9 and 10
        assert_eq!(b.iter().map(|bucket| bucket.count).sum::<usize>(), 11);
    }

    #[test]
    fn few_distinct_values_mean_few_buckets() {
        let values = vec![json!(1), json!(2), json!(3), json!(1)];
        let b = buckets(&values);
        assert_eq!(b.len(), 3);
        assert_eq!(b.iter().map(|bucket| bucket.count).sum::<usize>(), 4);
    }

    #[test]
    fn empty_numeric_column_yields_no_buckets() {
        assert!(buckets(&[]).is_empty());
        assert!(buckets(&[json!("x"), Value::Null]).is_empty());
    }

    #[test]
    fn bucket_edges_tile_the_range() {
        let values: Vec<Value> = [1.0, 2.5, 4.0, 7.75, 9.5].iter().map(|v| json!(v)).collect();
        let b = buckets(&values);
        assert_eq!(b.first().unwrap().start, 1.0);
        assert!((b.last().unwrap().end - 9.5).abs() < 1e-9);
        for pair in b.windows(2) {
            assert!((pair[0].end - pair[1].start).abs() < 1e-9);
        }
    }

    #[test]
    fn categorical_distribution_keeps_top_ten() {
        let mut values: Vec<Value> = (0..12).map(|i| json!(format!("c{i}"))).collect();
        values.push(json!("c3"));
        values.push(json!("c3"));
        values.push(json!("c7"));
        let dist = build_distribution(&values, ColumnType::Categorical);
        let entries = match dist {
            Distribution::Categorical(e) => e,
            Distribution::Numeric(_) => panic!("expected categorical distribution"),
        };
        assert_eq!(entries.len(), MAX_CATEGORIES);
        assert_eq!(entries[0].name, "c3");
        assert_eq!(entries[0].value, 3);
        assert_eq!(entries[1].name, "c7");
        assert_eq!(entries[1].value, 2);
    }

    #[test]
    fn date_columns_get_categorical_treatment() {
        let values = vec![json!("2024-01-01"), json!("2024-01-01"), json!("2024-01-02")];
        match build_distribution(&values, ColumnType::Date) {
            Distribution::Categorical(entries) => {
                assert_eq!(entries[0].name, "2024-01-01");
                assert_eq!(entries[0].value, 2);
            }
            Distribution::Numeric(_) => panic!("dates should distribute categorically"),
        }
    }
}
