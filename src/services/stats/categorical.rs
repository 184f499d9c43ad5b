use indexmap::IndexMap;
use serde_json::Value;

use super::value::{as_text, is_missing};

pub const MAX_VALUE_COUNTS: usize = 20;

#[derive(Debug, Clone)]
pub struct CategoricalSummary {
    /// Top counts in descending order, insertion order on ties.
    pub value_counts: IndexMap<String, u64>,
    pub mode: String,
}

/// Occurrence counts in first-seen order. Shared with the distribution
/// builder so both report identical tallies.
pub(super) fn tally(values: &[Value]) -> IndexMap<String, u64> {
    let mut counts = IndexMap::new();
    for value in values.iter().filter(|v| !is_missing(v)) {
        *counts.entry(as_text(value)).or_insert(0u64) += 1;
    }
    counts
}

/// Frequency analysis for non-numeric columns: top 20 counts plus the mode.
/// Ties break toward the first-seen value, made explicit by the
/// insertion-ordered tally and a stable sort.
pub fn compute_categorical(values: &[Value]) -> Option<CategoricalSummary> {
    let counts = tally(values);
    if counts.is_empty() {
        return None;
    }

    let mut mode = String::new();
    let mut best = 0u64;
    for (value, &count) in &counts {
        if count > best {
            best = count;
            mode = value.clone();
        }
    }

    let mut entries: Vec<(String, u64)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.truncate(MAX_VALUE_COUNTS);

    Some(CategoricalSummary {
        value_counts: entries.into_iter().collect(),
        mode,
    })
}
