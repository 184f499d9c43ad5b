use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// One ingested row: column name -> raw cell value, key order preserved.
pub type Row = Map<String, Value>;

/// Per-column type tag assigned once at ingestion and persisted with the
/// session, so repeated analysis calls treat the column consistently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Date,
    Categorical,
    Empty,
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Date => "date",
            ColumnType::Categorical => "categorical",
            ColumnType::Empty => "empty",
        };
        write!(f, "{}", tag)
    }
}

/// One histogram bucket: half-open range except the last bucket's top edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bucket {
    pub range: String,
    pub count: usize,
    pub start: f64,
    pub end: f64,
}

/// One (label, count) pair of a categorical distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCount {
    pub name: String,
    pub value: u64,
}

/// Chart-ready distribution; serialized as a bare array either way, matching
/// what dashboard chart components consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Distribution {
    Numeric(Vec<Bucket>),
    Categorical(Vec<CategoryCount>),
}

/// One point of a numeric column's trend line; `index` is the original row
/// position, never renumbered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrendPoint {
    pub index: usize,
    pub value: f64,
}

/// Wire record for one analyzed column. Numeric fields appear only for
/// numeric columns, categorical fields only for the rest; absent fields are
/// omitted from the JSON rather than serialized as null.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnStats {
    pub column: String,
    pub data_type: ColumnType,
    pub count: usize,
    pub non_null_count: usize,
    pub unique_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_val: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_val: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std_dev: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentile_25: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentile_50: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentile_75: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentile_90: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_counts: Option<IndexMap<String, u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    pub distribution: Distribution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend_data: Option<Vec<TrendPoint>>,
}

impl ColumnStats {
    pub fn new(
        column: String,
        data_type: ColumnType,
        count: usize,
        non_null_count: usize,
        unique_count: usize,
        distribution: Distribution,
    ) -> Self {
        Self {
            column,
            data_type,
            count,
            non_null_count,
            unique_count,
            sum: None,
            mean: None,
            median: None,
            min_val: None,
            max_val: None,
            std_dev: None,
            variance: None,
            percentile_25: None,
            percentile_50: None,
            percentile_75: None,
            percentile_90: None,
            value_counts: None,
            mode: None,
            distribution,
            trend_data: None,
        }
    }
}

/// An ingested dataset plus its inferred schema, persisted as one JSON
/// document per session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSession {
    pub id: String,
    pub url: String,
    pub data: Vec<Row>,
    pub columns: Vec<String>,
    pub column_types: IndexMap<String, ColumnType>,
    pub row_count: usize,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics: Option<Vec<ColumnStats>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzed_columns: Option<Vec<String>>,
}

impl DataSession {
    pub fn new(
        url: String,
        data: Vec<Row>,
        columns: Vec<String>,
        column_types: IndexMap<String, ColumnType>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            url,
            row_count: data.len(),
            data,
            columns,
            column_types,
            created_at: Utc::now(),
            analytics: None,
            analyzed_columns: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCheck {
    pub id: String,
    pub client_name: String,
    pub timestamp: DateTime<Utc>,
}

impl StatusCheck {
    pub fn new(client_name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            client_name,
            timestamp: Utc::now(),
        }
    }
}
