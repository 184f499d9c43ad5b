use bytes::Bytes;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde_json::{Map, Value};
use std::time::Duration;

use crate::error::AppError;
use crate::models::Row;
use crate::services::stats::value::as_text;

/// Wrapper keys commonly used by webhook payloads to hold the row array.
const WRAPPER_KEYS: [&str; 6] = ["data", "rows", "items", "records", "results", "values"];

// One client for the process; per-request timeouts come from config.
static HTTP_CLIENT: Lazy<Client> = Lazy::new(Client::new);

/// A normalized row-major table: rows as ordered objects, column names taken
/// from the first row's keys.
#[derive(Debug)]
pub struct TabularPayload {
    pub rows: Vec<Row>,
    pub columns: Vec<String>,
}

pub async fn fetch_payload(url: &str, timeout: Duration) -> Result<Value, AppError> {
    let body = load_body_from_url(url, timeout).await?;
    serde_json::from_slice(&body)
        .map_err(|e| AppError::InvalidPayload(format!("Invalid JSON response from webhook: {}", e)))
}

async fn load_body_from_url(url: &str, timeout: Duration) -> Result<Bytes, AppError> {
    let response = HTTP_CLIENT
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("Failed to fetch data: {}", e)))?;

    if !response.status().is_success() {
        return Err(AppError::Upstream(format!(
            "Failed to fetch data. Status: {}",
            response.status()
        )));
    }

    response
        .bytes()
        .await
        .map_err(|e| AppError::Upstream(format!("Failed to read response body: {}", e)))
}

/// Normalize the shapes webhooks actually send into a row-major table:
/// Apps-Script-style `{headers, rows}` documents, arrays wrapped in a known
/// key, bare arrays, or a single object treated as a one-row table.
pub fn normalize_payload(payload: Value) -> Result<TabularPayload, AppError> {
    let raw_rows = unwrap_rows(payload)?;
    if raw_rows.is_empty() {
        return Err(AppError::InvalidPayload("No data found in response".to_string()));
    }

    let rows: Vec<Row> = raw_rows
        .into_iter()
        .map(|row| match row {
            Value::Object(map) => Ok(map),
            _ => Err(AppError::InvalidPayload("Each row must be an object".to_string())),
        })
        .collect::<Result<_, _>>()?;

    let columns: Vec<String> = rows[0].keys().cloned().collect();
    Ok(TabularPayload { rows, columns })
}

fn unwrap_rows(payload: Value) -> Result<Vec<Value>, AppError> {
    match payload {
        Value::Array(rows) => Ok(rows),
        Value::Object(mut obj) if obj.contains_key("headers") && obj.contains_key("rows") => {
            let headers = obj.remove("headers").unwrap_or(Value::Null);
            match obj.remove("rows").unwrap_or(Value::Null) {
                Value::Array(rows) => {
                    if let Value::Array(names) = &headers {
                        if rows.first().map_or(false, Value::is_array) {
                            let names: Vec<String> = names.iter().map(as_text).collect();
                            return Ok(rows.into_iter().map(|row| zip_row(&names, row)).collect());
                        }
                    }
                    Ok(rows)
                }
                _ => Err(AppError::InvalidPayload(
                    "Data must be an array of objects".to_string(),
                )),
            }
        }
        Value::Object(mut obj) => {
            for key in WRAPPER_KEYS {
                if obj.get(key).map_or(false, Value::is_array) {
                    if let Some(Value::Array(rows)) = obj.remove(key) {
                        return Ok(rows);
                    }
                }
            }
            // A single object becomes a one-row table.
            Ok(vec![Value::Object(obj)])
        }
        _ => Err(AppError::InvalidPayload(
            "Data must be an array of objects".to_string(),
        )),
    }
}

// Extra cells past the header list are dropped, matching the header count.
fn zip_row(names: &[String], row: Value) -> Value {
    let cells = match row {
        Value::Array(cells) => cells,
        other => return other,
    };
    let mut object = Map::new();
    for (name, cell) in names.iter().zip(cells) {
        object.insert(name.clone(), cell);
    }
    Value::Object(object)
}

/// Project one column across all rows; absent keys become nulls so the
/// vector stays positionally aligned with row order.
pub fn column_vector(rows: &[Row], column: &str) -> Vec<Value> {
    rows.iter()
        .map(|row| row.get(column).cloned().unwrap_or(Value::Null))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_array_passes_through() {
        let table = normalize_payload(json!([{"a": 1}, {"a": 2}])).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.columns, ["a"]);
    }

    #[test]
    fn headers_and_array_rows_are_zipped() {
        let payload = json!({
            "headers": ["name", "age"],
            "rows": [["ana", 31], ["bo", 25]]
        });
        let table = normalize_payload(payload).unwrap();
        assert_eq!(table.columns, ["name", "age"]);
        assert_eq!(table.rows[0]["name"], json!("ana"));
        assert_eq!(table.rows[1]["age"], json!(25));
    }

    #[test]
    fn headers_with_object_rows_are_used_as_is() {
        let payload = json!({
            "headers": ["name"],
            "rows": [{"name": "ana"}, {"name": "bo"}]
        });
        let table = normalize_payload(payload).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.columns, ["name"]);
    }

    #[test]
    fn short_rows_zip_to_fewer_cells() {
        let payload = json!({
            "headers": ["a", "b", "c"],
            "rows": [[1, 2, 3], [4]]
        });
        let table = normalize_payload(payload).unwrap();
        assert_eq!(table.rows[0].len(), 3);
        assert_eq!(table.rows[1].len(), 1);
        // Missing keys project as nulls.
        let vector = column_vector(&table.rows, "b");
        assert_eq!(vector, vec![json!(2), Value::Null]);
    }

    #[test]
    fn wrapper_keys_are_unwrapped_in_order() {
        let table = normalize_payload(json!({"results": [{"x": 1}]})).unwrap();
        assert_eq!(table.rows.len(), 1);

        // "data" is checked before "results".
        let payload = json!({"data": [{"x": 1}, {"x": 2}], "results": [{"y": 9}]});
        let table = normalize_payload(payload).unwrap();
        assert_eq!(table.columns, ["x"]);
    }

    #[test]
    fn single_object_becomes_one_row() {
        let table = normalize_payload(json!({"x": 1, "y": "a"})).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.columns, ["x", "y"]);
    }

    #[test]
    fn scalars_and_empty_arrays_are_rejected() {
        assert!(normalize_payload(json!(42)).is_err());
        assert!(normalize_payload(json!("nope")).is_err());
        assert!(normalize_payload(json!([])).is_err());
    }

    #[test]
    fn non_object_rows_are_rejected() {
        assert!(normalize_payload(json!([1, 2, 3])).is_err());
        assert!(normalize_payload(json!([{"a": 1}, 2])).is_err());
    }

    #[test]
    fn column_order_follows_first_row_keys() {
        let table = normalize_payload(json!([{"z": 1, "a": 2, "m": 3}])).unwrap();
        assert_eq!(table.columns, ["z", "a", "m"]);
    }
}
