use serde_json::Value;

/// Nulls and empty strings count as missing; everything else is a real cell.
pub fn is_missing(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Best-effort numeric coercion. Shared by inference, statistics,
/// distribution and trend extraction so every component agrees on what
/// counts as a number. Booleans coerce to 0/1, strings parse after
/// trimming, nested values never coerce.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Display form used for tallies and uniqueness counts. Strings keep their
/// exact contents; other scalars use their JSON rendering.
pub fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_covers_null_and_empty_string() {
        assert!(is_missing(&Value::Null));
        assert!(is_missing(&json!("")));
        assert!(!is_missing(&json!(" ")));
        assert!(!is_missing(&json!(0)));
        assert!(!is_missing(&json!(false)));
    }

    #[test]
    fn numbers_strings_and_bools_coerce() {
        assert_eq!(as_number(&json!(3)), Some(3.0));
        assert_eq!(as_number(&json!(2.5)), Some(2.5));
        assert_eq!(as_number(&json!("1.5")), Some(1.5));
        assert_eq!(as_number(&json!(" 42 ")), Some(42.0));
        assert_eq!(as_number(&json!("1e3")), Some(1000.0));
        assert_eq!(as_number(&json!(true)), Some(1.0));
        assert_eq!(as_number(&json!(false)), Some(0.0));
    }

    #[test]
    fn non_numeric_values_do_not_coerce() {
        assert_eq!(as_number(&json!("abc")), None);
        assert_eq!(as_number(&json!("")), None);
        assert_eq!(as_number(&Value::Null), None);
        assert_eq!(as_number(&json!(["1"])), None);
        assert_eq!(as_number(&json!({"v": 1})), None);
    }

    #[test]
    fn text_form_keeps_strings_verbatim() {
        assert_eq!(as_text(&json!("a b")), "a b");
        assert_eq!(as_text(&json!(1.5)), "1.5");
        assert_eq!(as_text(&json!(true)), "true");
    }
}
