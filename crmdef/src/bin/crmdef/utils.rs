use chrono::{DateTime, Utc};
use serde_json::Value;

/// Format a DateTime to a human-readable string
pub fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Render a record value for a table cell. Strings are shown without quotes.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Array(items) => items.iter().map(format_value).collect::<Vec<_>>().join("; "),
        other => other.to_string(),
    }
}

pub fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_datetime() {
        let dt = DateTime::<Utc>::from_timestamp(0, 0).expect("epoch");
        assert_eq!(format_datetime(dt), "1970-01-01 00:00:00 UTC");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&json!("Open")), "Open");
        assert_eq!(format_value(&json!(12.5)), "12.5");
        assert_eq!(format_value(&json!(["A", "B"])), "A; B");
        assert_eq!(format_value(&Value::Null), "");
    }
}
