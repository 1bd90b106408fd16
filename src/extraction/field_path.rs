//! Record field path resolution.
//!
//! Resolves filter fields like "object_name" or "audit_object/object_name"
//! to values in a JSON record. A single `/` denotes one level of nesting;
//! deeper paths are rejected when the path is parsed.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use crate::error::{FilterError, Result};

pub const NESTING_SEPARATOR: char = '/';

/// A parsed record field reference, at most one level deep.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    head: String,
    nested: Option<String>,
}

impl FieldPath {
    /// Parse a field name, rejecting empty segments and nesting deeper than
    /// one level.
    pub fn parse(field: &str) -> Result<Self> {
        let mut parts = field.split(NESTING_SEPARATOR);
        let head = parts.next().unwrap_or_default();
        let nested = parts.next();

        if parts.next().is_some() {
            return Err(FilterError::UnknownFilterReference(format!(
                "field '{}' nests deeper than one level",
                field
            )));
        }
        if head.is_empty() || nested.is_some_and(str::is_empty) {
            return Err(FilterError::UnknownFilterReference(format!(
                "field '{}' has an empty segment",
                field
            )));
        }

        Ok(Self {
            head: head.to_string(),
            nested: nested.map(str::to_string),
        })
    }

    pub fn is_nested(&self) -> bool {
        self.nested.is_some()
    }

    /// Look the path up in a record.
    ///
    /// A missing key at either level, or a non-object parent, is reported as
    /// `MissingUpstreamField`.
    pub fn resolve<'a>(&self, record: &'a Value) -> Result<&'a Value> {
        let missing = || FilterError::MissingUpstreamField(self.to_string());

        let parent = record.get(&self.head).ok_or_else(missing)?;
        match &self.nested {
            None => Ok(parent),
            Some(key) => parent
                .as_object()
                .and_then(|obj| obj.get(key))
                .ok_or_else(missing),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.nested {
            Some(key) => write!(f, "{}{}{}", self.head, NESTING_SEPARATOR, key),
            None => f.write_str(&self.head),
        }
    }
}

/// Convert a JSON value to a string representation for query parameters.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(), // Arrays and objects as JSON strings
    }
}

/// Text a substring filter can match against.
///
/// Scalars are rendered as text; null, empty strings and containers yield
/// nothing, which the caller treats as "does not match".
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Interpret a record value as an instant.
///
/// Accepts RFC 3339 strings, naive `YYYY-MM-DDTHH:MM:SS[.fff]` (read as UTC),
/// bare `YYYY-MM-DD` (midnight UTC) and integer epoch milliseconds.
pub fn value_to_datetime(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_datetime(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

/// Parse the textual date formats accepted by [`value_to_datetime`].
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_path() {
        let data = json!({"username": "admin"});
        let path = FieldPath::parse("username").unwrap();
        assert!(!path.is_nested());
        assert_eq!(path.resolve(&data).unwrap(), &json!("admin"));
    }

    #[test]
    fn test_nested_path() {
        let data = json!({"audit_object": {"object_name": "cluster-1"}});
        let path = FieldPath::parse("audit_object/object_name").unwrap();
        assert!(path.is_nested());
        assert_eq!(path.resolve(&data).unwrap(), &json!("cluster-1"));
        assert_eq!(path.to_string(), "audit_object/object_name");
    }

    #[test]
    fn test_deep_nesting_rejected() {
        let err = FieldPath::parse("a/b/c").unwrap_err();
        assert!(matches!(err, FilterError::UnknownFilterReference(_)));
    }

    #[test]
    fn test_empty_segments_rejected() {
        assert!(FieldPath::parse("").is_err());
        assert!(FieldPath::parse("a/").is_err());
        assert!(FieldPath::parse("/b").is_err());
    }

    #[test]
    fn test_missing_field() {
        let data = json!({"name": "test", "owner": "root"});
        let err = FieldPath::parse("missing").unwrap().resolve(&data).unwrap_err();
        assert!(matches!(err, FilterError::MissingUpstreamField(f) if f == "missing"));

        // Parent is a scalar, not an object
        assert!(FieldPath::parse("owner/name").unwrap().resolve(&data).is_err());
        // Parent is null
        let data = json!({"owner": null});
        assert!(FieldPath::parse("owner/name").unwrap().resolve(&data).is_err());
    }

    #[test]
    fn test_value_to_text() {
        assert_eq!(value_to_text(&json!("Cluster-1")), Some("Cluster-1".to_string()));
        assert_eq!(value_to_text(&json!(42)), Some("42".to_string()));
        assert_eq!(value_to_text(&json!("")), None);
        assert_eq!(value_to_text(&json!(null)), None);
        assert_eq!(value_to_text(&json!({"a": 1})), None);
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&json!("cluster")), "cluster");
        assert_eq!(value_to_string(&json!(7)), "7");
        assert_eq!(value_to_string(&json!(false)), "false");
        assert_eq!(value_to_string(&json!(null)), "");
    }

    #[test]
    fn test_datetime_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        assert_eq!(value_to_datetime(&json!("2024-01-15")), Some(expected));
        assert_eq!(value_to_datetime(&json!("2024-01-15T00:00:00Z")), Some(expected));
        assert_eq!(value_to_datetime(&json!("2024-01-15T03:00:00+03:00")), Some(expected));
        assert_eq!(value_to_datetime(&json!("2024-01-15T00:00:00.000")), Some(expected));
        assert_eq!(
            value_to_datetime(&json!(expected.timestamp_millis())),
            Some(expected)
        );
        assert_eq!(value_to_datetime(&json!("yesterday")), None);
        assert_eq!(value_to_datetime(&json!(null)), None);
    }
}
