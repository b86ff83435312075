// segbase-core/src/query.rs
// Filter matching for collection scans
//
// A filter maps field names to conditions; a document matches when every
// condition holds (logical AND, no OR/NOT composition). Conditions are
// dispatched in a fixed precedence order:
//
// 1. Predicate  - caller-supplied function over the field value
// 2. Range      - inclusive min/max over numbers or date-like strings
// 3. Literal    - case-insensitive substring when both sides are text,
//                 strict equality otherwise

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::DateTime;
use serde_json::Value;

use crate::document::Document;

/// Caller-supplied predicate over a single field value.
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// One condition of a filter.
#[derive(Clone)]
pub enum FilterValue {
    /// Substring match for text against text, strict equality otherwise
    Literal(Value),
    /// Inclusive bounds; an absent bound imposes nothing
    Range {
        min: Option<Value>,
        max: Option<Value>,
    },
    /// Arbitrary predicate; receives `Null` when the field is absent
    Predicate(Predicate),
}

/// A filter: field name -> condition, AND across all entries.
pub type Filter = HashMap<String, FilterValue>;

impl FilterValue {
    pub fn literal(value: impl Into<Value>) -> Self {
        FilterValue::Literal(value.into())
    }

    pub fn range(min: Option<Value>, max: Option<Value>) -> Self {
        FilterValue::Range { min, max }
    }

    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        FilterValue::Predicate(Arc::new(predicate))
    }

    /// Read a condition from dynamic JSON: a plain object is a range
    /// descriptor carrying optional `min`/`max` keys, everything else is a
    /// literal. Used by callers holding filters as data (e.g. the CLI).
    pub fn from_json(value: &Value) -> Self {
        if let Value::Object(descriptor) = value {
            return FilterValue::Range {
                min: descriptor.get("min").cloned(),
                max: descriptor.get("max").cloned(),
            };
        }
        FilterValue::Literal(value.clone())
    }

    /// Evaluate this condition against a field value.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FilterValue::Predicate(predicate) => predicate.as_ref()(value),
            FilterValue::Range { min, max } => range_matches(value, min.as_ref(), max.as_ref()),
            FilterValue::Literal(expected) => match (value, expected) {
                (Value::String(haystack), Value::String(needle)) => haystack
                    .to_lowercase()
                    .contains(&needle.to_lowercase()),
                _ => value == expected,
            },
        }
    }
}

impl fmt::Debug for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            FilterValue::Range { min, max } => f
                .debug_struct("Range")
                .field("min", min)
                .field("max", max)
                .finish(),
            FilterValue::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Check a document against a filter. Absent fields evaluate as `Null`.
pub fn matches_filter(doc: &Document, filter: &Filter) -> bool {
    filter.iter().all(|(field, condition)| {
        let value = doc.get(field).unwrap_or(&Value::Null);
        condition.matches(value)
    })
}

/// Build a [`Filter`] from a JSON object, using [`FilterValue::from_json`]
/// per field. A non-object yields an empty filter (matches everything).
pub fn filter_from_json(value: &Value) -> Filter {
    let mut filter = Filter::new();
    if let Value::Object(fields) = value {
        for (field, condition) in fields {
            filter.insert(field.clone(), FilterValue::from_json(condition));
        }
    }
    filter
}

/// Inclusive range check. Only numeric or date-like values qualify; a
/// present bound that cannot be read in the value's domain fails the match.
fn range_matches(value: &Value, min: Option<&Value>, max: Option<&Value>) -> bool {
    if let Some(n) = value.as_f64() {
        let lower_ok = min.map_or(true, |m| m.as_f64().map_or(false, |lo| n >= lo));
        let upper_ok = max.map_or(true, |m| m.as_f64().map_or(false, |hi| n <= hi));
        return lower_ok && upper_ok;
    }
    if let Some(t) = as_instant(value) {
        let lower_ok = min.map_or(true, |m| as_instant(m).map_or(false, |lo| t >= lo));
        let upper_ok = max.map_or(true, |m| as_instant(m).map_or(false, |hi| t <= hi));
        return lower_ok && upper_ok;
    }
    false
}

/// A date-like value is an RFC 3339 string; dates compare by instant, so
/// offsets are normalized away.
fn as_instant(value: &Value) -> Option<i64> {
    let text = value.as_str()?;
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().unwrap().clone()
    }

    fn single(field: &str, condition: FilterValue) -> Filter {
        Filter::from([(field.to_string(), condition)])
    }

    #[test]
    fn test_literal_equality() {
        let d = doc(json!({"age": 30, "active": true}));
        assert!(matches_filter(&d, &single("age", FilterValue::literal(30))));
        assert!(matches_filter(&d, &single("active", FilterValue::literal(true))));
        assert!(!matches_filter(&d, &single("age", FilterValue::literal(31))));
    }

    #[test]
    fn test_substring_match_is_case_insensitive() {
        let d = doc(json!({"name": "Alice"}));
        assert!(matches_filter(&d, &single("name", FilterValue::literal("ali"))));
        assert!(matches_filter(&d, &single("name", FilterValue::literal("LICE"))));
        assert!(!matches_filter(&d, &single("name", FilterValue::literal("bob"))));
    }

    #[test]
    fn test_string_filter_against_non_string_value() {
        // No substring semantics unless both sides are text
        let d = doc(json!({"age": 30}));
        assert!(!matches_filter(&d, &single("age", FilterValue::literal("30"))));
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let cond = FilterValue::range(Some(json!(18)), Some(json!(30)));
        assert!(cond.matches(&json!(18)));
        assert!(cond.matches(&json!(30)));
        assert!(cond.matches(&json!(24)));
        assert!(!cond.matches(&json!(17)));
        assert!(!cond.matches(&json!(31)));
    }

    #[test]
    fn test_range_bounds_optional() {
        let no_upper = FilterValue::range(Some(json!(18)), None);
        assert!(no_upper.matches(&json!(1_000_000)));
        assert!(!no_upper.matches(&json!(17)));

        let no_lower = FilterValue::range(None, Some(json!(30)));
        assert!(no_lower.matches(&json!(-5)));
        assert!(!no_lower.matches(&json!(31)));
    }

    #[test]
    fn test_range_rejects_unqualified_types() {
        let cond = FilterValue::range(Some(json!(0)), Some(json!(10)));
        assert!(!cond.matches(&json!("five")));
        assert!(!cond.matches(&json!(true)));
        assert!(!cond.matches(&json!(null)));
        assert!(!cond.matches(&json!([1, 2])));
    }

    #[test]
    fn test_range_with_uninterpretable_bound_fails() {
        let cond = FilterValue::range(Some(json!("not a number")), None);
        assert!(!cond.matches(&json!(5)));
    }

    #[test]
    fn test_range_over_dates_compares_instants() {
        let cond = FilterValue::range(
            Some(json!("2024-01-01T00:00:00Z")),
            Some(json!("2024-12-31T23:59:59Z")),
        );
        assert!(cond.matches(&json!("2024-06-15T12:00:00Z")));
        assert!(cond.matches(&json!("2024-01-01T00:00:00Z")));
        assert!(!cond.matches(&json!("2023-12-31T23:59:59Z")));
        // Same instant expressed in a different offset
        assert!(cond.matches(&json!("2024-01-01T02:00:00+02:00")));
    }

    #[test]
    fn test_predicate_receives_null_for_absent_field() {
        let d = doc(json!({"name": "Alice"}));
        let cond = FilterValue::predicate(|v| v.is_null());
        assert!(matches_filter(&d, &single("missing", cond)));
    }

    #[test]
    fn test_predicate_takes_precedence() {
        let d = doc(json!({"age": 17}));
        let cond = FilterValue::predicate(|v| v.as_i64().map_or(false, |n| n % 2 == 1));
        assert!(matches_filter(&d, &single("age", cond)));
    }

    #[test]
    fn test_all_fields_must_match() {
        let d = doc(json!({"name": "Alice", "age": 30}));
        let mut filter = single("name", FilterValue::literal("ali"));
        filter.insert("age".to_string(), FilterValue::literal(30));
        assert!(matches_filter(&d, &filter));

        filter.insert("age".to_string(), FilterValue::literal(31));
        assert!(!matches_filter(&d, &filter));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let d = doc(json!({"anything": 1}));
        assert!(matches_filter(&d, &Filter::new()));
    }

    #[test]
    fn test_filter_from_json() {
        let filter = filter_from_json(&json!({
            "name": "ali",
            "age": {"min": 18, "max": 30}
        }));

        let d = doc(json!({"name": "Alice", "age": 25}));
        assert!(matches_filter(&d, &filter));

        let d = doc(json!({"name": "Alice", "age": 31}));
        assert!(!matches_filter(&d, &filter));
    }

    #[test]
    fn test_filter_from_json_object_is_range() {
        // Any plain object reads as a range descriptor, so one without
        // bounds matches any numeric or date-like value
        let filter = filter_from_json(&json!({"age": {}}));
        assert!(matches_filter(&doc(json!({"age": 30})), &filter));
        assert!(!matches_filter(&doc(json!({"age": "thirty"})), &filter));
    }
}
