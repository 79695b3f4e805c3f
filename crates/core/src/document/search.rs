//! Exact-match filtering over the extracted-info namespace.
//!
//! Query keys are dot paths: `ssn` addresses a top-level field and
//! `address.city` walks into nested objects. Every key in a query must match
//! for a document to be selected, so the empty query selects everything.

use std::collections::BTreeMap;

use super::error::ValidationError;
use super::types::{ExtractedInfo, ExtractedValue};

/// A search query: dot path to the value it must equal.
pub type FieldQuery = BTreeMap<String, ExtractedValue>;

/// Validates that every query key is a well-formed dot path.
pub fn validate_query(query: &FieldQuery) -> Result<(), ValidationError> {
    for path in query.keys() {
        if path.is_empty() || path.split('.').any(str::is_empty) {
            return Err(ValidationError::InvalidQueryPath(path.clone()));
        }
    }
    Ok(())
}

/// Resolves a dot path against an extracted-info bag.
pub fn resolve_path<'a>(info: &'a ExtractedInfo, path: &str) -> Option<&'a ExtractedValue> {
    let mut segments = path.split('.');
    let mut current = info.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Returns true when every query path resolves to an equal value.
pub fn matches_query(info: &ExtractedInfo, query: &FieldQuery) -> bool {
    query.iter().all(|(path, expected)| {
        resolve_path(info, path).is_some_and(|actual| values_equal(actual, expected))
    })
}

/// Deep equality where numbers compare by numeric value, so `1` equals `1.0`.
///
/// Two integers compare exactly; the float comparison only applies when at
/// least one side is a float.
pub fn values_equal(left: &ExtractedValue, right: &ExtractedValue) -> bool {
    match (left, right) {
        (ExtractedValue::Text(a), ExtractedValue::Text(b)) => a == b,
        (ExtractedValue::Number(a), ExtractedValue::Number(b)) => {
            if !a.is_f64() && !b.is_f64() {
                a.as_i64() == b.as_i64() && a.as_u64() == b.as_u64()
            } else {
                matches!((a.as_f64(), b.as_f64()), (Some(x), Some(y)) if x == y)
            }
        }
        (ExtractedValue::Object(a), ExtractedValue::Object(b)) => {
            a.len() == b.len()
                && a.iter().all(|(key, value)| {
                    b.get(key)
                        .is_some_and(|other| values_equal(value, other))
                })
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ExtractedInfo {
        serde_json::from_value(json!({
            "ssn": "000-11-2222",
            "firstName": "Ada",
            "address": { "city": "London", "zipCode": "N1" },
            "taxInfo": { "year": 2023, "w2Income": 85000.0 },
        }))
        .unwrap()
    }

    fn query(value: serde_json::Value) -> FieldQuery {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_empty_query_matches_everything() {
        assert!(matches_query(&sample(), &FieldQuery::new()));
        assert!(matches_query(&ExtractedInfo::new(), &FieldQuery::new()));
    }

    #[test]
    fn test_top_level_exact_match() {
        assert!(matches_query(&sample(), &query(json!({ "ssn": "000-11-2222" }))));
        assert!(!matches_query(&sample(), &query(json!({ "ssn": "111-22-3333" }))));
    }

    #[test]
    fn test_all_keys_must_match() {
        let q = query(json!({ "ssn": "000-11-2222", "firstName": "Grace" }));
        assert!(!matches_query(&sample(), &q));
    }

    #[test]
    fn test_missing_field_does_not_match() {
        assert!(!matches_query(&sample(), &query(json!({ "email": "a@b.c" }))));
    }

    #[test]
    fn test_dot_path_walks_nested_objects() {
        assert!(matches_query(&sample(), &query(json!({ "address.city": "London" }))));
        assert!(!matches_query(&sample(), &query(json!({ "address.city": "Paris" }))));
        assert!(!matches_query(&sample(), &query(json!({ "ssn.city": "London" }))));
    }

    #[test]
    fn test_numbers_compare_numerically() {
        assert!(matches_query(&sample(), &query(json!({ "taxInfo.year": 2023.0 }))));
        assert!(matches_query(&sample(), &query(json!({ "taxInfo.w2Income": 85000 }))));
    }

    #[test]
    fn test_large_integers_compare_exactly() {
        let info = query(json!({ "account": 9007199254740993u64 }));

        assert!(!matches_query(&info, &query(json!({ "account": 9007199254740992u64 }))));
        assert!(matches_query(&info, &query(json!({ "account": 9007199254740993u64 }))));
        assert!(!values_equal(
            &ExtractedValue::from(i64::MAX),
            &ExtractedValue::from(i64::MAX - 1)
        ));
        assert!(!values_equal(
            &ExtractedValue::from(u64::MAX),
            &ExtractedValue::from(u64::MAX - 1)
        ));
        assert!(values_equal(&ExtractedValue::from(-7i64), &ExtractedValue::from(-7i64)));
        assert!(!values_equal(&ExtractedValue::from(-1i64), &ExtractedValue::from(u64::MAX)));
    }

    #[test]
    fn test_object_values_match_by_deep_equality() {
        let exact = query(json!({ "address": { "city": "London", "zipCode": "N1" } }));
        let partial = query(json!({ "address": { "city": "London" } }));

        assert!(matches_query(&sample(), &exact));
        assert!(!matches_query(&sample(), &partial));
    }

    #[test]
    fn test_text_never_equals_number() {
        let info = query(json!({ "year": "2023" }));
        assert!(!matches_query(&info, &query(json!({ "year": 2023 }))));
    }

    #[test]
    fn test_validate_query_rejects_empty_segments() {
        assert!(validate_query(&query(json!({ "address.city": "x" }))).is_ok());
        assert_eq!(
            validate_query(&query(json!({ "address..city": "x" }))),
            Err(ValidationError::InvalidQueryPath("address..city".to_string()))
        );
        assert!(validate_query(&query(json!({ ".ssn": "x" }))).is_err());
        assert!(validate_query(&query(json!({ "": "x" }))).is_err());
    }
}
