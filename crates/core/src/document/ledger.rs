//! Rules for the append-only extraction ledger.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use super::types::{ExtractedInfo, LedgerEntry, INITIAL_UPLOAD_SOURCE};

/// Returns the set of top-level field names in an extracted-info bag.
pub fn field_names(info: &ExtractedInfo) -> BTreeSet<String> {
    info.keys().cloned().collect()
}

/// Builds the first ledger entry recorded when a document is saved.
pub fn initial_entry(info: &ExtractedInfo, now: DateTime<Utc>) -> LedgerEntry {
    LedgerEntry {
        timestamp: now,
        fields: field_names(info),
        source: INITIAL_UPLOAD_SOURCE.to_string(),
    }
}

/// Builds the entry appended after `history` when extracted info is replaced.
///
/// The timestamp never goes backwards: a wall clock that stepped back is
/// clamped to the previous entry's timestamp.
pub fn next_entry(
    history: &[LedgerEntry],
    info: &ExtractedInfo,
    source: &str,
    now: DateTime<Utc>,
) -> LedgerEntry {
    let timestamp = match history.last() {
        Some(last) if last.timestamp > now => last.timestamp,
        _ => now,
    };
    LedgerEntry {
        timestamp,
        fields: field_names(info),
        source: source.to_string(),
    }
}

/// Checks the ledger invariants: non-empty, opened by an initial upload,
/// and timestamps non-decreasing.
pub fn is_well_formed(history: &[LedgerEntry]) -> bool {
    match history.first() {
        Some(first) if first.source == INITIAL_UPLOAD_SOURCE => history
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ExtractedValue;
    use chrono::Duration;

    fn info(keys: &[&str]) -> ExtractedInfo {
        keys.iter()
            .map(|k| (k.to_string(), ExtractedValue::from("x")))
            .collect()
    }

    #[test]
    fn test_initial_entry_records_fields_and_source() {
        let now = Utc::now();
        let entry = initial_entry(&info(&["ssn", "firstName"]), now);

        assert_eq!(entry.source, INITIAL_UPLOAD_SOURCE);
        assert_eq!(entry.timestamp, now);
        let fields: Vec<&str> = entry.fields.iter().map(String::as_str).collect();
        assert_eq!(fields, vec!["firstName", "ssn"]);
    }

    #[test]
    fn test_initial_entry_with_empty_info() {
        let entry = initial_entry(&ExtractedInfo::new(), Utc::now());
        assert!(entry.fields.is_empty());
    }

    #[test]
    fn test_next_entry_uses_current_time() {
        let start = Utc::now();
        let history = vec![initial_entry(&ExtractedInfo::new(), start)];
        let later = start + Duration::seconds(5);

        let entry = next_entry(&history, &info(&["ssn"]), "manual_update", later);

        assert_eq!(entry.timestamp, later);
        assert_eq!(entry.source, "manual_update");
        assert!(entry.fields.contains("ssn"));
    }

    #[test]
    fn test_next_entry_clamps_clock_going_backwards() {
        let start = Utc::now();
        let history = vec![initial_entry(&ExtractedInfo::new(), start)];
        let earlier = start - Duration::seconds(30);

        let entry = next_entry(&history, &ExtractedInfo::new(), "rag", earlier);

        assert_eq!(entry.timestamp, start);
    }

    #[test]
    fn test_is_well_formed() {
        let start = Utc::now();
        let first = initial_entry(&ExtractedInfo::new(), start);
        let second = next_entry(&[first.clone()], &ExtractedInfo::new(), "rag", start);

        assert!(is_well_formed(&[first.clone(), second.clone()]));
        assert!(!is_well_formed(&[]));
        assert!(!is_well_formed(&[second.clone()]));

        let mut out_of_order = second;
        out_of_order.timestamp = start - Duration::seconds(1);
        assert!(!is_well_formed(&[first, out_of_order]));
    }
}
