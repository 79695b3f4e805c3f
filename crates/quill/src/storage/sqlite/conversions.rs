//! SQLite row conversion functions.
//!
//! Pure functions for converting between SQLite rows and domain types.
//! These are testable in isolation without database access.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use quill_core::document::{
    DocumentId, DocumentMetadata, DocumentSummary, ExtractedInfo, LedgerEntry, SealedContent,
    StoredDocument,
};
use quill_core::storage::RepositoryError;
use rusqlite::Row;
use uuid::Uuid;

// ============================================================================
// Document conversions
// ============================================================================

/// Convert a SQLite row to a DocumentSummary.
///
/// Expected columns: id, name, size, content_type, created_at, last_modified, extracted_info
pub fn row_to_summary(row: &Row) -> rusqlite::Result<DocumentSummary> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    let size: i64 = row.get(2)?;
    let content_type: String = row.get(3)?;
    let created_at: String = row.get(4)?;
    let last_modified: String = row.get(5)?;
    let extracted_info: String = row.get(6)?;

    Ok(DocumentSummary {
        id: parse_document_id(&id)?,
        name,
        metadata: DocumentMetadata {
            size: parse_size(size)?,
            content_type,
            created_at: parse_datetime(&created_at)?,
            last_modified: parse_datetime(&last_modified)?,
        },
        extracted_info: json_to_extracted_info_internal(&extracted_info)?,
    })
}

/// Convert a SQLite row to a StoredDocument with an empty ledger.
///
/// Expected columns: the summary columns followed by cipher_content, iv, auth_tag
pub fn row_to_stored_document(row: &Row) -> rusqlite::Result<StoredDocument> {
    let summary = row_to_summary(row)?;
    let cipher_content: Vec<u8> = row.get(7)?;
    let iv: Vec<u8> = row.get(8)?;
    let auth_tag: Vec<u8> = row.get(9)?;

    Ok(StoredDocument {
        id: summary.id,
        name: summary.name,
        content: SealedContent {
            cipher_content,
            iv,
            auth_tag,
        },
        metadata: summary.metadata,
        extracted_info: summary.extracted_info,
        extraction_history: Vec::new(),
    })
}

// ============================================================================
// Ledger conversions
// ============================================================================

/// Convert a SQLite row to a LedgerEntry.
///
/// Expected columns: timestamp, fields, source (offset by `first`)
pub fn row_to_ledger_entry_at(row: &Row, first: usize) -> rusqlite::Result<LedgerEntry> {
    let timestamp: String = row.get(first)?;
    let fields: String = row.get(first + 1)?;
    let source: String = row.get(first + 2)?;

    Ok(LedgerEntry {
        timestamp: parse_datetime(&timestamp)?,
        fields: serde_json::from_str::<BTreeSet<String>>(&fields).map_err(conversion_failure)?,
        source,
    })
}

/// Convert a SQLite row to a LedgerEntry.
///
/// Expected columns: timestamp, fields, source
pub fn row_to_ledger_entry(row: &Row) -> rusqlite::Result<LedgerEntry> {
    row_to_ledger_entry_at(row, 0)
}

/// Serialize ExtractedInfo to a JSON string.
pub fn extracted_info_to_json(info: &ExtractedInfo) -> Result<String, RepositoryError> {
    serde_json::to_string(info).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

/// Serialize a ledger entry's field set to a JSON array string.
pub fn fields_to_json(fields: &BTreeSet<String>) -> Result<String, RepositoryError> {
    serde_json::to_string(fields).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

/// Internal version that returns rusqlite::Result for use in row conversions.
fn json_to_extracted_info_internal(json: &str) -> rusqlite::Result<ExtractedInfo> {
    serde_json::from_str(json).map_err(conversion_failure)
}

/// Convert a document size for SQLite storage.
pub fn size_to_sql(size: u64) -> Result<i64, RepositoryError> {
    i64::try_from(size)
        .map_err(|_| RepositoryError::Serialization(format!("size {size} does not fit in SQLite")))
}

// ============================================================================
// Helper functions
// ============================================================================

fn conversion_failure<E>(err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(err))
}

/// Parse a DocumentId from string.
fn parse_document_id(s: &str) -> rusqlite::Result<DocumentId> {
    Uuid::parse_str(s)
        .map(DocumentId::from)
        .map_err(conversion_failure)
}

fn parse_size(size: i64) -> rusqlite::Result<u64> {
    u64::try_from(size).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Integer, Box::new(e))
    })
}

/// Parse a datetime from RFC 3339 string.
fn parse_datetime(s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(conversion_failure)
}

/// Format a DateTime<Utc> for SQLite storage (RFC 3339).
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}
