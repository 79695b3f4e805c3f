//! SQLite document store implementation.
//!
//! Implements `DocumentStore` from `quill_core::storage` using SQLite.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_rusqlite::Connection;

use quill_core::document::{
    matches_query, next_entry, DocumentId, DocumentSummary, ExtractedInfo, ExtractedInfoView,
    FieldQuery, NewStoredDocument, StoredDocument,
};
use quill_core::storage::{DocumentStore, RepositoryError, Result};

use super::conversions::{
    extracted_info_to_json, fields_to_json, format_datetime, row_to_ledger_entry,
    row_to_ledger_entry_at, row_to_stored_document, row_to_summary, size_to_sql,
};
use super::error::{map_tokio_rusqlite_error, map_tokio_rusqlite_error_with_id};
use super::schema;
use crate::connection::Connector;

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

/// SQLite-based document store.
///
/// Documents live in one table, the extraction ledger in another keyed by
/// `(document_id, seq)`. Writes run with `synchronous = FULL` so they are
/// durable when the call returns.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates a new store with a file-based database.
    ///
    /// The database file will be created if it doesn't exist.
    /// Schema tables are created automatically.
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let conn = Connection::open(path.into())
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    /// Creates a new store with an in-memory database.
    ///
    /// Useful for testing - data is lost when the connection is dropped.
    pub async fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    /// Initialize pragmas and the database schema.
    async fn init_schema(conn: &Connection) -> Result<()> {
        conn.call(|conn| {
            // In-memory databases answer "memory" here; either mode is fine.
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                row.get::<_, String>(0)
            })
            .map_err(wrap_err)?;
            conn.pragma_update(None, "synchronous", "FULL")
                .map_err(wrap_err)?;
            conn.pragma_update(None, "foreign_keys", true)
                .map_err(wrap_err)?;
            conn.execute_batch(schema::CREATE_TABLES)
                .map_err(wrap_err)?;
            Ok(())
        })
        .await
        .map_err(|e| map_tokio_rusqlite_error(e, "Schema"))
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn ping(&self) -> Result<()> {
        self.conn
            .call(|conn| {
                conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                    .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))
    }

    async fn insert_document(&self, document: NewStoredDocument) -> Result<DocumentId> {
        let id = DocumentId::generate();
        let id_str = id.to_string();
        let size = size_to_sql(document.metadata.size)?;
        let info_json = extracted_info_to_json(&document.extracted_info)?;
        let created_at = format_datetime(&document.metadata.created_at);
        let last_modified = format_datetime(&document.metadata.last_modified);
        let ledger = document
            .extraction_history
            .iter()
            .map(|entry| {
                Ok((
                    format_datetime(&entry.timestamp),
                    fields_to_json(&entry.fields)?,
                    entry.source.clone(),
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        let NewStoredDocument {
            name,
            content,
            metadata,
            ..
        } = document;

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                tx.execute(
                    schema::INSERT_DOCUMENT,
                    rusqlite::params![
                        id_str,
                        name,
                        size,
                        metadata.content_type,
                        content.cipher_content,
                        content.iv,
                        content.auth_tag,
                        info_json,
                        created_at,
                        last_modified
                    ],
                )
                .map_err(wrap_err)?;
                for (seq, (timestamp, fields, source)) in ledger.iter().enumerate() {
                    tx.execute(
                        schema::INSERT_LEDGER_ENTRY,
                        rusqlite::params![id_str, seq as i64 + 1, timestamp, fields, source],
                    )
                    .map_err(wrap_err)?;
                }
                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Document", id.to_string()))?;

        Ok(id)
    }

    async fn find_document(&self, id: DocumentId) -> Result<Option<StoredDocument>> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_DOCUMENT_BY_ID)
                    .map_err(wrap_err)?;
                let mut document = match stmt.query_row([&id_str], row_to_stored_document) {
                    Ok(document) => document,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                    Err(e) => return Err(wrap_err(e)),
                };

                let mut stmt = conn
                    .prepare(schema::SELECT_LEDGER_BY_DOCUMENT)
                    .map_err(wrap_err)?;
                let rows = stmt
                    .query_map([&id_str], row_to_ledger_entry)
                    .map_err(wrap_err)?;
                for row_result in rows {
                    document
                        .extraction_history
                        .push(row_result.map_err(wrap_err)?);
                }
                Ok(Some(document))
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Document", id.to_string()))
    }

    async fn delete_document(&self, id: DocumentId) -> Result<u64> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(schema::DELETE_DOCUMENT, [&id_str])
                    .map_err(wrap_err)?;
                Ok(rows as u64)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Document", id.to_string()))
    }

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        self.conn
            .call(|conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_DOCUMENT_SUMMARIES)
                    .map_err(wrap_err)?;
                let rows = stmt.query_map([], row_to_summary).map_err(wrap_err)?;

                let mut documents = Vec::new();
                for row_result in rows {
                    documents.push(row_result.map_err(wrap_err)?);
                }
                Ok(documents)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Document"))
    }

    async fn search_documents(&self, query: &FieldQuery) -> Result<Vec<DocumentSummary>> {
        // Filtering happens in-process so numeric equality matches the
        // in-memory backend exactly.
        let mut documents = self.list_documents().await?;
        documents.retain(|document| matches_query(&document.extracted_info, query));
        Ok(documents)
    }

    async fn replace_extracted_info(
        &self,
        id: DocumentId,
        info: ExtractedInfo,
        source: &str,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let id_str = id.to_string();
        let info_json = extracted_info_to_json(&info)?;
        let source = source.to_string();

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;

                let last = match tx.query_row(
                    schema::SELECT_LAST_LEDGER_ENTRY,
                    [&id_str],
                    |row| Ok((row.get::<_, i64>(0)?, row_to_ledger_entry_at(row, 1)?)),
                ) {
                    Ok(last) => Some(last),
                    Err(rusqlite::Error::QueryReturnedNoRows) => None,
                    Err(e) => return Err(wrap_err(e)),
                };
                let (seq, history) = match last {
                    Some((seq, entry)) => (seq + 1, vec![entry]),
                    None => (1, Vec::new()),
                };
                let entry = next_entry(&history, &info, &source, now);
                let timestamp = format_datetime(&entry.timestamp);
                let fields = serde_json::to_string(&entry.fields)
                    .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;

                let matched = tx
                    .execute(
                        schema::UPDATE_EXTRACTED_INFO,
                        rusqlite::params![id_str, info_json, timestamp],
                    )
                    .map_err(wrap_err)?;
                if matched == 0 {
                    return Ok(0);
                }

                tx.execute(
                    schema::INSERT_LEDGER_ENTRY,
                    rusqlite::params![id_str, seq, timestamp, fields, entry.source],
                )
                .map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok(matched as u64)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Document", id.to_string()))
    }

    async fn find_extracted_info(&self, id: DocumentId) -> Result<Option<ExtractedInfoView>> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let info_json: String = match conn.query_row(
                    schema::SELECT_EXTRACTED_INFO_BY_ID,
                    [&id_str],
                    |row| row.get(0),
                ) {
                    Ok(json) => json,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                    Err(e) => return Err(wrap_err(e)),
                };
                let extracted_info: ExtractedInfo = serde_json::from_str(&info_json)
                    .map_err(|e| {
                        wrap_err(rusqlite::Error::FromSqlConversionFailure(
                            0,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        ))
                    })?;

                let mut stmt = conn
                    .prepare(schema::SELECT_LEDGER_BY_DOCUMENT)
                    .map_err(wrap_err)?;
                let rows = stmt
                    .query_map([&id_str], row_to_ledger_entry)
                    .map_err(wrap_err)?;
                let mut extraction_history = Vec::new();
                for row_result in rows {
                    extraction_history.push(row_result.map_err(wrap_err)?);
                }

                Ok(Some(ExtractedInfoView {
                    extracted_info,
                    extraction_history,
                }))
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Document", id.to_string()))
    }

    /// Runs `PRAGMA optimize`. The connection stays open until the last
    /// handle is dropped.
    async fn close(&self) -> Result<()> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA optimize;").map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Document"))
    }
}

/// Opens a [`SqliteStore`] at a file path on connect.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    path: PathBuf,
}

impl SqliteConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Connector for SqliteConnector {
    async fn open(&self) -> Result<Arc<dyn DocumentStore>> {
        let store = SqliteStore::new(self.path.clone()).await?;
        Ok(Arc::new(store))
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::document::{
        initial_entry, is_well_formed, DocumentMetadata, ExtractedValue, SealedContent,
        UploadMetadata,
    };
    use serde_json::json;

    fn new_document(name: &str, info: serde_json::Value) -> NewStoredDocument {
        let now = Utc::now();
        let extracted_info: ExtractedInfo = serde_json::from_value(info).unwrap();
        NewStoredDocument {
            name: name.to_string(),
            content: SealedContent {
                cipher_content: vec![9, 8, 7, 6],
                iv: vec![1; 16],
                auth_tag: vec![2; 16],
            },
            metadata: DocumentMetadata::stamped(UploadMetadata::new(4, "application/pdf"), now),
            extraction_history: vec![initial_entry(&extracted_info, now)],
            extracted_info,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_round_trips_every_column() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        let document = new_document("w2.pdf", json!({ "ssn": "000-11-2222", "wages": 52000 }));
        let expected_metadata = document.metadata.clone();
        let id = store.insert_document(document).await.unwrap();

        let found = store.find_document(id).await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.name, "w2.pdf");
        assert_eq!(found.content.cipher_content, vec![9, 8, 7, 6]);
        assert_eq!(found.content.iv, vec![1; 16]);
        assert_eq!(found.content.auth_tag, vec![2; 16]);
        assert_eq!(found.metadata, expected_metadata);
        assert_eq!(
            found.extracted_info.get("wages").and_then(ExtractedValue::as_f64),
            Some(52000.0)
        );
        assert_eq!(found.extraction_history.len(), 1);
        assert!(is_well_formed(&found.extraction_history));
    }

    #[tokio::test]
    async fn test_find_nonexistent() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        assert!(store
            .find_document(DocumentId::generate())
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_extracted_info(DocumentId::generate())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_cascades_to_ledger() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        let id = store
            .insert_document(new_document("w2.pdf", json!({})))
            .await
            .unwrap();

        assert_eq!(store.delete_document(id).await.unwrap(), 1);
        assert_eq!(store.delete_document(id).await.unwrap(), 0);

        let orphans: i64 = store
            .conn
            .call(|conn| {
                conn.query_row("SELECT COUNT(*) FROM extraction_history", [], |row| {
                    row.get(0)
                })
                .map_err(wrap_err)
            })
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_list_in_creation_order() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        for name in ["a.pdf", "b.pdf", "c.pdf"] {
            store
                .insert_document(new_document(name, json!({})))
                .await
                .unwrap();
        }

        let names: Vec<String> = store
            .list_documents()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf", "c.pdf"]);
    }

    #[tokio::test]
    async fn test_search_compares_numbers_by_value() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        store
            .insert_document(new_document("w2.pdf", json!({ "year": 2023 })))
            .await
            .unwrap();
        store
            .insert_document(new_document("w2-old.pdf", json!({ "year": 2022 })))
            .await
            .unwrap();

        let query: FieldQuery = serde_json::from_value(json!({ "year": 2023.0 })).unwrap();
        let results = store.search_documents(&query).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "w2.pdf");
    }

    #[tokio::test]
    async fn test_replace_appends_to_ledger_in_order() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        let id = store
            .insert_document(new_document("w2.pdf", json!({ "ssn": "000-11-2222" })))
            .await
            .unwrap();

        for source in ["ocr", "manual_update", "review"] {
            let mut info = ExtractedInfo::new();
            info.insert(source.to_string(), ExtractedValue::from("seen"));
            assert_eq!(
                store
                    .replace_extracted_info(id, info, source, Utc::now())
                    .await
                    .unwrap(),
                1
            );
        }

        let view = store.find_extracted_info(id).await.unwrap().unwrap();
        let sources: Vec<&str> = view
            .extraction_history
            .iter()
            .map(|entry| entry.source.as_str())
            .collect();
        assert_eq!(
            sources,
            vec!["initial_upload", "ocr", "manual_update", "review"]
        );
        assert!(is_well_formed(&view.extraction_history));
        assert!(view.extracted_info.contains_key("review"));
        assert!(!view.extracted_info.contains_key("ssn"));
    }

    #[tokio::test]
    async fn test_replace_clamps_backwards_clock() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        let id = store
            .insert_document(new_document("w2.pdf", json!({})))
            .await
            .unwrap();

        let earlier = Utc::now() - chrono::Duration::hours(1);
        store
            .replace_extracted_info(id, ExtractedInfo::new(), "ocr", earlier)
            .await
            .unwrap();

        let found = store.find_document(id).await.unwrap().unwrap();
        let history = &found.extraction_history;
        assert_eq!(history[1].timestamp, history[0].timestamp);
        assert_eq!(found.metadata.last_modified, history[1].timestamp);
    }

    #[tokio::test]
    async fn test_replace_nonexistent_matches_nothing() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        let matched = store
            .replace_extracted_info(DocumentId::generate(), ExtractedInfo::new(), "ocr", Utc::now())
            .await
            .unwrap();
        assert_eq!(matched, 0);
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let path = std::env::temp_dir().join(format!("quill-{}.db", DocumentId::generate()));
        let id = {
            let store = SqliteStore::new(path.clone()).await.unwrap();
            let id = store
                .insert_document(new_document("w2.pdf", json!({ "year": 2023 })))
                .await
                .unwrap();
            store.close().await.unwrap();
            id
        };

        let reopened = SqliteConnector::new(path.clone()).open().await.unwrap();
        assert!(reopened.find_document(id).await.unwrap().is_some());

        drop(reopened);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_close_keeps_handle_usable_until_dropped() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        let id = store
            .insert_document(new_document("w2.pdf", json!({})))
            .await
            .unwrap();

        store.close().await.unwrap();

        store.ping().await.unwrap();
        assert!(store.find_document(id).await.unwrap().is_some());
        store.close().await.unwrap();
    }
}
