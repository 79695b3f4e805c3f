use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::document::{
    DocumentId, DocumentSummary, ExtractedInfo, ExtractedInfoView, FieldQuery,
    NewStoredDocument, StoredDocument,
};

use super::Result;

/// Backing store for encrypted document records.
///
/// Implementations must make every write durable before returning and must
/// keep each call atomic for the single record it touches. Listing and
/// search never read cipher material.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Liveness check used when a connection is established.
    async fn ping(&self) -> Result<()>;

    /// Inserts a new record and returns the id the store assigned to it.
    async fn insert_document(&self, document: NewStoredDocument) -> Result<DocumentId>;

    /// Gets a full record, cipher material included.
    async fn find_document(&self, id: DocumentId) -> Result<Option<StoredDocument>>;

    /// Deletes a record, returning how many records were removed.
    async fn delete_document(&self, id: DocumentId) -> Result<u64>;

    /// Lists every record without cipher material, in creation order.
    async fn list_documents(&self) -> Result<Vec<DocumentSummary>>;

    /// Lists records whose extracted info matches the query.
    async fn search_documents(&self, query: &FieldQuery) -> Result<Vec<DocumentSummary>>;

    /// Replaces extracted info, bumps `last_modified` and appends one ledger
    /// entry, all atomically. Returns how many records matched.
    async fn replace_extracted_info(
        &self,
        id: DocumentId,
        info: ExtractedInfo,
        source: &str,
        now: DateTime<Utc>,
    ) -> Result<u64>;

    /// Gets just the extracted info and its ledger.
    async fn find_extracted_info(&self, id: DocumentId) -> Result<Option<ExtractedInfoView>>;

    /// Flushes whatever the backend can before the handle is dropped.
    ///
    /// Backends may keep the handle usable; resources are released when the
    /// last reference drops.
    async fn close(&self) -> Result<()>;
}
