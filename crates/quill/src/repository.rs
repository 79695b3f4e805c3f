//! The document repository: encryption on the way in and out, the
//! extraction ledger, and bounded retries against a lagging store.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;

use quill_core::document::{
    initial_entry, summarize, validate_extracted_info, validate_query, validate_source,
    validate_upload, Document, DocumentId, DocumentMetadata, DocumentSummary, ExtractedInfo,
    ExtractedInfoView, FieldQuery, InformationSummary, NewStoredDocument, StoredDocument,
    UploadMetadata,
};
use quill_core::storage::{DocumentStore, ReadRetryPolicy, RepositoryError, Result};

use crate::connection::ConnectionManager;
use crate::crypto::{map_codec_error, EncryptionCodec};

/// CRUD facade over encrypted document records.
///
/// Cheap to share behind an `Arc`; every method is a single awaited round
/// trip to the store except `get`, which retries bounded not-found reads.
#[derive(Debug)]
pub struct DocumentRepository {
    connection: Arc<ConnectionManager>,
    codec: EncryptionCodec,
    retry: ReadRetryPolicy,
}

impl DocumentRepository {
    pub fn new(
        connection: Arc<ConnectionManager>,
        codec: EncryptionCodec,
        retry: ReadRetryPolicy,
    ) -> Self {
        Self {
            connection,
            codec,
            retry,
        }
    }

    pub fn connection(&self) -> &Arc<ConnectionManager> {
        &self.connection
    }

    async fn store(&self) -> Result<Arc<dyn DocumentStore>> {
        self.connection.store().await
    }

    /// Encrypts and stores a new document.
    ///
    /// The returned summary carries the store-assigned id and never any
    /// cipher material.
    pub async fn save(
        &self,
        name: &str,
        content: &[u8],
        metadata: UploadMetadata,
        extracted_info: Option<ExtractedInfo>,
    ) -> Result<DocumentSummary> {
        validate_upload(name, &metadata)?;
        let extracted_info = extracted_info.unwrap_or_default();
        validate_extracted_info(&extracted_info)?;

        let sealed = self
            .codec
            .encrypt(content)
            .map_err(|e| map_codec_error(e, name))?;
        let now = Utc::now();
        let metadata = DocumentMetadata::stamped(metadata, now);

        let store = self.store().await?;
        let id = store
            .insert_document(NewStoredDocument {
                name: name.to_string(),
                content: sealed,
                metadata: metadata.clone(),
                extraction_history: vec![initial_entry(&extracted_info, now)],
                extracted_info: extracted_info.clone(),
            })
            .await?;

        tracing::info!(
            document_id = %id,
            size = metadata.size,
            fields = extracted_info.len(),
            "Saved document"
        );

        Ok(DocumentSummary {
            id,
            name: name.to_string(),
            metadata,
            extracted_info,
        })
    }

    /// Fetches and decrypts a document.
    ///
    /// A missing record is retried with linear backoff up to the policy's
    /// attempt bound, since a fresh write may not be visible yet. Integrity
    /// failures surface immediately.
    pub async fn get(&self, id: &str) -> Result<Document> {
        let id: DocumentId = id.parse()?;
        let store = self.store().await?;
        let started = Instant::now();

        let mut attempt = 1;
        let stored = loop {
            match store.find_document(id).await? {
                Some(stored) => break stored,
                None => match self.retry.next_delay(attempt, started.elapsed()) {
                    Some(delay) => {
                        tracing::debug!(
                            document_id = %id,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "Document not visible yet, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => {
                        tracing::debug!(document_id = %id, attempts = attempt, "Document not found");
                        return Err(RepositoryError::document_not_found(id));
                    }
                },
            }
        };

        self.open_sealed(stored)
    }

    fn open_sealed(&self, stored: StoredDocument) -> Result<Document> {
        let content = match self.codec.decrypt(&stored.content) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(
                    document_id = %stored.id,
                    has_content = !stored.content.cipher_content.is_empty(),
                    content_len = stored.content.cipher_content.len(),
                    iv_len = stored.content.iv.len(),
                    tag_len = stored.content.auth_tag.len(),
                    "Document failed integrity check"
                );
                return Err(map_codec_error(err, stored.id));
            }
        };

        Ok(Document {
            id: stored.id,
            name: stored.name,
            content,
            metadata: stored.metadata,
            extracted_info: stored.extracted_info,
        })
    }

    /// Deletes a document. Fails with `NotFound` when nothing was removed.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let id: DocumentId = id.parse()?;
        let removed = self.store().await?.delete_document(id).await?;
        if removed == 0 {
            return Err(RepositoryError::document_not_found(id));
        }

        tracing::info!(document_id = %id, "Deleted document");
        Ok(true)
    }

    /// Lists every document without cipher material, in creation order.
    pub async fn list(&self) -> Result<Vec<DocumentSummary>> {
        self.store().await?.list_documents().await
    }

    /// Replaces a document's extracted info wholesale and appends one ledger
    /// entry recording the new field names and their source.
    pub async fn update_extracted_info(
        &self,
        id: &str,
        extracted_info: ExtractedInfo,
        source: &str,
    ) -> Result<bool> {
        let id: DocumentId = id.parse()?;
        validate_extracted_info(&extracted_info)?;
        validate_source(source)?;

        let fields = extracted_info.len();
        let matched = self
            .store()
            .await?
            .replace_extracted_info(id, extracted_info, source, Utc::now())
            .await?;
        if matched == 0 {
            return Err(RepositoryError::document_not_found(id));
        }

        tracing::info!(document_id = %id, %source, fields, "Updated extracted info");
        Ok(true)
    }

    /// Gets a document's extracted info together with its ledger.
    pub async fn get_extracted_info(&self, id: &str) -> Result<ExtractedInfoView> {
        let id: DocumentId = id.parse()?;
        self.store()
            .await?
            .find_extracted_info(id)
            .await?
            .ok_or_else(|| RepositoryError::document_not_found(id))
    }

    /// Exact-match search over extracted info. Keys may be dot paths into
    /// nested objects.
    pub async fn search_by_extracted_info(&self, query: &FieldQuery) -> Result<Vec<DocumentSummary>> {
        validate_query(query)?;
        self.store().await?.search_documents(query).await
    }

    /// Aggregates every field seen across the corpus with the documents it
    /// came from.
    pub async fn get_information_summary(&self) -> Result<InformationSummary> {
        let documents = self.list().await?;
        Ok(summarize(&documents))
    }
}
