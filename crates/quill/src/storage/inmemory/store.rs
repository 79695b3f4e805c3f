//! In-memory document store implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use quill_core::document::{
    matches_query, next_entry, DocumentId, DocumentSummary, ExtractedInfo, ExtractedInfoView,
    FieldQuery, NewStoredDocument, StoredDocument,
};
use quill_core::storage::{DocumentStore, RepositoryError, Result};

use crate::connection::Connector;

#[derive(Debug, Clone)]
struct Slot {
    /// Insertion order, used to list in creation order.
    seq: u64,
    document: StoredDocument,
    /// Point reads that still miss this record before it becomes visible.
    hidden_reads: u32,
}

#[derive(Debug, Default)]
struct State {
    next_seq: u64,
    documents: HashMap<DocumentId, Slot>,
    read_attempts: HashMap<DocumentId, u32>,
}

/// In-memory storage backend for tests and ephemeral use.
///
/// Uses a HashMap wrapped in `Arc<RwLock<_>>` for thread-safe access; clones
/// share the same data. Data is lost when the last clone is dropped.
///
/// Faults can be injected to exercise the repository: simulated replication
/// lag hides freshly inserted records from the first point reads, an
/// availability switch makes `ping` fail, and a ping latency delays the
/// liveness check. Point reads are only counted once read tracking is
/// switched on.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
    replication_lag: Arc<AtomicU32>,
    track_reads: Arc<AtomicBool>,
    available: Arc<AtomicBool>,
    ping_latency: Arc<RwLock<Duration>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
            replication_lag: Arc::new(AtomicU32::new(0)),
            track_reads: Arc::new(AtomicBool::new(false)),
            available: Arc::new(AtomicBool::new(true)),
            ping_latency: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    /// Hides every subsequently inserted record from its first `reads` point
    /// reads, as a lagging replica would.
    pub fn with_replication_lag(self, reads: u32) -> Self {
        self.replication_lag.store(reads, Ordering::SeqCst);
        self
    }

    /// Counts point reads per id, see [`InMemoryStore::read_attempts`].
    pub fn with_read_tracking(self) -> Self {
        self.track_reads.store(true, Ordering::SeqCst);
        self
    }

    /// Delays every `ping` by the given duration.
    pub async fn set_ping_latency(&self, latency: Duration) {
        *self.ping_latency.write().await = latency;
    }

    /// Marks the store reachable or unreachable.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of point reads issued for an id so far. Always 0 unless read
    /// tracking is on.
    pub async fn read_attempts(&self, id: DocumentId) -> u32 {
        let state = self.state.read().await;
        state.read_attempts.get(&id).copied().unwrap_or(0)
    }

    /// Applies a mutation directly to a stored record, bypassing the store
    /// contract. Returns false when the id is unknown.
    pub async fn with_document_mut<F>(&self, id: DocumentId, f: F) -> bool
    where
        F: FnOnce(&mut StoredDocument),
    {
        let mut state = self.state.write().await;
        match state.documents.get_mut(&id) {
            Some(slot) => {
                f(&mut slot.document);
                true
            }
            None => false,
        }
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RepositoryError::ConnectionFailed(
                "in-memory store is unavailable".to_string(),
            ))
        }
    }

    fn summaries<'a, I>(slots: I) -> Vec<DocumentSummary>
    where
        I: Iterator<Item = &'a Slot>,
    {
        let mut slots: Vec<&Slot> = slots.collect();
        slots.sort_by_key(|slot| slot.seq);
        slots
            .into_iter()
            .map(|slot| DocumentSummary {
                id: slot.document.id,
                name: slot.document.name.clone(),
                metadata: slot.document.metadata.clone(),
                extracted_info: slot.document.extracted_info.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn ping(&self) -> Result<()> {
        let latency = *self.ping_latency.read().await;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.ensure_available()
    }

    async fn insert_document(&self, document: NewStoredDocument) -> Result<DocumentId> {
        self.ensure_available()?;
        let mut state = self.state.write().await;

        let id = DocumentId::generate();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.documents.insert(
            id,
            Slot {
                seq,
                document: StoredDocument {
                    id,
                    name: document.name,
                    content: document.content,
                    metadata: document.metadata,
                    extracted_info: document.extracted_info,
                    extraction_history: document.extraction_history,
                },
                hidden_reads: self.replication_lag.load(Ordering::SeqCst),
            },
        );
        Ok(id)
    }

    async fn find_document(&self, id: DocumentId) -> Result<Option<StoredDocument>> {
        self.ensure_available()?;
        let mut state = self.state.write().await;
        if self.track_reads.load(Ordering::SeqCst) {
            *state.read_attempts.entry(id).or_insert(0) += 1;
        }

        match state.documents.get_mut(&id) {
            Some(slot) if slot.hidden_reads > 0 => {
                slot.hidden_reads -= 1;
                Ok(None)
            }
            Some(slot) => Ok(Some(slot.document.clone())),
            None => Ok(None),
        }
    }

    async fn delete_document(&self, id: DocumentId) -> Result<u64> {
        self.ensure_available()?;
        let mut state = self.state.write().await;
        state.read_attempts.remove(&id);
        Ok(u64::from(state.documents.remove(&id).is_some()))
    }

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        self.ensure_available()?;
        let state = self.state.read().await;
        Ok(Self::summaries(state.documents.values()))
    }

    async fn search_documents(&self, query: &FieldQuery) -> Result<Vec<DocumentSummary>> {
        self.ensure_available()?;
        let state = self.state.read().await;
        Ok(Self::summaries(state.documents.values().filter(|slot| {
            matches_query(&slot.document.extracted_info, query)
        })))
    }

    async fn replace_extracted_info(
        &self,
        id: DocumentId,
        info: ExtractedInfo,
        source: &str,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        self.ensure_available()?;
        let mut state = self.state.write().await;
        let Some(slot) = state.documents.get_mut(&id) else {
            return Ok(0);
        };

        let document = &mut slot.document;
        let entry = next_entry(&document.extraction_history, &info, source, now);
        document.metadata.last_modified = entry.timestamp;
        document.extracted_info = info;
        document.extraction_history.push(entry);
        Ok(1)
    }

    async fn find_extracted_info(&self, id: DocumentId) -> Result<Option<ExtractedInfoView>> {
        self.ensure_available()?;
        let state = self.state.read().await;
        Ok(state.documents.get(&id).map(|slot| ExtractedInfoView {
            extracted_info: slot.document.extracted_info.clone(),
            extraction_history: slot.document.extraction_history.clone(),
        }))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Connecting hands out a handle onto the same shared data.
#[async_trait]
impl Connector for InMemoryStore {
    async fn open(&self) -> Result<Arc<dyn DocumentStore>> {
        Ok(Arc::new(self.clone()))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
