//! Lifecycle of the single store handle shared by every repository call.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use quill_core::storage::{DocumentStore, RepositoryError, Result};

/// Opens a storage backend.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a fresh handle onto the backend.
    async fn open(&self) -> Result<Arc<dyn DocumentStore>>;

    /// Short human-readable target, safe to log.
    fn describe(&self) -> String;
}

/// Owns at most one live store handle.
///
/// `connect` and `disconnect` are idempotent, and concurrent first calls to
/// `connect` establish a single handle. A failed connect leaves the manager
/// disconnected so the next call tries again.
pub struct ConnectionManager {
    connector: Box<dyn Connector>,
    timeout: Duration,
    handle: RwLock<Option<Arc<dyn DocumentStore>>>,
}

impl ConnectionManager {
    pub fn new(connector: impl Connector + 'static, timeout: Duration) -> Self {
        Self {
            connector: Box::new(connector),
            timeout,
            handle: RwLock::new(None),
        }
    }

    /// Establishes the connection and verifies it with a bounded liveness
    /// check. No-op when already connected.
    pub async fn connect(&self) -> Result<()> {
        self.store().await.map(|_| ())
    }

    /// Returns the live handle, connecting first if needed.
    pub async fn store(&self) -> Result<Arc<dyn DocumentStore>> {
        if let Some(store) = self.handle.read().await.as_ref() {
            return Ok(Arc::clone(store));
        }

        let mut handle = self.handle.write().await;
        // Another task may have connected while we waited for the lock.
        if let Some(store) = handle.as_ref() {
            return Ok(Arc::clone(store));
        }

        let backend = self.connector.describe();
        tracing::debug!(%backend, timeout_ms = self.timeout.as_millis() as u64, "Connecting to store");

        let store = tokio::time::timeout(self.timeout, async {
            let store = self.connector.open().await?;
            store.ping().await?;
            Ok::<_, RepositoryError>(store)
        })
        .await
        .map_err(|_| {
            RepositoryError::ConnectionFailed(format!(
                "liveness check against {backend} timed out after {}ms",
                self.timeout.as_millis()
            ))
        })?
        .map_err(|e| match e {
            RepositoryError::ConnectionFailed(_) => e,
            other => RepositoryError::ConnectionFailed(other.to_string()),
        })?;

        tracing::info!(%backend, "Connected to store");
        *handle = Some(Arc::clone(&store));
        Ok(store)
    }

    /// Releases the handle. No-op when not connected.
    pub async fn disconnect(&self) -> Result<()> {
        let store = self.handle.write().await.take();
        match store {
            Some(store) => {
                store.close().await?;
                tracing::debug!(backend = %self.connector.describe(), "Disconnected from store");
                Ok(())
            }
            None => Ok(()),
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.handle.read().await.is_some()
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("target", &self.connector.describe())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
