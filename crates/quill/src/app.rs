//! Wires configuration into a ready-to-use repository.

use std::sync::Arc;

use anyhow::Context;

use crate::config::{Config, StoreBackend};
use crate::connection::ConnectionManager;
use crate::crypto::{EncryptionCodec, EncryptionKey};
use crate::repository::DocumentRepository;
use crate::storage::InMemoryStore;

/// Derives the key, builds the connection manager for the configured
/// backend, and connects.
pub async fn build_repository(config: &Config) -> anyhow::Result<DocumentRepository> {
    let secret = config.secret.clone();
    let salt = config.key_salt.clone();
    let params = config.kdf;
    // Argon2 is CPU-bound; keep it off the async workers.
    let key = tokio::task::spawn_blocking(move || {
        EncryptionKey::derive(secret.expose(), salt.as_bytes(), params)
    })
    .await
    .context("key derivation task failed")?
    .context("failed to derive encryption key")?;
    let codec = EncryptionCodec::new(&key).context("failed to initialize codec")?;

    let connection = match &config.store {
        #[cfg(feature = "sqlite")]
        StoreBackend::Sqlite { path } => ConnectionManager::new(
            crate::storage::SqliteConnector::new(path.clone()),
            config.connect_timeout,
        ),
        #[cfg(not(feature = "sqlite"))]
        StoreBackend::Sqlite { .. } => {
            anyhow::bail!("SQLite support is not compiled in; set QUILL_STORE=memory")
        }
        StoreBackend::InMemory => {
            ConnectionManager::new(InMemoryStore::new(), config.connect_timeout)
        }
    };
    let connection = Arc::new(connection);
    connection.connect().await?;

    tracing::debug!(?connection, "Repository ready");
    Ok(DocumentRepository::new(connection, codec, config.read_retry))
}
