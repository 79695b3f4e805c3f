use thiserror::Error;

use crate::document::ValidationError;

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// Authentication tag verification failed. Carries no plaintext.
    #[error("Integrity check failed for {entity_type} {id}")]
    IntegrityCheckFailed {
        entity_type: &'static str,
        id: String,
    },
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RepositoryError {
    /// Shorthand for a missing document.
    pub fn document_not_found(id: impl ToString) -> Self {
        RepositoryError::NotFound {
            entity_type: "Document",
            id: id.to_string(),
        }
    }

    /// Returns true for the error kind `get` retries on.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
