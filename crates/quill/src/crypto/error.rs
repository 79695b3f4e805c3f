//! Codec error type and its mapping to `RepositoryError`.

use quill_core::storage::RepositoryError;
use thiserror::Error;

/// Errors raised by the encryption codec.
///
/// None of the variants carry plaintext, key bytes or cipher parameters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),
    #[error("Encryption failed")]
    Encryption,
    #[error("Authentication tag verification failed")]
    Integrity,
}

/// Maps a codec error raised while handling a known document.
pub fn map_codec_error(err: CodecError, id: impl ToString) -> RepositoryError {
    match err {
        CodecError::Integrity => RepositoryError::IntegrityCheckFailed {
            entity_type: "Document",
            id: id.to_string(),
        },
        other => RepositoryError::QueryFailed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrity_maps_to_integrity_check_failed() {
        let result = map_codec_error(CodecError::Integrity, "doc-1");
        assert_eq!(
            result,
            RepositoryError::IntegrityCheckFailed {
                entity_type: "Document",
                id: "doc-1".to_string(),
            }
        );
    }

    #[test]
    fn test_encryption_maps_to_query_failed() {
        let result = map_codec_error(CodecError::Encryption, "new document");
        assert_eq!(
            result,
            RepositoryError::QueryFailed("Encryption failed".to_string())
        );
    }
}
