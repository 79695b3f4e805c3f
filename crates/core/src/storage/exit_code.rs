//! Pure functions for mapping repository errors to process exit codes.
//!
//! Codes follow the BSD `sysexits.h` conventions so scripts driving the CLI
//! can tell a missing document from an unreachable store.

use super::RepositoryError;

/// Maps a [`RepositoryError`] to a process exit code.
///
/// - `Validation` -> 64 (usage error)
/// - `IntegrityCheckFailed` -> 65 (data error)
/// - `NotFound` -> 66 (no input)
/// - `ConnectionFailed` -> 69 (service unavailable)
/// - `Serialization` -> 70 (internal software error)
/// - `QueryFailed` -> 74 (I/O error)
///
/// # Examples
///
/// ```
/// use quill_core::storage::{repository_error_to_exit_code, RepositoryError};
///
/// let error = RepositoryError::document_not_found("abc-123");
/// assert_eq!(repository_error_to_exit_code(&error), 66);
/// ```
pub fn repository_error_to_exit_code(error: &RepositoryError) -> u8 {
    match error {
        RepositoryError::Validation(_) => 64,
        RepositoryError::IntegrityCheckFailed { .. } => 65,
        RepositoryError::NotFound { .. } => 66,
        RepositoryError::ConnectionFailed(_) => 69,
        RepositoryError::Serialization(_) => 70,
        RepositoryError::QueryFailed(_) => 74,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ValidationError;

    #[test]
    fn test_not_found_maps_to_66() {
        let error = RepositoryError::document_not_found("doc-123");
        assert_eq!(repository_error_to_exit_code(&error), 66);
    }

    #[test]
    fn test_connection_failed_maps_to_69() {
        let error = RepositoryError::ConnectionFailed("refused".to_string());
        assert_eq!(repository_error_to_exit_code(&error), 69);
    }

    #[test]
    fn test_integrity_maps_to_65() {
        let error = RepositoryError::IntegrityCheckFailed {
            entity_type: "Document",
            id: "doc-123".to_string(),
        };
        assert_eq!(repository_error_to_exit_code(&error), 65);
    }

    #[test]
    fn test_validation_maps_to_64() {
        let error = RepositoryError::Validation(ValidationError::EmptyName);
        assert_eq!(repository_error_to_exit_code(&error), 64);
    }

    #[test]
    fn test_query_failed_maps_to_74() {
        let error = RepositoryError::QueryFailed("disk full".to_string());
        assert_eq!(repository_error_to_exit_code(&error), 74);
    }

    #[test]
    fn test_serialization_maps_to_70() {
        let error = RepositoryError::Serialization("bad json".to_string());
        assert_eq!(repository_error_to_exit_code(&error), 70);
    }
}
