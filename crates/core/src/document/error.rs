use thiserror::Error;

/// Errors raised when caller-supplied input fails validation at the
/// repository boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid document id: {0}")]
    InvalidId(String),
    #[error("Document name cannot be empty")]
    EmptyName,
    #[error("Content type cannot be empty")]
    EmptyContentType,
    #[error("Extraction source cannot be empty")]
    EmptySource,
    #[error("Extracted field names cannot be empty")]
    EmptyFieldName,
    #[error("Extracted field name cannot contain '.': {0}")]
    DottedFieldName(String),
    #[error("Extracted info nested deeper than {max} levels at '{path}'")]
    TooDeep { path: String, max: usize },
    #[error("Unsupported extracted value at '{path}': {reason}")]
    UnsupportedValue { path: String, reason: String },
    #[error("Query path is malformed: '{0}'")]
    InvalidQueryPath(String),
}
