use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValidationError;

/// Ledger source recorded for the first entry of every document.
pub const INITIAL_UPLOAD_SOURCE: &str = "initial_upload";

/// Ledger source used when an operator edits extracted info by hand.
pub const MANUAL_UPDATE_SOURCE: &str = "manual_update";

/// Store-assigned document identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generates a fresh identifier. Only storage backends should call this.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for DocumentId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| ValidationError::InvalidId(s.to_string()))
    }
}

/// A single value inside the extracted-info bag.
///
/// Only strings, numbers and nested mappings are representable; booleans,
/// nulls and arrays are rejected when JSON is converted at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtractedValue {
    Text(String),
    Number(serde_json::Number),
    Object(ExtractedInfo),
}

/// Schema-flexible mapping of extracted field names to values.
pub type ExtractedInfo = BTreeMap<String, ExtractedValue>;

impl ExtractedValue {
    /// Builds a number value from a float, returning `None` for NaN or infinity.
    pub fn from_f64(value: f64) -> Option<Self> {
        serde_json::Number::from_f64(value).map(Self::Number)
    }

    /// Returns the string if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ExtractedValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the nested mapping if this is an object value.
    pub fn as_object(&self) -> Option<&ExtractedInfo> {
        match self {
            ExtractedValue::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the value as a float if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ExtractedValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }
}

impl From<&str> for ExtractedValue {
    fn from(value: &str) -> Self {
        ExtractedValue::Text(value.to_string())
    }
}

impl From<String> for ExtractedValue {
    fn from(value: String) -> Self {
        ExtractedValue::Text(value)
    }
}

impl From<i64> for ExtractedValue {
    fn from(value: i64) -> Self {
        ExtractedValue::Number(value.into())
    }
}

impl From<u64> for ExtractedValue {
    fn from(value: u64) -> Self {
        ExtractedValue::Number(value.into())
    }
}

impl From<ExtractedInfo> for ExtractedValue {
    fn from(value: ExtractedInfo) -> Self {
        ExtractedValue::Object(value)
    }
}

/// Metadata supplied by the caller when uploading a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    pub size: u64,
    pub content_type: String,
}

impl UploadMetadata {
    pub fn new(size: u64, content_type: impl Into<String>) -> Self {
        Self {
            size,
            content_type: content_type.into(),
        }
    }
}

/// Metadata persisted with every document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub size: u64,
    pub content_type: String,
    /// Set once when the document is saved.
    pub created_at: DateTime<Utc>,
    /// Bumped by every mutating operation.
    pub last_modified: DateTime<Utc>,
}

impl DocumentMetadata {
    /// Stamps upload metadata with creation and modification times.
    pub fn stamped(upload: UploadMetadata, now: DateTime<Utc>) -> Self {
        Self {
            size: upload.size,
            content_type: upload.content_type,
            created_at: now,
            last_modified: now,
        }
    }
}

/// One entry of the append-only extraction ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub timestamp: DateTime<Utc>,
    pub fields: BTreeSet<String>,
    pub source: String,
}

/// Encrypted payload together with the parameters needed to open it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedContent {
    pub cipher_content: Vec<u8>,
    pub iv: Vec<u8>,
    pub auth_tag: Vec<u8>,
}

/// A document record as the backing store holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub name: String,
    pub content: SealedContent,
    pub metadata: DocumentMetadata,
    pub extracted_info: ExtractedInfo,
    pub extraction_history: Vec<LedgerEntry>,
}

/// A document record before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStoredDocument {
    pub name: String,
    pub content: SealedContent,
    pub metadata: DocumentMetadata,
    pub extracted_info: ExtractedInfo,
    pub extraction_history: Vec<LedgerEntry>,
}

/// Cipher-free projection returned by saves, listings and searches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub name: String,
    pub metadata: DocumentMetadata,
    pub extracted_info: ExtractedInfo,
}

/// A decrypted document.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    #[serde(skip)]
    pub content: Vec<u8>,
    pub metadata: DocumentMetadata,
    pub extracted_info: ExtractedInfo,
}

// Plaintext stays out of debug output.
impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("content", &format_args!("<{} bytes>", self.content.len()))
            .field("metadata", &self.metadata)
            .field("extracted_info", &self.extracted_info)
            .finish()
    }
}

/// Read-only projection of a document's extracted info and its ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedInfoView {
    pub extracted_info: ExtractedInfo,
    pub extraction_history: Vec<LedgerEntry>,
}
