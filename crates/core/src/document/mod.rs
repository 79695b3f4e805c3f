mod error;
mod ledger;
mod search;
mod summary;
mod types;
mod validation;

pub use error::ValidationError;
pub use ledger::{field_names, initial_entry, is_well_formed, next_entry};
pub use search::{matches_query, resolve_path, validate_query, values_equal, FieldQuery};
pub use summary::{summarize, FieldSummary, InformationSummary, SummarySource};
pub use types::{
    Document, DocumentId, DocumentMetadata, DocumentSummary, ExtractedInfo, ExtractedInfoView,
    ExtractedValue, LedgerEntry, NewStoredDocument, SealedContent, StoredDocument, UploadMetadata,
    INITIAL_UPLOAD_SOURCE, MANUAL_UPDATE_SOURCE,
};
pub use validation::{
    parse_extracted_info, validate_extracted_info, validate_source, validate_upload,
    MAX_EXTRACTED_DEPTH,
};
