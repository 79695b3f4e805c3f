//! SQLite schema definitions and SQL query constants.
//!
//! Pure data, no I/O. Summary queries never select the cipher columns.

/// SQL statement to create all tables.
pub const CREATE_TABLES: &str = r#"
-- Documents table. `seq` preserves creation order for listing.
CREATE TABLE IF NOT EXISTS documents (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    size INTEGER NOT NULL,
    content_type TEXT NOT NULL,
    cipher_content BLOB NOT NULL,
    iv BLOB NOT NULL,
    auth_tag BLOB NOT NULL,
    extracted_info TEXT NOT NULL,
    created_at TEXT NOT NULL,
    last_modified TEXT NOT NULL
);

-- Append-only extraction ledger
CREATE TABLE IF NOT EXISTS extraction_history (
    document_id TEXT NOT NULL,
    seq INTEGER NOT NULL,
    timestamp TEXT NOT NULL,
    fields TEXT NOT NULL,
    source TEXT NOT NULL,
    PRIMARY KEY (document_id, seq),
    FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
);
"#;

// Document queries
pub const INSERT_DOCUMENT: &str = r#"
INSERT INTO documents (id, name, size, content_type, cipher_content, iv, auth_tag, extracted_info, created_at, last_modified)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
"#;

pub const SELECT_DOCUMENT_BY_ID: &str = r#"
SELECT id, name, size, content_type, created_at, last_modified, extracted_info, cipher_content, iv, auth_tag
FROM documents
WHERE id = ?1
"#;

pub const SELECT_DOCUMENT_SUMMARIES: &str = r#"
SELECT id, name, size, content_type, created_at, last_modified, extracted_info
FROM documents
ORDER BY seq ASC
"#;

pub const SELECT_EXTRACTED_INFO_BY_ID: &str = r#"
SELECT extracted_info
FROM documents
WHERE id = ?1
"#;

pub const UPDATE_EXTRACTED_INFO: &str = r#"
UPDATE documents
SET extracted_info = ?2, last_modified = ?3
WHERE id = ?1
"#;

pub const DELETE_DOCUMENT: &str = r#"
DELETE FROM documents
WHERE id = ?1
"#;

// Ledger queries
pub const INSERT_LEDGER_ENTRY: &str = r#"
INSERT INTO extraction_history (document_id, seq, timestamp, fields, source)
VALUES (?1, ?2, ?3, ?4, ?5)
"#;

pub const SELECT_LEDGER_BY_DOCUMENT: &str = r#"
SELECT timestamp, fields, source
FROM extraction_history
WHERE document_id = ?1
ORDER BY seq ASC
"#;

pub const SELECT_LAST_LEDGER_ENTRY: &str = r#"
SELECT seq, timestamp, fields, source
FROM extraction_history
WHERE document_id = ?1
ORDER BY seq DESC
LIMIT 1
"#;
