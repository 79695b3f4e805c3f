//! Storage backend implementations.
//!
//! This module provides concrete implementations of the `DocumentStore`
//! trait defined in `quill_core::storage`.
//!
//! # Feature Flags
//!
//! - `sqlite` (default): SQLite storage backend using `rusqlite` and `tokio-rusqlite`
//!
//! The in-memory backend is always compiled in; it backs tests and
//! `QUILL_STORE=memory` runs.
//!
//! # Examples
//!
//! Build with SQLite (default):
//! ```bash
//! cargo build -p quill
//! ```
//!
//! Build with the in-memory backend only:
//! ```bash
//! cargo build -p quill --no-default-features
//! ```

pub mod inmemory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use inmemory::InMemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteConnector, SqliteStore};
