//! In-memory storage backend.
//!
//! This module provides an in-memory implementation of the `DocumentStore`
//! trait that keeps all records in a HashMap wrapped in `Arc<RwLock<_>>`.
//! It backs the test suite and short-lived runs where persistence is not
//! required.
//!
//! # Example
//!
//! ```rust,ignore
//! use quill::storage::inmemory::InMemoryStore;
//!
//! let store = InMemoryStore::new().with_replication_lag(2);
//! // Use store for testing...
//! ```

mod store;

pub use store::InMemoryStore;
