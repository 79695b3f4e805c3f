//! quill: an encrypted document repository.
//!
//! Document bytes are sealed with AES-256-GCM before they reach the store;
//! alongside them lives a schema-flexible bag of extracted information whose
//! every change is recorded in an append-only ledger. Reads tolerate a store
//! that lags behind its own writes.

pub mod app;
pub mod cli;
pub mod config;
pub mod connection;
pub mod crypto;
pub mod output;
pub mod repository;
pub mod storage;

pub use config::{Config, ConfigError, StoreBackend};
pub use connection::{ConnectionManager, Connector};
pub use repository::DocumentRepository;
