//! quill_core - functional core of the quill document repository.
//!
//! Pure domain types, validation rules, ledger bookkeeping, search matching
//! and the storage contract that backends implement. Nothing in this crate
//! performs I/O.

pub mod document;
pub mod storage;
