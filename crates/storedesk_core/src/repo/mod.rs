//! Repository layer: record contracts and their two storage backends.
//!
//! # Responsibility
//! - Define the per-record CRUD contract and the store error taxonomy.
//! - Provide relational and document implementations of that contract.
//! - Select and open the backend named by configuration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateKey`)
//!   in addition to storage failures, never raw driver errors.

pub mod document;
pub mod record;
pub mod relational;
pub mod sequence;

use crate::db::BackendKind;
use document::DocumentStore;
use record::{RecordStore, RepoResult};
use relational::RelationalStore;
use std::path::Path;

/// Opens the store for `backend` at `path`, ready for use.
pub fn open_store(backend: BackendKind, path: impl AsRef<Path>) -> RepoResult<Box<dyn RecordStore>> {
    let store: Box<dyn RecordStore> = match backend {
        BackendKind::Relational => Box::new(RelationalStore::open(path)?),
        BackendKind::Document => Box::new(DocumentStore::open(path)?),
    };
    Ok(store)
}

/// Opens a throwaway in-memory store for `backend`.
pub fn open_store_in_memory(backend: BackendKind) -> RepoResult<Box<dyn RecordStore>> {
    let store: Box<dyn RecordStore> = match backend {
        BackendKind::Relational => Box::new(RelationalStore::open_in_memory()?),
        BackendKind::Document => Box::new(DocumentStore::open_in_memory()?),
    };
    Ok(store)
}
