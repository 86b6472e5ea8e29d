//! Core data access for storedesk.
//! Users, products and addresses over a relational or a document store.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{AppConfig, ConfigError};
pub use db::{BackendKind, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig, LoggingError};
pub use model::address::{Address, AddressPatch, NewAddress};
pub use model::product::{NewProduct, Product, ProductPatch};
pub use model::user::{User, UserPatch};
pub use model::validation::{
    parse_count, parse_record_id, NationalId, Price, RecordId, ValidationError,
};
pub use model::EntityKind;
pub use repo::document::DocumentStore;
pub use repo::record::{
    Record, RecordRepository, RecordStore, RepoError, RepoResult, StoreCapabilities,
    UpdateOutcome,
};
pub use repo::relational::RelationalStore;
pub use repo::sequence::SequenceAllocator;
pub use repo::{open_store, open_store_in_memory};
pub use service::outcome::{OperationReport, Outcome};
pub use service::record_service::RecordService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
