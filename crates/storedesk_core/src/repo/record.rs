//! Record repository contracts shared by both storage backends.
//!
//! # Responsibility
//! - Define the create/list/update/delete contract per record type.
//! - Normalize SQLite failures into the store error taxonomy.
//! - Run each mutation as one transactional unit of work.
//!
//! # Invariants
//! - Write paths validate input before any SQL is issued.
//! - Update reports `Updated`, `NoChange` or `NotFound`, never a mix.
//! - A failed unit of work is rolled back before its error is returned.

use crate::db::{BackendKind, DbError};
use crate::model::address::{Address, AddressPatch, NewAddress};
use crate::model::product::{NewProduct, Product, ProductPatch};
use crate::model::user::{User, UserPatch};
use crate::model::validation::{NationalId, RecordId, ValidationError};
use crate::model::EntityKind;
use log::warn;
use rusqlite::{Connection, ErrorCode, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Store error, one variant per failure outcome.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    DuplicateKey { entity: EntityKind, key: String },
    NotFound { entity: EntityKind, key: String },
    BackendUnavailable(DbError),
    Integrity(DbError),
    InvalidData(String),
}

impl RepoError {
    pub(crate) fn not_found(entity: EntityKind, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Short machine-friendly code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::DuplicateKey { .. } => "duplicate_key",
            Self::NotFound { .. } => "not_found",
            Self::BackendUnavailable(_) => "backend_unavailable",
            Self::Integrity(_) => "integrity_error",
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateKey { entity, key } => write!(f, "{entity} `{key}` already exists"),
            Self::NotFound { entity, key } => write!(f, "{entity} `{key}` not found"),
            Self::BackendUnavailable(err) => write!(f, "storage backend unavailable: {err}"),
            Self::Integrity(err) => write!(f, "storage rejected the operation: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::BackendUnavailable(err) | Self::Integrity(err) => Some(err),
            Self::DuplicateKey { .. } | Self::NotFound { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => err.into(),
            other => Self::BackendUnavailable(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        classify_sqlite_error(value)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidData(value.to_string())
    }
}

fn classify_sqlite_error(err: rusqlite::Error) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
            ErrorCode::ConstraintViolation | ErrorCode::TypeMismatch | ErrorCode::TooBig => {
                RepoError::Integrity(DbError::Sqlite(err))
            }
            _ => RepoError::BackendUnavailable(DbError::Sqlite(err)),
        },
        rusqlite::Error::FromSqlConversionFailure(..)
        | rusqlite::Error::InvalidColumnType(..)
        | rusqlite::Error::IntegralValueOutOfRange(..) => RepoError::InvalidData(err.to_string()),
        _ => RepoError::BackendUnavailable(DbError::Sqlite(err)),
    }
}

/// Maps an insert failure, turning key collisions into `DuplicateKey`.
pub(crate) fn insert_error(err: rusqlite::Error, entity: EntityKind, key: &str) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        let extended = failure.extended_code;
        if extended == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            || extended == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        {
            return RepoError::DuplicateKey {
                entity,
                key: key.to_string(),
            };
        }
    }
    err.into()
}

/// Runs `work` inside an IMMEDIATE transaction.
///
/// Commits on success; rolls back explicitly on any error so the store is
/// left exactly as it was before the call.
pub(crate) fn run_in_transaction<T>(
    conn: &mut Connection,
    backend: BackendKind,
    entity: EntityKind,
    work: impl FnOnce(&Transaction<'_>) -> RepoResult<T>,
) -> RepoResult<T> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    match work(&tx) {
        Ok(value) => {
            tx.commit()?;
            Ok(value)
        }
        Err(err) => {
            warn!(
                "event=tx_rollback module=repo status=error backend={backend} entity={entity} error_code={}",
                err.code()
            );
            if let Err(rollback_err) = tx.rollback() {
                warn!(
                    "event=tx_rollback module=repo status=error backend={backend} entity={entity} error_code=rollback_failed error={rollback_err}"
                );
            }
            Err(err)
        }
    }
}

/// Result of an update whose key matched an existing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    NoChange,
}

/// Binds a record type to its key, create draft and update patch.
pub trait Record {
    type Key;
    type Draft;
    type Patch;

    const KIND: EntityKind;
}

impl Record for User {
    type Key = NationalId;
    type Draft = User;
    type Patch = UserPatch;

    const KIND: EntityKind = EntityKind::User;
}

impl Record for Product {
    type Key = RecordId;
    type Draft = NewProduct;
    type Patch = ProductPatch;

    const KIND: EntityKind = EntityKind::Product;
}

impl Record for Address {
    type Key = RecordId;
    type Draft = NewAddress;
    type Patch = AddressPatch;

    const KIND: EntityKind = EntityKind::Address;
}

/// CRUD contract for one record type.
pub trait RecordRepository<R: Record> {
    /// Persists a new record and returns the key it is stored under.
    fn create(&mut self, draft: &R::Draft) -> RepoResult<R::Key>;
    /// Returns every stored record of this type in insertion order.
    fn list(&self) -> RepoResult<Vec<R>>;
    /// Applies the supported subset of attributes to an existing record.
    fn update(&mut self, key: &R::Key, patch: &R::Patch) -> RepoResult<UpdateOutcome>;
    /// Removes one record. No cascade to other record types.
    fn delete(&mut self, key: &R::Key) -> RepoResult<()>;
}

/// Feature differences between storage backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreCapabilities {
    /// Keys come from the store itself rather than the sequence allocator.
    pub native_auto_increment: bool,
    /// Address updates may change the complement.
    pub address_complement_update: bool,
}

/// A full record store: all three record repositories behind one backend.
pub trait RecordStore:
    RecordRepository<User> + RecordRepository<Product> + RecordRepository<Address>
{
    fn backend(&self) -> BackendKind;
    fn capabilities(&self) -> StoreCapabilities;
}
