//! Outcome reporting for menu-facing callers.
//!
//! # Responsibility
//! - Collapse every operation result into one `Outcome` and a short
//!   human-readable message.
//!
//! # Invariants
//! - Each operation result maps to exactly one report.
//! - Create reports carry the assigned key on success and only then.

use crate::model::EntityKind;
use crate::repo::record::{RepoError, RepoResult, UpdateOutcome};
use std::fmt::{Display, Formatter};

/// Closed set of results a caller can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Success,
    EmptyResult,
    NoChange,
    NotFound,
    ValidationError,
    DuplicateKey,
    BackendUnavailable,
    IntegrityError,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::EmptyResult => "empty_result",
            Self::NoChange => "no_change",
            Self::NotFound => "not_found",
            Self::ValidationError => "validation_error",
            Self::DuplicateKey => "duplicate_key",
            Self::BackendUnavailable => "backend_unavailable",
            Self::IntegrityError => "integrity_error",
        }
    }

    /// Whether the operation completed without an error condition.
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Success | Self::EmptyResult | Self::NoChange)
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&RepoError> for Outcome {
    fn from(value: &RepoError) -> Self {
        match value {
            RepoError::Validation(_) => Self::ValidationError,
            RepoError::DuplicateKey { .. } => Self::DuplicateKey,
            RepoError::NotFound { .. } => Self::NotFound,
            RepoError::BackendUnavailable(_) => Self::BackendUnavailable,
            RepoError::Integrity(_) | RepoError::InvalidData(_) => Self::IntegrityError,
        }
    }
}

impl From<UpdateOutcome> for Outcome {
    fn from(value: UpdateOutcome) -> Self {
        match value {
            UpdateOutcome::Updated => Self::Success,
            UpdateOutcome::NoChange => Self::NoChange,
        }
    }
}

/// Status line shown to the user after an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationReport {
    pub outcome: Outcome,
    pub message: String,
    /// Assigned or used key, set for successful creates.
    pub key: Option<String>,
}

impl OperationReport {
    pub fn created<K: Display>(entity: EntityKind, result: &RepoResult<K>) -> Self {
        match result {
            Ok(key) => Self {
                outcome: Outcome::Success,
                message: format!("{entity} created with key {key}"),
                key: Some(key.to_string()),
            },
            Err(err) => Self::failed(err),
        }
    }

    pub fn listed<T>(entity: EntityKind, result: &RepoResult<Vec<T>>) -> Self {
        match result {
            Ok(records) if records.is_empty() => Self {
                outcome: Outcome::EmptyResult,
                message: format!("no {} found", entity.collection()),
                key: None,
            },
            Ok(records) => Self {
                outcome: Outcome::Success,
                message: format!("{} {} found", records.len(), entity.collection()),
                key: None,
            },
            Err(err) => Self::failed(err),
        }
    }

    pub fn updated(entity: EntityKind, result: &RepoResult<UpdateOutcome>) -> Self {
        match result {
            Ok(UpdateOutcome::Updated) => Self {
                outcome: Outcome::Success,
                message: format!("{entity} updated"),
                key: None,
            },
            Ok(UpdateOutcome::NoChange) => Self {
                outcome: Outcome::NoChange,
                message: format!("{entity} already up to date, nothing changed"),
                key: None,
            },
            Err(err) => Self::failed(err),
        }
    }

    pub fn deleted(entity: EntityKind, result: &RepoResult<()>) -> Self {
        match result {
            Ok(()) => Self {
                outcome: Outcome::Success,
                message: format!("{entity} deleted"),
                key: None,
            },
            Err(err) => Self::failed(err),
        }
    }

    /// Report for an operation rejected before or by the store.
    pub fn failed(err: &RepoError) -> Self {
        Self {
            outcome: Outcome::from(err),
            message: err.to_string(),
            key: None,
        }
    }
}

impl Display for OperationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.outcome, self.message)
    }
}
