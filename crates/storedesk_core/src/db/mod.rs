//! SQLite storage bootstrap and per-backend schema migrations.
//!
//! # Responsibility
//! - Open and configure SQLite connections for both storage backends.
//! - Tag each database file with the backend it belongs to.
//! - Apply the backend's schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Backend ownership is tracked via `PRAGMA application_id`.
//! - No record data is read or written before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Storage technology behind a record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Typed tables with native auto-increment keys.
    Relational,
    /// JSON documents grouped in named collections plus a counters table.
    Document,
}

impl BackendKind {
    /// Stable lowercase name used in configuration and log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Relational => "relational",
            Self::Document => "document",
        }
    }

    /// Value written to `PRAGMA application_id` for databases of this kind.
    pub fn application_id(self) -> i32 {
        match self {
            // ASCII "SDRL" / "SDDC".
            Self::Relational => 0x5344_524C,
            Self::Document => 0x5344_4443,
        }
    }

    fn from_application_id(value: i32) -> Option<Self> {
        [Self::Relational, Self::Document]
            .into_iter()
            .find(|kind| kind.application_id() == value)
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "relational" | "sql" | "sqlite" => Ok(Self::Relational),
            "document" | "nosql" | "documents" => Ok(Self::Document),
            other => Err(format!(
                "unsupported backend `{other}`; expected relational|document"
            )),
        }
    }
}

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    SchemaMismatch {
        expected: BackendKind,
        found: Option<BackendKind>,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::SchemaMismatch { expected, found } => match found {
                Some(found) => write!(
                    f,
                    "database belongs to the {found} backend, expected {expected}"
                ),
                None => write!(
                    f,
                    "database was not created by storedesk, expected {expected} backend"
                ),
            },
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::SchemaMismatch { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

#[cfg(test)]
mod tests {
    use super::BackendKind;

    #[test]
    fn backend_kind_parses_aliases() {
        assert_eq!("Relational".parse(), Ok(BackendKind::Relational));
        assert_eq!(" nosql ".parse(), Ok(BackendKind::Document));
        assert!("graph".parse::<BackendKind>().is_err());
    }

    #[test]
    fn application_ids_are_distinct_and_reversible() {
        for kind in [BackendKind::Relational, BackendKind::Document] {
            assert_eq!(
                BackendKind::from_application_id(kind.application_id()),
                Some(kind)
            );
        }
        assert_eq!(BackendKind::from_application_id(0), None);
    }
}
