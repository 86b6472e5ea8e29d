//! SQLite migration registry and executor, one registry per backend.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing order.
//! - Apply pending migrations atomically.
//! - Refuse to migrate a database that belongs to the other backend.
//!
//! # Invariants
//! - `version` values must remain monotonic within a registry.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - `PRAGMA application_id` is written in the same transaction as the
//!   first migration.

use crate::db::{BackendKind, DbError, DbResult};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const RELATIONAL_MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("relational_0001_init.sql"),
}];

const DOCUMENT_MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("document_0001_init.sql"),
}];

fn registry(backend: BackendKind) -> &'static [Migration] {
    match backend {
        BackendKind::Relational => RELATIONAL_MIGRATIONS,
        BackendKind::Document => DOCUMENT_MIGRATIONS,
    }
}

/// Returns the latest migration version known by this binary for `backend`.
pub fn latest_version(backend: BackendKind) -> u32 {
    registry(backend)
        .last()
        .map_or(0, |migration| migration.version)
}

/// Applies all pending migrations for `backend` on the provided connection.
pub fn apply_migrations(conn: &mut Connection, backend: BackendKind) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    check_owner(conn, backend, current_version)?;

    let latest = latest_version(backend);
    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    if current_version == 0 {
        tx.execute_batch(&format!(
            "PRAGMA application_id = {};",
            backend.application_id()
        ))?;
    }
    for migration in registry(backend) {
        if migration.version <= current_version {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;

    Ok(())
}

fn check_owner(conn: &Connection, backend: BackendKind, current_version: u32) -> DbResult<()> {
    let application_id = conn.query_row("PRAGMA application_id;", [], |row| row.get::<_, i32>(0))?;

    if application_id == 0 {
        if current_version == 0 {
            return Ok(());
        }
        return Err(DbError::SchemaMismatch {
            expected: backend,
            found: None,
        });
    }

    if application_id == backend.application_id() {
        return Ok(());
    }

    Err(DbError::SchemaMismatch {
        expected: backend,
        found: BackendKind::from_application_id(application_id),
    })
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
