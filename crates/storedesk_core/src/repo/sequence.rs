//! Durable sequential ID allocator for stores without auto-increment.
//!
//! # Responsibility
//! - Hand out strictly increasing integer keys per sequence name.
//! - Persist the last issued value in the `counters` table.
//!
//! # Invariants
//! - Allocation is one atomic upsert statement, never a read followed by a
//!   write, so concurrent connections and processes never see the same value.
//! - The first value of a sequence is 1; each call adds exactly 1.
//! - Issued values are never reused, even after the owning record is deleted.

use crate::db::DbError;
use crate::model::validation::{RecordId, ValidationError};
use crate::repo::record::{RepoError, RepoResult};
use log::{debug, error};
use rusqlite::Connection;

const NEXT_ID_SQL: &str = "INSERT INTO counters (name, seq) VALUES (?1, 1)
ON CONFLICT (name) DO UPDATE SET seq = seq + 1
RETURNING seq;";

/// Allocator bound to a document-backend connection (or open transaction).
pub struct SequenceAllocator<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SequenceAllocator<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Returns the next value of `sequence`, creating the counter on first use.
    ///
    /// # Errors
    /// - `Validation` when `sequence` is blank.
    /// - `BackendUnavailable` for any storage failure; callers must not fall
    ///   back to computing a key themselves.
    pub fn next_id(&self, sequence: &str) -> RepoResult<RecordId> {
        if sequence.trim().is_empty() {
            return Err(ValidationError::Empty { field: "sequence" }.into());
        }

        match self
            .conn
            .query_row(NEXT_ID_SQL, [sequence], |row| row.get::<_, RecordId>(0))
        {
            Ok(id) => {
                debug!("event=sequence_next module=repo status=ok sequence={sequence}");
                Ok(id)
            }
            Err(err) => {
                error!(
                    "event=sequence_next module=repo status=error sequence={sequence} error={err}"
                );
                Err(RepoError::BackendUnavailable(DbError::Sqlite(err)))
            }
        }
    }

    /// Returns the last issued value without allocating, `0` if none yet.
    pub fn current(&self, sequence: &str) -> RepoResult<RecordId> {
        let value = self.conn.query_row(
            "SELECT COALESCE((SELECT seq FROM counters WHERE name = ?1), 0);",
            [sequence],
            |row| row.get::<_, RecordId>(0),
        )?;
        Ok(value)
    }
}
