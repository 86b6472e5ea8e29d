//! Document record store: JSON documents in named collections.
//!
//! # Responsibility
//! - Persist each record as a JSON object in the `documents` table, keyed
//!   by `(collection, doc_id)`.
//! - Assign synthetic keys through the `SequenceAllocator`, since documents
//!   have no native auto-increment.
//! - Apply partial updates with `$set`-style field replacement.
//!
//! # Invariants
//! - Synthetic keys are stored as SQLite integers, natural keys as text.
//! - Key allocation and document insert share one transaction; a failed
//!   allocation means no document is written.
//! - Updates compare the patched body with the stored one and only write
//!   when they differ.

use crate::db::{open_db, open_db_in_memory, BackendKind};
use crate::model::address::{Address, AddressPatch, NewAddress};
use crate::model::product::{NewProduct, Product, ProductPatch};
use crate::model::user::{User, UserPatch};
use crate::model::validation::{NationalId, RecordId, ValidationError};
use crate::model::EntityKind;
use crate::repo::record::{
    insert_error, run_in_transaction, Record, RecordRepository, RecordStore, RepoError,
    RepoResult, StoreCapabilities, UpdateOutcome,
};
use crate::repo::sequence::SequenceAllocator;
use log::info;
use rusqlite::types::{FromSql, ToSql};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

const BACKEND: BackendKind = BackendKind::Document;

/// Stored body of a user document; the national id lives in `doc_id`.
#[derive(Debug, Serialize, Deserialize)]
struct UserDocument {
    name: String,
    email: String,
}

/// SQLite-backed document store. Owns its connection.
pub struct DocumentStore {
    conn: Connection,
}

impl DocumentStore {
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Ok(Self::from_connection(open_db(path, BACKEND)?))
    }

    pub fn open_in_memory() -> RepoResult<Self> {
        Ok(Self::from_connection(open_db_in_memory(BACKEND)?))
    }

    /// Wraps a connection already bootstrapped with `open_db(.., Document)`.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Allocator over this store's counters.
    pub fn allocator(&self) -> SequenceAllocator<'_> {
        SequenceAllocator::new(&self.conn)
    }

    fn insert_with_next_id<D: Serialize>(
        &mut self,
        entity: EntityKind,
        body: &D,
    ) -> RepoResult<RecordId> {
        let body = serde_json::to_string(body)?;
        run_in_transaction(&mut self.conn, BACKEND, entity, |tx| {
            let id = SequenceAllocator::new(tx).next_id(entity.collection())?;
            insert_document(tx, entity, &id, &id.to_string(), &body)?;
            Ok(id)
        })
    }

    /// `$set` semantics: replaces the given top-level fields of one document.
    fn set_fields<K>(
        &mut self,
        entity: EntityKind,
        key: &K,
        fields: Map<String, Value>,
    ) -> RepoResult<UpdateOutcome>
    where
        K: ToSql + ToString,
    {
        run_in_transaction(&mut self.conn, BACKEND, entity, |tx| {
            let stored: Option<String> = tx
                .query_row(
                    "SELECT body FROM documents WHERE collection = ?1 AND doc_id = ?2;",
                    params![entity.collection(), key],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(stored) = stored else {
                return Err(RepoError::not_found(entity, key.to_string()));
            };

            let current: Map<String, Value> = serde_json::from_str(&stored)?;
            let mut patched = current.clone();
            patched.extend(fields);
            if patched == current {
                return Ok(UpdateOutcome::NoChange);
            }

            tx.execute(
                "UPDATE documents SET body = ?1 WHERE collection = ?2 AND doc_id = ?3;",
                params![Value::Object(patched).to_string(), entity.collection(), key],
            )?;
            Ok(UpdateOutcome::Updated)
        })
    }

    fn delete_document<K>(&mut self, entity: EntityKind, key: &K) -> RepoResult<()>
    where
        K: ToSql + ToString,
    {
        run_in_transaction(&mut self.conn, BACKEND, entity, |tx| {
            let removed = tx.execute(
                "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2;",
                params![entity.collection(), key],
            )?;
            if removed == 0 {
                return Err(RepoError::not_found(entity, key.to_string()));
            }
            Ok(())
        })
    }

    /// Loads every document of a collection in insertion order.
    fn find_all<K: FromSql, D: DeserializeOwned>(
        &self,
        entity: EntityKind,
    ) -> RepoResult<Vec<(K, D)>> {
        let mut stmt = self.conn.prepare(
            "SELECT doc_id, body FROM documents WHERE collection = ?1 ORDER BY rowid;",
        )?;
        let mut rows = stmt.query([entity.collection()])?;
        let mut documents = Vec::new();

        while let Some(row) = rows.next()? {
            let key: K = row.get(0)?;
            let body: String = row.get(1)?;
            let document = serde_json::from_str(&body).map_err(|err| {
                RepoError::InvalidData(format!("{} document: {err}", entity.collection()))
            })?;
            documents.push((key, document));
        }

        Ok(documents)
    }
}

impl Drop for DocumentStore {
    fn drop(&mut self) {
        info!("event=store_close module=repo status=ok backend={BACKEND}");
    }
}

impl RecordStore for DocumentStore {
    fn backend(&self) -> BackendKind {
        BACKEND
    }

    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities {
            native_auto_increment: false,
            address_complement_update: false,
        }
    }
}

impl RecordRepository<User> for DocumentStore {
    fn create(&mut self, draft: &User) -> RepoResult<NationalId> {
        draft.validate()?;

        let body = serde_json::to_string(&UserDocument {
            name: draft.name.clone(),
            email: draft.email.clone(),
        })?;
        let key = draft.national_id.clone();
        run_in_transaction(&mut self.conn, BACKEND, User::KIND, |tx| {
            insert_document(tx, User::KIND, &key, key.as_str(), &body)?;
            Ok(key.clone())
        })
    }

    fn list(&self) -> RepoResult<Vec<User>> {
        let documents = self.find_all::<NationalId, UserDocument>(User::KIND)?;
        Ok(documents
            .into_iter()
            .map(|(national_id, doc)| User {
                national_id,
                name: doc.name,
                email: doc.email,
            })
            .collect())
    }

    fn update(&mut self, key: &NationalId, patch: &UserPatch) -> RepoResult<UpdateOutcome> {
        patch.validate()?;

        let mut fields = Map::new();
        if let Some(name) = &patch.name {
            fields.insert("name".to_string(), Value::from(name.as_str()));
        }
        if let Some(email) = &patch.email {
            fields.insert("email".to_string(), Value::from(email.as_str()));
        }
        self.set_fields(User::KIND, key, fields)
    }

    fn delete(&mut self, key: &NationalId) -> RepoResult<()> {
        self.delete_document(User::KIND, key)
    }
}

impl RecordRepository<Product> for DocumentStore {
    fn create(&mut self, draft: &NewProduct) -> RepoResult<RecordId> {
        self.insert_with_next_id(Product::KIND, draft)
    }

    fn list(&self) -> RepoResult<Vec<Product>> {
        let documents = self.find_all::<RecordId, NewProduct>(Product::KIND)?;
        Ok(documents
            .into_iter()
            .map(|(id, doc)| doc.into_product(id))
            .collect())
    }

    fn update(&mut self, key: &RecordId, patch: &ProductPatch) -> RepoResult<UpdateOutcome> {
        let mut fields = Map::new();
        fields.insert("price".to_string(), serde_json::to_value(patch.price)?);
        self.set_fields(Product::KIND, key, fields)
    }

    fn delete(&mut self, key: &RecordId) -> RepoResult<()> {
        self.delete_document(Product::KIND, key)
    }
}

impl RecordRepository<Address> for DocumentStore {
    fn create(&mut self, draft: &NewAddress) -> RepoResult<RecordId> {
        self.insert_with_next_id(Address::KIND, draft)
    }

    fn list(&self) -> RepoResult<Vec<Address>> {
        let documents = self.find_all::<RecordId, NewAddress>(Address::KIND)?;
        Ok(documents
            .into_iter()
            .map(|(id, doc)| doc.into_address(id))
            .collect())
    }

    fn update(&mut self, key: &RecordId, patch: &AddressPatch) -> RepoResult<UpdateOutcome> {
        if patch.complement.is_some() {
            return Err(ValidationError::Unsupported {
                field: "complement",
                reason: "the document backend only updates street and number",
            }
            .into());
        }

        let mut fields = Map::new();
        fields.insert("street".to_string(), Value::from(patch.street.as_str()));
        fields.insert("number".to_string(), Value::from(patch.number));
        self.set_fields(Address::KIND, key, fields)
    }

    fn delete(&mut self, key: &RecordId) -> RepoResult<()> {
        self.delete_document(Address::KIND, key)
    }
}

fn insert_document(
    tx: &Transaction<'_>,
    entity: EntityKind,
    key: &dyn ToSql,
    key_text: &str,
    body: &str,
) -> RepoResult<()> {
    tx.execute(
        "INSERT INTO documents (collection, doc_id, body) VALUES (?1, ?2, ?3);",
        params![entity.collection(), key, body],
    )
    .map_err(|err| insert_error(err, entity, key_text))?;
    Ok(())
}
