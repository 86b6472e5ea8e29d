//! Relational record store over typed SQLite tables.
//!
//! # Responsibility
//! - Map users, products and addresses onto the `user`, `product` and
//!   `address` tables of the `main` schema.
//! - Rely on native auto-increment for synthetic keys.
//!
//! # Invariants
//! - Every operation runs in its own IMMEDIATE transaction.
//! - Updates only touch rows whose values actually differ, so the affected
//!   row count separates `Updated` from `NoChange`.

use crate::db::{open_db, open_db_in_memory, BackendKind};
use crate::model::address::{Address, AddressPatch, NewAddress};
use crate::model::product::{NewProduct, Product, ProductPatch};
use crate::model::user::{User, UserPatch};
use crate::model::validation::{NationalId, RecordId};
use crate::model::EntityKind;
use crate::repo::record::{
    insert_error, run_in_transaction, Record, RecordRepository, RecordStore, RepoError,
    RepoResult, StoreCapabilities, UpdateOutcome,
};
use log::info;
use rusqlite::{params, Connection, Row, Transaction};
use std::path::Path;

const BACKEND: BackendKind = BackendKind::Relational;

/// Every user points at this placeholder bank-details row.
const PLACEHOLDER_BANK_DETAILS_ID: i64 = 1;

const USER_SELECT_SQL: &str = "SELECT national_id, name, email FROM main.user ORDER BY rowid";
const PRODUCT_SELECT_SQL: &str = "SELECT id, name, price, quantity FROM main.product ORDER BY id";
const ADDRESS_SELECT_SQL: &str = "SELECT
    id,
    street,
    number,
    neighborhood,
    city,
    postal_code,
    complement
FROM main.address
ORDER BY id";

/// SQLite-backed relational store. Owns its connection.
pub struct RelationalStore {
    conn: Connection,
}

impl RelationalStore {
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Ok(Self::from_connection(open_db(path, BACKEND)?))
    }

    pub fn open_in_memory() -> RepoResult<Self> {
        Ok(Self::from_connection(open_db_in_memory(BACKEND)?))
    }

    /// Wraps a connection already bootstrapped with `open_db(.., Relational)`.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }
}

impl Drop for RelationalStore {
    fn drop(&mut self) {
        info!("event=store_close module=repo status=ok backend={BACKEND}");
    }
}

impl RecordStore for RelationalStore {
    fn backend(&self) -> BackendKind {
        BACKEND
    }

    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities {
            native_auto_increment: true,
            address_complement_update: true,
        }
    }
}

impl RecordRepository<User> for RelationalStore {
    fn create(&mut self, draft: &User) -> RepoResult<NationalId> {
        draft.validate()?;

        run_in_transaction(&mut self.conn, BACKEND, User::KIND, |tx| {
            tx.execute(
                "INSERT INTO main.user (national_id, name, email, bank_details_id)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    draft.national_id,
                    draft.name.as_str(),
                    draft.email.as_str(),
                    PLACEHOLDER_BANK_DETAILS_ID,
                ],
            )
            .map_err(|err| insert_error(err, User::KIND, draft.national_id.as_str()))?;
            Ok(draft.national_id.clone())
        })
    }

    fn list(&self) -> RepoResult<Vec<User>> {
        query_all(&self.conn, USER_SELECT_SQL, parse_user_row)
    }

    fn update(&mut self, key: &NationalId, patch: &UserPatch) -> RepoResult<UpdateOutcome> {
        patch.validate()?;

        run_in_transaction(&mut self.conn, BACKEND, User::KIND, |tx| {
            let changed = tx.execute(
                "UPDATE main.user
                 SET
                    name = COALESCE(?1, name),
                    email = COALESCE(?2, email)
                 WHERE national_id = ?3
                   AND (name IS NOT COALESCE(?1, name) OR email IS NOT COALESCE(?2, email));",
                params![patch.name.as_deref(), patch.email.as_deref(), key],
            )?;
            finish_update(
                tx,
                changed,
                "SELECT EXISTS(SELECT 1 FROM main.user WHERE national_id = ?1);",
                key.as_str(),
                User::KIND,
            )
        })
    }

    fn delete(&mut self, key: &NationalId) -> RepoResult<()> {
        run_in_transaction(&mut self.conn, BACKEND, User::KIND, |tx| {
            let removed = tx.execute("DELETE FROM main.user WHERE national_id = ?1;", [key])?;
            if removed == 0 {
                return Err(RepoError::not_found(User::KIND, key));
            }
            Ok(())
        })
    }
}

impl RecordRepository<Product> for RelationalStore {
    fn create(&mut self, draft: &NewProduct) -> RepoResult<RecordId> {
        run_in_transaction(&mut self.conn, BACKEND, Product::KIND, |tx| {
            let id = tx.query_row(
                "INSERT INTO main.product (name, price, quantity, description, portion_weight)
                 VALUES (?1, ?2, ?3, 'N/A', 0)
                 RETURNING id;",
                params![draft.name.as_str(), draft.price, draft.quantity],
                |row| row.get::<_, RecordId>(0),
            )?;
            Ok(id)
        })
    }

    fn list(&self) -> RepoResult<Vec<Product>> {
        query_all(&self.conn, PRODUCT_SELECT_SQL, parse_product_row)
    }

    fn update(&mut self, key: &RecordId, patch: &ProductPatch) -> RepoResult<UpdateOutcome> {
        run_in_transaction(&mut self.conn, BACKEND, Product::KIND, |tx| {
            let changed = tx.execute(
                "UPDATE main.product SET price = ?1 WHERE id = ?2 AND price IS NOT ?1;",
                params![patch.price, key],
            )?;
            finish_update(
                tx,
                changed,
                "SELECT EXISTS(SELECT 1 FROM main.product WHERE id = ?1);",
                *key,
                Product::KIND,
            )
        })
    }

    fn delete(&mut self, key: &RecordId) -> RepoResult<()> {
        delete_by_id(&mut self.conn, "main.product", *key, Product::KIND)
    }
}

impl RecordRepository<Address> for RelationalStore {
    fn create(&mut self, draft: &NewAddress) -> RepoResult<RecordId> {
        run_in_transaction(&mut self.conn, BACKEND, Address::KIND, |tx| {
            let id = tx.query_row(
                "INSERT INTO main.address (street, number, neighborhood, city, postal_code, complement)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 RETURNING id;",
                params![
                    draft.street.as_str(),
                    draft.number,
                    draft.neighborhood.as_str(),
                    draft.city.as_str(),
                    draft.postal_code.as_str(),
                    draft.complement.as_str(),
                ],
                |row| row.get::<_, RecordId>(0),
            )?;
            Ok(id)
        })
    }

    fn list(&self) -> RepoResult<Vec<Address>> {
        query_all(&self.conn, ADDRESS_SELECT_SQL, parse_address_row)
    }

    fn update(&mut self, key: &RecordId, patch: &AddressPatch) -> RepoResult<UpdateOutcome> {
        run_in_transaction(&mut self.conn, BACKEND, Address::KIND, |tx| {
            let changed = tx.execute(
                "UPDATE main.address
                 SET
                    street = ?1,
                    number = ?2,
                    complement = COALESCE(?3, complement)
                 WHERE id = ?4
                   AND (street IS NOT ?1
                        OR number IS NOT ?2
                        OR complement IS NOT COALESCE(?3, complement));",
                params![
                    patch.street.as_str(),
                    patch.number,
                    patch.complement.as_deref(),
                    key,
                ],
            )?;
            finish_update(
                tx,
                changed,
                "SELECT EXISTS(SELECT 1 FROM main.address WHERE id = ?1);",
                *key,
                Address::KIND,
            )
        })
    }

    fn delete(&mut self, key: &RecordId) -> RepoResult<()> {
        delete_by_id(&mut self.conn, "main.address", *key, Address::KIND)
    }
}

/// Resolves an update whose `WHERE` clause skipped identical rows.
fn finish_update<K>(
    tx: &Transaction<'_>,
    changed: usize,
    exists_sql: &str,
    key: K,
    entity: EntityKind,
) -> RepoResult<UpdateOutcome>
where
    K: rusqlite::ToSql + ToString,
{
    if changed > 0 {
        return Ok(UpdateOutcome::Updated);
    }

    let exists: bool = tx.query_row(exists_sql, [&key], |row| row.get(0))?;
    if exists {
        Ok(UpdateOutcome::NoChange)
    } else {
        Err(RepoError::not_found(entity, key.to_string()))
    }
}

fn delete_by_id(
    conn: &mut Connection,
    table: &'static str,
    key: RecordId,
    entity: EntityKind,
) -> RepoResult<()> {
    run_in_transaction(conn, BACKEND, entity, |tx| {
        let removed = tx.execute(&format!("DELETE FROM {table} WHERE id = ?1;"), [key])?;
        if removed == 0 {
            return Err(RepoError::not_found(entity, key));
        }
        Ok(())
    })
}

fn query_all<T>(
    conn: &Connection,
    sql: &str,
    parse: fn(&Row<'_>) -> RepoResult<T>,
) -> RepoResult<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    let mut records = Vec::new();

    while let Some(row) = rows.next()? {
        records.push(parse(row)?);
    }

    Ok(records)
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    Ok(User {
        national_id: row.get("national_id")?,
        name: row.get("name")?,
        email: row.get("email")?,
    })
}

fn parse_product_row(row: &Row<'_>) -> RepoResult<Product> {
    Ok(Product {
        id: row.get("id")?,
        name: row.get("name")?,
        price: row.get("price")?,
        quantity: row.get("quantity")?,
    })
}

fn parse_address_row(row: &Row<'_>) -> RepoResult<Address> {
    Ok(Address {
        id: row.get("id")?,
        street: row.get("street")?,
        number: row.get("number")?,
        neighborhood: row.get("neighborhood")?,
        city: row.get("city")?,
        postal_code: row.get("postal_code")?,
        complement: row.get("complement")?,
    })
}
