//! Record use-case service.
//!
//! # Responsibility
//! - Provide the CRUD entry points the menu layer calls.
//! - Convert caller-supplied key text into typed keys.
//! - Emit one structured log event per operation.
//!
//! # Invariants
//! - The service owns exactly one store for its whole lifetime.
//! - Invalid key text never reaches the store.
//! - Field values and keys are never logged, only entity names and codes.

use crate::db::BackendKind;
use crate::model::address::{Address, AddressPatch, NewAddress};
use crate::model::product::{NewProduct, Product, ProductPatch};
use crate::model::user::{User, UserPatch};
use crate::model::validation::{parse_record_id, NationalId, RecordId};
use crate::model::EntityKind;
use crate::repo::record::{
    RecordRepository, RecordStore, RepoError, RepoResult, StoreCapabilities, UpdateOutcome,
};
use log::{error, info, warn};
use std::time::Instant;

/// Use-case service over one record store.
pub struct RecordService {
    store: Box<dyn RecordStore>,
}

impl RecordService {
    pub fn new(store: Box<dyn RecordStore>) -> Self {
        info!(
            "event=service_start module=service status=ok backend={}",
            store.backend()
        );
        Self { store }
    }

    pub fn backend(&self) -> BackendKind {
        self.store.backend()
    }

    pub fn capabilities(&self) -> StoreCapabilities {
        self.store.capabilities()
    }

    /// Creates a user under its caller-supplied national id.
    pub fn create_user(&mut self, user: &User) -> RepoResult<NationalId> {
        let started_at = Instant::now();
        let result = <dyn RecordStore as RecordRepository<User>>::create(&mut *self.store, user);
        self.finish("record_create", EntityKind::User, started_at, result)
    }

    pub fn list_users(&self) -> RepoResult<Vec<User>> {
        let started_at = Instant::now();
        let result = <dyn RecordStore as RecordRepository<User>>::list(&*self.store);
        self.finish("record_list", EntityKind::User, started_at, result)
    }

    /// Updates name and/or email. An empty patch reports `NoChange` when the
    /// user exists.
    pub fn update_user(&mut self, national_id: &str, patch: &UserPatch) -> RepoResult<UpdateOutcome> {
        let started_at = Instant::now();
        let result = NationalId::new(national_id)
            .map_err(RepoError::from)
            .and_then(|key| {
                <dyn RecordStore as RecordRepository<User>>::update(&mut *self.store, &key, patch)
            });
        self.finish("record_update", EntityKind::User, started_at, result)
    }

    pub fn delete_user(&mut self, national_id: &str) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = NationalId::new(national_id)
            .map_err(RepoError::from)
            .and_then(|key| {
                <dyn RecordStore as RecordRepository<User>>::delete(&mut *self.store, &key)
            });
        self.finish("record_delete", EntityKind::User, started_at, result)
    }

    /// Creates a product and returns its store-assigned id.
    pub fn create_product(&mut self, draft: &NewProduct) -> RepoResult<RecordId> {
        let started_at = Instant::now();
        let result =
            <dyn RecordStore as RecordRepository<Product>>::create(&mut *self.store, draft);
        self.finish("record_create", EntityKind::Product, started_at, result)
    }

    pub fn list_products(&self) -> RepoResult<Vec<Product>> {
        let started_at = Instant::now();
        let result = <dyn RecordStore as RecordRepository<Product>>::list(&*self.store);
        self.finish("record_list", EntityKind::Product, started_at, result)
    }

    /// Changes the price of a product; `id` is the product key as typed.
    pub fn update_product(&mut self, id: &str, patch: &ProductPatch) -> RepoResult<UpdateOutcome> {
        let started_at = Instant::now();
        let result = parse_record_id(id).map_err(RepoError::from).and_then(|key| {
            <dyn RecordStore as RecordRepository<Product>>::update(&mut *self.store, &key, patch)
        });
        self.finish("record_update", EntityKind::Product, started_at, result)
    }

    pub fn delete_product(&mut self, id: &str) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = parse_record_id(id).map_err(RepoError::from).and_then(|key| {
            <dyn RecordStore as RecordRepository<Product>>::delete(&mut *self.store, &key)
        });
        self.finish("record_delete", EntityKind::Product, started_at, result)
    }

    /// Creates an address and returns its store-assigned id.
    pub fn create_address(&mut self, draft: &NewAddress) -> RepoResult<RecordId> {
        let started_at = Instant::now();
        let result =
            <dyn RecordStore as RecordRepository<Address>>::create(&mut *self.store, draft);
        self.finish("record_create", EntityKind::Address, started_at, result)
    }

    pub fn list_addresses(&self) -> RepoResult<Vec<Address>> {
        let started_at = Instant::now();
        let result = <dyn RecordStore as RecordRepository<Address>>::list(&*self.store);
        self.finish("record_list", EntityKind::Address, started_at, result)
    }

    /// Changes street and number, plus the complement where the backend
    /// supports it.
    pub fn update_address(&mut self, id: &str, patch: &AddressPatch) -> RepoResult<UpdateOutcome> {
        let started_at = Instant::now();
        let result = parse_record_id(id).map_err(RepoError::from).and_then(|key| {
            <dyn RecordStore as RecordRepository<Address>>::update(&mut *self.store, &key, patch)
        });
        self.finish("record_update", EntityKind::Address, started_at, result)
    }

    pub fn delete_address(&mut self, id: &str) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = parse_record_id(id).map_err(RepoError::from).and_then(|key| {
            <dyn RecordStore as RecordRepository<Address>>::delete(&mut *self.store, &key)
        });
        self.finish("record_delete", EntityKind::Address, started_at, result)
    }

    fn finish<T>(
        &self,
        event: &'static str,
        entity: EntityKind,
        started_at: Instant,
        result: RepoResult<T>,
    ) -> RepoResult<T> {
        let backend = self.store.backend();
        let duration_ms = started_at.elapsed().as_millis();
        match &result {
            Ok(_) => info!(
                "event={event} module=service status=ok backend={backend} entity={entity} duration_ms={duration_ms}"
            ),
            Err(
                err @ (RepoError::BackendUnavailable(_)
                | RepoError::Integrity(_)
                | RepoError::InvalidData(_)),
            ) => error!(
                "event={event} module=service status=error backend={backend} entity={entity} duration_ms={duration_ms} error_code={} error={err}",
                err.code()
            ),
            Err(err) => warn!(
                "event={event} module=service status=rejected backend={backend} entity={entity} duration_ms={duration_ms} error_code={}",
                err.code()
            ),
        }
        result
    }
}
