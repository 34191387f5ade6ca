//! StateStore — redb-backed registry persistence.
//!
//! Provides typed CRUD over services and addresses. Values are
//! JSON-serialized into redb's `&[u8]` columns. The store supports both
//! on-disk and in-memory backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, WriteTransaction};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::registry::Registry;
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

fn encode<T: Serialize>(key: &str, value: &T) -> StateResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| StateError::Codec {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> StateResult<T> {
    serde_json::from_slice(bytes).map_err(|e| StateError::Codec {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn table_for(kind: RecordKind) -> RecordTable {
    match kind {
        RecordKind::Service => SERVICES,
        RecordKind::Address => ADDRESSES,
    }
}

/// Thread-safe registry store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(SERVICES).map_err(map_err!(Table))?;
        txn.open_table(ADDRESSES).map_err(map_err!(Table))?;
        txn.open_table(SEQUENCES).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Generic record plumbing ────────────────────────────────────

    /// Bump the sequence for `kind` inside `txn` and return the new key.
    fn next_key(txn: &WriteTransaction, kind: RecordKind) -> StateResult<RecordKey> {
        let mut seq = txn.open_table(SEQUENCES).map_err(map_err!(Table))?;
        let current = seq
            .get(kind.prefix())
            .map_err(map_err!(Read))?
            .map(|guard| guard.value())
            .unwrap_or(0);
        let next = current + 1;
        seq.insert(kind.prefix(), next).map_err(map_err!(Write))?;
        Ok(kind.table_key(next))
    }

    fn put_record<T: Serialize>(
        &self,
        kind: RecordKind,
        key: Option<&str>,
        value: &T,
    ) -> StateResult<RecordKey> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let key = match key {
            Some(k) => k.to_string(),
            None => Self::next_key(&txn, kind)?,
        };
        let bytes = encode(&key, value)?;
        {
            let mut table = txn.open_table(table_for(kind)).map_err(map_err!(Table))?;
            table
                .insert(key.as_str(), bytes.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, "record stored");
        Ok(key)
    }

    fn get_record<T: DeserializeOwned>(&self, kind: RecordKind, key: &str) -> StateResult<Option<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table_for(kind)).map_err(map_err!(Table))?;
        match table.get(key).map_err(map_err!(Read))? {
            Some(guard) => Ok(Some(decode(key, guard.value())?)),
            None => Ok(None),
        }
    }

    fn list_records<T: DeserializeOwned>(&self, kind: RecordKind) -> StateResult<Vec<(RecordKey, T)>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table_for(kind)).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            let key = key.value().to_string();
            let record = decode(&key, value.value())?;
            results.push((key, record));
        }
        Ok(results)
    }

    fn delete_record(&self, kind: RecordKind, key: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(table_for(kind)).map_err(map_err!(Table))?;
            existed = table.remove(key).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, existed, "record deleted");
        Ok(existed)
    }

    // ── Services ───────────────────────────────────────────────────

    /// Register a new service (enabled, not yet up). Returns its key.
    pub fn create_service(&self, url: &str, health_string: &str) -> StateResult<RecordKey> {
        self.put_record(RecordKind::Service, None, &Service::new(url, health_string))
    }

    /// Insert or overwrite a service.
    pub fn put_service(&self, key: Option<&str>, service: &Service) -> StateResult<RecordKey> {
        self.put_record(RecordKind::Service, key, service)
    }

    /// Get a service by key.
    pub fn get_service(&self, key: &str) -> StateResult<Option<Service>> {
        self.get_record(RecordKind::Service, key)
    }

    /// List all services in creation order.
    pub fn list_services(&self) -> StateResult<Vec<ServiceRecord>> {
        Ok(self
            .list_records(RecordKind::Service)?
            .into_iter()
            .map(|(key, service)| ServiceRecord { key, service })
            .collect())
    }

    /// Delete a service by key. Returns true if it existed.
    pub fn delete_service(&self, key: &str) -> StateResult<bool> {
        self.delete_record(RecordKind::Service, key)
    }

    /// Read-modify-write one service inside a single write transaction.
    ///
    /// Fails with `NotFound` if the key is gone, so a concurrent delete is
    /// never undone.
    fn update_service(&self, key: &str, apply: impl FnOnce(&mut Service)) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(SERVICES).map_err(map_err!(Table))?;
            let bytes = table
                .get(key)
                .map_err(map_err!(Read))?
                .map(|guard| guard.value().to_vec())
                .ok_or_else(|| StateError::NotFound {
                    kind: "service",
                    key: key.to_string(),
                })?;
            let mut service: Service = decode(key, &bytes)?;
            apply(&mut service);
            let bytes = encode(key, &service)?;
            table
                .insert(key, bytes.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Toggle whether checks run against a service.
    pub fn set_service_enabled(&self, key: &str, enabled: bool) -> StateResult<()> {
        self.update_service(key, |service| service.enabled = enabled)?;
        debug!(%key, enabled, "service toggled");
        Ok(())
    }

    /// Record the latest check result. Only the `up` flag is touched.
    pub fn set_service_up(&self, key: &str, up: bool) -> StateResult<()> {
        self.update_service(key, |service| service.up = up)?;
        debug!(%key, up, "service state recorded");
        Ok(())
    }

    // ── Addresses ──────────────────────────────────────────────────

    /// Register a notification address. Returns its key.
    pub fn create_address(&self, email: &str) -> StateResult<RecordKey> {
        self.put_record(
            RecordKind::Address,
            None,
            &Address {
                email: email.to_string(),
            },
        )
    }

    /// List all addresses in creation order.
    pub fn list_addresses(&self) -> StateResult<Vec<AddressRecord>> {
        Ok(self
            .list_records(RecordKind::Address)?
            .into_iter()
            .map(|(key, address)| AddressRecord { key, address })
            .collect())
    }

    /// Delete an address by key. Returns true if it existed.
    pub fn delete_address(&self, key: &str) -> StateResult<bool> {
        self.delete_record(RecordKind::Address, key)
    }
}

impl Registry for StateStore {
    fn list_services(&self) -> StateResult<Vec<ServiceRecord>> {
        StateStore::list_services(self)
    }

    fn list_addresses(&self) -> StateResult<Vec<AddressRecord>> {
        StateStore::list_addresses(self)
    }

    fn get_service(&self, key: &str) -> StateResult<Option<Service>> {
        StateStore::get_service(self, key)
    }

    fn put_service(&self, key: Option<&str>, service: &Service) -> StateResult<RecordKey> {
        StateStore::put_service(self, key, service)
    }

    fn set_service_up(&self, key: &str, up: bool) -> StateResult<()> {
        StateStore::set_service_up(self, key, up)
    }

    fn delete_service(&self, key: &str) -> StateResult<bool> {
        StateStore::delete_service(self, key)
    }

    fn put_address(&self, address: &Address) -> StateResult<RecordKey> {
        self.put_record(RecordKind::Address, None, address)
    }

    fn delete_address(&self, key: &str) -> StateResult<bool> {
        StateStore::delete_address(self, key)
    }
}
