//! The registry seam between the checker and storage.
//!
//! The check cycle and the notifier only ever talk to storage through this
//! trait, so tests can wrap a real store and inject write failures.

use crate::error::StateResult;
use crate::types::*;

/// Keyed storage of services and notification addresses.
///
/// List calls return every record of the kind, in creation order.
pub trait Registry: Send + Sync {
    /// All registered services.
    fn list_services(&self) -> StateResult<Vec<ServiceRecord>>;

    /// All registered notification addresses.
    fn list_addresses(&self) -> StateResult<Vec<AddressRecord>>;

    /// Fetch one service by key.
    fn get_service(&self, key: &str) -> StateResult<Option<Service>>;

    /// Insert (`key == None`) or overwrite a service. Returns its key.
    fn put_service(&self, key: Option<&str>, service: &Service) -> StateResult<RecordKey>;

    /// Set only the `up` flag of an existing service.
    ///
    /// Returns `StateError::NotFound` if the service no longer exists.
    fn set_service_up(&self, key: &str, up: bool) -> StateResult<()>;

    /// Remove a service. Returns true if it existed.
    fn delete_service(&self, key: &str) -> StateResult<bool>;

    /// Register a new address. Returns its key.
    fn put_address(&self, address: &Address) -> StateResult<RecordKey>;

    /// Remove an address. Returns true if it existed.
    fn delete_address(&self, key: &str) -> StateResult<bool>;
}
