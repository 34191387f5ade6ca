//! upwatch-state — persistent registry of monitored services and
//! notification addresses.
//!
//! Backed by [redb](https://docs.rs/redb). Records are JSON-serialized into
//! `&[u8]` value columns, one table per record kind. Keys are allocated from
//! a per-kind sequence (`svc-000000000001`, `addr-000000000001`, ...) so a
//! table scan returns records in creation order.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and implements the [`Registry`] trait that the checker depends on.

pub mod error;
pub mod registry;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use registry::Registry;
pub use store::StateStore;
pub use types::*;
