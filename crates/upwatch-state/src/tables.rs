//! redb table definitions for the upwatch registry.
//!
//! Record tables use `&str` keys and `&[u8]` values (JSON-serialized records).

use redb::TableDefinition;

/// Shape shared by every record table.
pub type RecordTable = TableDefinition<'static, &'static str, &'static [u8]>;

/// Monitored services keyed by `svc-{seq}`.
pub const SERVICES: RecordTable = TableDefinition::new("services");

/// Notification recipients keyed by `addr-{seq}`.
pub const ADDRESSES: RecordTable = TableDefinition::new("addresses");

/// Last allocated sequence number per record kind.
pub const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");
