//! Record types stored in the registry.

use serde::{Deserialize, Serialize};

/// Opaque record identifier assigned by the registry.
pub type RecordKey = String;

// ── Service ───────────────────────────────────────────────────────

/// A monitored HTTP endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Service {
    /// Address fetched on every check.
    pub url: String,
    /// Substring expected in a healthy response body. Empty means any
    /// successfully read body counts as healthy.
    pub health_string: String,
    /// Outcome of the most recent completed check.
    pub up: bool,
    /// Whether checks run against this service.
    pub enabled: bool,
}

impl Service {
    /// A freshly registered service: enabled, not yet seen up.
    pub fn new(url: impl Into<String>, health_string: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            health_string: health_string.into(),
            up: false,
            enabled: true,
        }
    }
}

/// A service together with its registry key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceRecord {
    pub key: RecordKey,
    pub service: Service,
}

// ── Address ───────────────────────────────────────────────────────

/// A notification recipient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    pub email: String,
}

/// An address together with its registry key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddressRecord {
    pub key: RecordKey,
    pub address: Address,
}

/// Record kinds, each with its own table and key sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Service,
    Address,
}

impl RecordKind {
    /// Key prefix and sequence name for this kind.
    pub fn prefix(self) -> &'static str {
        match self {
            RecordKind::Service => "svc",
            RecordKind::Address => "addr",
        }
    }

    /// Build the table key for the `seq`-th record of this kind.
    ///
    /// Zero-padding keeps lexicographic key order equal to creation order.
    pub fn table_key(self, seq: u64) -> RecordKey {
        format!("{}-{seq:012}", self.prefix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_service_is_enabled_and_down() {
        let svc = Service::new("http://x/health", "OK");
        assert!(svc.enabled);
        assert!(!svc.up);
    }

    #[test]
    fn table_keys_sort_in_creation_order() {
        let a = RecordKind::Service.table_key(9);
        let b = RecordKind::Service.table_key(10);
        assert_eq!(a, "svc-000000000009");
        assert!(a < b);
    }
}
