//! upwatch-health — probes, state transitions, check cycles and
//! notifications for upwatch.
//!
//! # Architecture
//!
//! ```text
//! CycleRunner::run_cycle()
//!   ├── Registry snapshot (list_services)
//!   ├── Per-service task (bounded by a semaphore)
//!   │   ├── HealthChecker::check() → CheckOutcome
//!   │   └── transition::apply() → persisted flip, if any
//!   ├── Notification (down / up lists, listing order)
//!   └── Notifier → one MailMessage per cycle
//! ```
//!
//! A service flips only when its check disagrees with the stored `up`
//! flag, so steady states never generate mail.

pub mod checker;
pub mod cycle;
pub mod http;
pub mod notify;
pub mod transition;

pub use checker::{CheckOutcome, DEFAULT_TIMEOUT, HealthChecker, UnhealthyReason};
pub use cycle::{
    CycleError, CycleRunner, CycleSummary, DEFAULT_MAX_CONCURRENCY, NotificationStatus,
    ServiceReport,
};
pub use http::{ClientError, FetchFailure, HttpClient, validate_url};
pub use notify::{
    EmailNotifier, LogTransport, MailMessage, MailTransport, Notification, Notifier, NotifyConfig,
    NotifyError, NotifyOutcome, WebhookTransport,
};
pub use transition::{Direction, PersistError, Transition};
