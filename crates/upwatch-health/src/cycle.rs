//! Check cycle orchestration.
//!
//! One cycle takes a snapshot of the registry, checks every enabled
//! service (bounded parallelism, one task per service), writes back flips,
//! then sends at most one notification for the whole cycle.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use upwatch_state::{RecordKey, Registry, ServiceRecord, StateError};

use crate::checker::{CheckOutcome, HealthChecker};
use crate::notify::{Notification, Notifier, NotifyOutcome};
use crate::transition::{self, Direction, Transition};

/// Default number of services checked at once.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Cycle-level failures. Per-service problems never end up here.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("could not list services: {0}")]
    Snapshot(#[source] StateError),

    #[error("a check cycle is already running")]
    AlreadyRunning,
}

/// What happened to one enabled service during a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceReport {
    pub key: RecordKey,
    pub url: String,
    pub healthy: bool,
    /// Diagnostic message when the check failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Direction of the flip decided for this service, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<Direction>,
    /// Set when the flip could not be written. The flip is still announced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist_error: Option<String>,
}

/// Whether and how the cycle notified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NotificationStatus {
    /// No service changed state.
    NotNeeded,
    /// Something changed but the notifier is disabled.
    Disabled,
    Sent { recipients: usize },
    Failed { error: String },
}

/// Terminal summary of one cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    /// Services in the snapshot, enabled or not.
    pub total: usize,
    /// Disabled services that were skipped.
    pub skipped: usize,
    /// One report per enabled service, in registry listing order.
    pub reports: Vec<ServiceReport>,
    pub notification: Notification,
    pub notify_status: NotificationStatus,
    pub elapsed_ms: u64,
}

impl CycleSummary {
    /// Reports for services whose check failed.
    pub fn failures(&self) -> impl Iterator<Item = &ServiceReport> {
        self.reports.iter().filter(|r| !r.healthy)
    }

    /// Reports whose flip could not be persisted.
    pub fn persist_failures(&self) -> impl Iterator<Item = &ServiceReport> {
        self.reports.iter().filter(|r| r.persist_error.is_some())
    }

    /// Plain-text report: one line per problem, then `Done!`.
    pub fn text_report(&self) -> String {
        let mut out = String::new();
        for report in &self.reports {
            if let Some(reason) = &report.reason {
                out.push_str(reason);
                out.push('\n');
            }
            if let Some(err) = &report.persist_error {
                out.push_str(err);
                out.push('\n');
            }
        }
        if let NotificationStatus::Failed { error } = &self.notify_status {
            out.push_str("could not send notification: ");
            out.push_str(error);
            out.push('\n');
        }
        out.push_str("Done!");
        out
    }
}

/// Result of processing one service inside its task.
struct ServiceResult {
    report: ServiceReport,
    transition: Option<Transition>,
}

/// Runs check cycles against a registry.
pub struct CycleRunner {
    registry: Arc<dyn Registry>,
    checker: Arc<HealthChecker>,
    notifier: Notifier,
    max_concurrency: usize,
    /// Held for the duration of a cycle.
    in_flight: Mutex<()>,
}

impl CycleRunner {
    /// Create a runner with the default concurrency.
    pub fn new(registry: Arc<dyn Registry>, checker: HealthChecker, notifier: Notifier) -> Self {
        Self {
            registry,
            checker: Arc::new(checker),
            notifier,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            in_flight: Mutex::new(()),
        }
    }

    /// Limit how many services are checked at once (minimum 1).
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    /// Run one full cycle.
    ///
    /// Fails only if the snapshot cannot be taken or another cycle is still
    /// running on this runner.
    pub async fn run_cycle(&self) -> Result<CycleSummary, CycleError> {
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| CycleError::AlreadyRunning)?;
        let started = Instant::now();

        let snapshot = self.registry.list_services().map_err(CycleError::Snapshot)?;
        let total = snapshot.len();
        info!(services = total, "check cycle started");

        let (results, skipped) = self.check_all(snapshot).await;

        let mut notification = Notification::default();
        let mut reports = Vec::with_capacity(results.len());
        for result in results {
            if let Some(t) = &result.transition {
                notification.record(t);
            }
            reports.push(result.report);
        }

        let notify_status = self.send_notification(&notification).await;

        let summary = CycleSummary {
            total,
            skipped,
            reports,
            notification,
            notify_status,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            checked = summary.reports.len(),
            skipped,
            failed = summary.failures().count(),
            went_down = summary.notification.down.len(),
            went_up = summary.notification.up.len(),
            elapsed_ms = summary.elapsed_ms,
            "check cycle completed"
        );
        Ok(summary)
    }

    /// Check every enabled service, returning results in snapshot order.
    async fn check_all(&self, snapshot: Vec<ServiceRecord>) -> (Vec<ServiceResult>, usize) {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();
        let mut pending: HashMap<tokio::task::Id, (usize, ServiceRecord)> = HashMap::new();
        let mut skipped = 0;

        for (index, record) in snapshot.into_iter().enumerate() {
            if !record.service.enabled {
                debug!(key = %record.key, "service disabled, skipping");
                skipped += 1;
                continue;
            }

            let registry = Arc::clone(&self.registry);
            let checker = Arc::clone(&self.checker);
            let semaphore = Arc::clone(&semaphore);
            let task_record = record.clone();
            let handle = tasks.spawn(async move {
                // The semaphore is never closed.
                let _permit = semaphore.acquire_owned().await.ok();
                let result = process_service(registry.as_ref(), &checker, task_record).await;
                (index, result)
            });
            pending.insert(handle.id(), (index, record));
        }

        let mut results = Vec::with_capacity(pending.len());
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, (index, result))) => {
                    pending.remove(&id);
                    results.push((index, result));
                }
                Err(e) => {
                    let Some((index, record)) = pending.remove(&e.id()) else {
                        error!(error = %e, "unknown check task failed");
                        continue;
                    };
                    error!(key = %record.key, error = %e, "check task failed");
                    results.push((index, ServiceResult {
                        report: ServiceReport {
                            key: record.key,
                            url: record.service.url,
                            healthy: false,
                            reason: Some(format!("check task failed: {e}")),
                            transition: None,
                            persist_error: None,
                        },
                        transition: None,
                    }));
                }
            }
        }

        results.sort_by_key(|(index, _)| *index);
        (results.into_iter().map(|(_, r)| r).collect(), skipped)
    }

    async fn send_notification(&self, notification: &Notification) -> NotificationStatus {
        if notification.is_empty() {
            debug!("no transitions, nothing to notify");
            return NotificationStatus::NotNeeded;
        }

        match self.notifier.notify(self.registry.as_ref(), notification).await {
            Ok(NotifyOutcome::Sent { recipients }) => NotificationStatus::Sent { recipients },
            Ok(NotifyOutcome::Skipped) => NotificationStatus::Disabled,
            Err(e) => {
                error!(error = %e, "could not send notification");
                NotificationStatus::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}

/// Check, decide and persist for one service.
async fn process_service(
    registry: &dyn Registry,
    checker: &HealthChecker,
    record: ServiceRecord,
) -> ServiceResult {
    let outcome = checker.check(&record.service).await;
    if let CheckOutcome::Unhealthy(reason) = &outcome {
        info!(key = %record.key, %reason, "service check failed");
    }

    let (transition, persist_error) = match transition::apply(registry, &record, &outcome) {
        Ok(t) => (t, None),
        Err(e) => {
            warn!(error = %e, "continuing after persist failure");
            let message = e.to_string();
            (Some(e.transition), Some(message))
        }
    };

    ServiceResult {
        report: ServiceReport {
            key: record.key,
            url: record.service.url,
            healthy: outcome.is_healthy(),
            reason: outcome.reason().map(|r| r.to_string()),
            transition: transition.as_ref().map(|t| t.direction),
            persist_error,
        },
        transition,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use upwatch_state::{Address, AddressRecord, Service, StateResult, StateStore};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::notify::NotifyConfig;
    use crate::notify::testing::{FailingTransport, RecordingTransport};

    /// Wraps a store and fails writes to chosen keys.
    struct FlakyRegistry {
        inner: StateStore,
        fail_writes_for: Vec<RecordKey>,
        fail_list: AtomicBool,
    }

    impl FlakyRegistry {
        fn new(inner: StateStore) -> Self {
            Self {
                inner,
                fail_writes_for: Vec::new(),
                fail_list: AtomicBool::new(false),
            }
        }
    }

    impl Registry for FlakyRegistry {
        fn list_services(&self) -> StateResult<Vec<ServiceRecord>> {
            if self.fail_list.load(Ordering::SeqCst) {
                return Err(StateError::Read("disk on fire".to_string()));
            }
            self.inner.list_services()
        }

        fn list_addresses(&self) -> StateResult<Vec<AddressRecord>> {
            self.inner.list_addresses()
        }

        fn get_service(&self, key: &str) -> StateResult<Option<Service>> {
            self.inner.get_service(key)
        }

        fn put_service(&self, key: Option<&str>, service: &Service) -> StateResult<RecordKey> {
            if let Some(k) = key {
                if self.fail_writes_for.iter().any(|f| f == k) {
                    return Err(StateError::Write("quota exceeded".to_string()));
                }
            }
            self.inner.put_service(key, service)
        }

        fn set_service_up(&self, key: &str, up: bool) -> StateResult<()> {
            if self.fail_writes_for.iter().any(|f| f == key) {
                return Err(StateError::Write("quota exceeded".to_string()));
            }
            self.inner.set_service_up(key, up)
        }

        fn delete_service(&self, key: &str) -> StateResult<bool> {
            self.inner.delete_service(key)
        }

        fn put_address(&self, address: &Address) -> StateResult<RecordKey> {
            Registry::put_address(&self.inner, address)
        }

        fn delete_address(&self, key: &str) -> StateResult<bool> {
            self.inner.delete_address(key)
        }
    }

    fn checker() -> HealthChecker {
        HealthChecker::new(Duration::from_secs(5)).unwrap()
    }

    fn runner(
        registry: Arc<dyn Registry>,
        transport: Arc<RecordingTransport>,
    ) -> CycleRunner {
        CycleRunner::new(
            registry,
            checker(),
            Notifier::email(Arc::new(NotifyConfig::default()), transport),
        )
    }

    async fn mount(server: &MockServer, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    fn add(store: &StateStore, url: &str, up: bool, enabled: bool) -> RecordKey {
        let mut svc = Service::new(url, "OK");
        svc.up = up;
        svc.enabled = enabled;
        store.put_service(None, &svc).unwrap()
    }

    #[tokio::test]
    async fn healthy_service_goes_up() {
        let server = MockServer::start().await;
        mount(&server, "/health", "status: OK, load: 3").await;

        let store = StateStore::open_in_memory().unwrap();
        store.create_address("ops@example.com").unwrap();
        let url = format!("{}/health", server.uri());
        let key = add(&store, &url, false, true);

        let transport = Arc::new(RecordingTransport::default());
        let summary = runner(Arc::new(store.clone()), transport.clone())
            .run_cycle()
            .await
            .unwrap();

        assert_eq!(summary.notification.up.len(), 1);
        // The notification carries the pre-flip value.
        assert!(!summary.notification.up[0].up);
        assert_eq!(summary.notification.up[0].url, url);
        assert!(summary.notification.down.is_empty());
        assert!(store.get_service(&key).unwrap().unwrap().up);
        assert_eq!(summary.notify_status, NotificationStatus::Sent { recipients: 1 });
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn unreachable_service_goes_down() {
        let store = StateStore::open_in_memory().unwrap();
        let key = add(&store, "http://127.0.0.1:1/", true, true);

        let transport = Arc::new(RecordingTransport::default());
        let summary = runner(Arc::new(store.clone()), transport.clone())
            .run_cycle()
            .await
            .unwrap();

        assert_eq!(summary.notification.down.len(), 1);
        assert!(summary.notification.down[0].up);
        assert!(!store.get_service(&key).unwrap().unwrap().up);
        let reason = summary.reports[0].reason.as_deref().unwrap();
        assert!(reason.starts_with("could not access http://127.0.0.1:1/"));
    }

    #[tokio::test]
    async fn missing_health_string_goes_down_once() {
        let server = MockServer::start().await;
        mount(&server, "/health", "status: FAIL").await;

        let store = StateStore::open_in_memory().unwrap();
        add(&store, &format!("{}/health", server.uri()), true, true);

        let transport = Arc::new(RecordingTransport::default());
        let runner = runner(Arc::new(store.clone()), transport.clone());

        let first = runner.run_cycle().await.unwrap();
        assert_eq!(first.notification.down.len(), 1);

        let second = runner.run_cycle().await.unwrap();
        assert!(second.notification.is_empty());
        assert_eq!(second.notify_status, NotificationStatus::NotNeeded);
        assert_eq!(second.failures().count(), 1);
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn repeated_cycles_are_idempotent() {
        let server = MockServer::start().await;
        mount(&server, "/health", "OK").await;

        let store = StateStore::open_in_memory().unwrap();
        let key = add(&store, &format!("{}/health", server.uri()), false, true);

        let transport = Arc::new(RecordingTransport::default());
        let runner = runner(Arc::new(store.clone()), transport.clone());

        let first = runner.run_cycle().await.unwrap();
        assert_eq!(first.notification.up.len(), 1);
        let after_first = store.get_service(&key).unwrap().unwrap();

        let second = runner.run_cycle().await.unwrap();
        assert!(second.notification.is_empty());
        assert!(second.reports.iter().all(|r| r.transition.is_none()));
        assert_eq!(store.get_service(&key).unwrap().unwrap(), after_first);
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn disabled_services_are_never_fetched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .expect(0)
            .mount(&server)
            .await;

        let store = StateStore::open_in_memory().unwrap();
        let down_key = add(&store, &format!("{}/a", server.uri()), false, false);
        let up_key = add(&store, "http://127.0.0.1:1/", true, false);

        let transport = Arc::new(RecordingTransport::default());
        let summary = runner(Arc::new(store.clone()), transport.clone())
            .run_cycle()
            .await
            .unwrap();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.skipped, 2);
        assert!(summary.reports.is_empty());
        assert!(!store.get_service(&down_key).unwrap().unwrap().up);
        assert!(store.get_service(&up_key).unwrap().unwrap().up);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn no_transitions_means_no_notification() {
        let server = MockServer::start().await;
        mount(&server, "/health", "OK").await;

        let store = StateStore::open_in_memory().unwrap();
        add(&store, &format!("{}/health", server.uri()), true, true);
        add(&store, "http://127.0.0.1:1/", false, true);

        let transport = Arc::new(RecordingTransport::default());
        let summary = runner(Arc::new(store), transport.clone())
            .run_cycle()
            .await
            .unwrap();

        assert_eq!(summary.notify_status, NotificationStatus::NotNeeded);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn up_and_down_share_one_notification() {
        let server = MockServer::start().await;
        mount(&server, "/good", "all OK").await;
        mount(&server, "/bad", "error").await;

        let store = StateStore::open_in_memory().unwrap();
        store.create_address("ops@example.com").unwrap();
        let good = format!("{}/good", server.uri());
        let bad = format!("{}/bad", server.uri());
        add(&store, &good, false, true);
        add(&store, &bad, true, true);

        let transport = Arc::new(RecordingTransport::default());
        let summary = runner(Arc::new(store), transport.clone())
            .run_cycle()
            .await
            .unwrap();

        assert_eq!(summary.notification.up[0].url, good);
        assert_eq!(summary.notification.down[0].url, bad);

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].body.contains(&good));
        assert!(sent[0].body.contains(&bad));
        assert_eq!(sent[0].subject, "[upwatch] 1 down, 1 recovered");
    }

    #[tokio::test]
    async fn persist_failure_does_not_stop_the_cycle() {
        let server = MockServer::start().await;
        mount(&server, "/health", "OK").await;
        let url = format!("{}/health", server.uri());

        let store = StateStore::open_in_memory().unwrap();
        let broken = add(&store, &url, false, true);
        let healthy = add(&store, &url, false, true);

        let mut registry = FlakyRegistry::new(store.clone());
        registry.fail_writes_for.push(broken.clone());

        let transport = Arc::new(RecordingTransport::default());
        let summary = runner(Arc::new(registry), transport.clone())
            .with_max_concurrency(1)
            .run_cycle()
            .await
            .unwrap();

        assert_eq!(summary.persist_failures().count(), 1);
        assert_eq!(summary.reports[0].key, broken);
        assert_eq!(summary.reports[0].transition, Some(Direction::Up));
        assert_eq!(summary.reports[1].transition, Some(Direction::Up));

        assert!(!store.get_service(&broken).unwrap().unwrap().up);
        assert!(store.get_service(&healthy).unwrap().unwrap().up);
        // Both decided flips are announced, written or not.
        assert_eq!(summary.notification.up.len(), 2);
        assert_eq!(transport.sent().len(), 1);
        assert!(summary.text_report().contains("quota exceeded"));
    }

    /// Spawn a cycle against an endpoint that answers after 400ms.
    async fn slow_cycle(
        store: &StateStore,
        server: &MockServer,
    ) -> (RecordKey, tokio::task::JoinHandle<Result<CycleSummary, CycleError>>) {
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("OK")
                    .set_delay(Duration::from_millis(400)),
            )
            .mount(server)
            .await;
        let key = add(store, &server.uri(), false, true);

        let runner = CycleRunner::new(Arc::new(store.clone()), checker(), Notifier::Disabled);
        let handle = tokio::spawn(async move { runner.run_cycle().await });
        tokio::time::sleep(Duration::from_millis(100)).await;
        (key, handle)
    }

    #[tokio::test]
    async fn disable_during_check_is_kept() {
        let server = MockServer::start().await;
        let store = StateStore::open_in_memory().unwrap();
        let (key, cycle) = slow_cycle(&store, &server).await;

        store.set_service_enabled(&key, false).unwrap();
        let summary = cycle.await.unwrap().unwrap();

        assert_eq!(summary.reports[0].transition, Some(Direction::Up));
        let after = store.get_service(&key).unwrap().unwrap();
        assert!(!after.enabled);
        assert!(after.up);
    }

    #[tokio::test]
    async fn delete_during_check_is_kept() {
        let server = MockServer::start().await;
        let store = StateStore::open_in_memory().unwrap();
        let (key, cycle) = slow_cycle(&store, &server).await;

        store.delete_service(&key).unwrap();
        let summary = cycle.await.unwrap().unwrap();

        assert!(store.get_service(&key).unwrap().is_none());
        assert!(summary.reports[0].transition.is_none());
        assert!(summary.notification.is_empty());
    }

    #[tokio::test]
    async fn notify_failure_keeps_persisted_state() {
        let server = MockServer::start().await;
        mount(&server, "/health", "OK").await;

        let store = StateStore::open_in_memory().unwrap();
        let key = add(&store, &format!("{}/health", server.uri()), false, true);

        let runner = CycleRunner::new(
            Arc::new(store.clone()),
            checker(),
            Notifier::email(Arc::new(NotifyConfig::default()), Arc::new(FailingTransport)),
        );
        let summary = runner.run_cycle().await.unwrap();

        assert!(matches!(summary.notify_status, NotificationStatus::Failed { .. }));
        assert!(store.get_service(&key).unwrap().unwrap().up);
        assert!(summary.text_report().contains("could not send notification"));
    }

    #[tokio::test]
    async fn disabled_notifier_still_persists() {
        let server = MockServer::start().await;
        mount(&server, "/health", "OK").await;

        let store = StateStore::open_in_memory().unwrap();
        let key = add(&store, &format!("{}/health", server.uri()), false, true);

        let runner = CycleRunner::new(Arc::new(store.clone()), checker(), Notifier::Disabled);
        let summary = runner.run_cycle().await.unwrap();

        assert_eq!(summary.notify_status, NotificationStatus::Disabled);
        assert_eq!(summary.notification.up.len(), 1);
        assert!(store.get_service(&key).unwrap().unwrap().up);
    }

    #[tokio::test]
    async fn snapshot_failure_fails_the_cycle() {
        let registry = FlakyRegistry::new(StateStore::open_in_memory().unwrap());
        registry.fail_list.store(true, Ordering::SeqCst);

        let runner = CycleRunner::new(Arc::new(registry), checker(), Notifier::Disabled);
        assert!(matches!(
            runner.run_cycle().await,
            Err(CycleError::Snapshot(_))
        ));
    }

    #[tokio::test]
    async fn overlapping_cycles_are_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("OK")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let store = StateStore::open_in_memory().unwrap();
        add(&store, &server.uri(), false, true);

        let runner = Arc::new(CycleRunner::new(Arc::new(store), checker(), Notifier::Disabled));
        let background = {
            let runner = Arc::clone(&runner);
            tokio::spawn(async move { runner.run_cycle().await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(matches!(
            runner.run_cycle().await,
            Err(CycleError::AlreadyRunning)
        ));
        assert!(background.await.unwrap().is_ok());
        // Once finished, the runner accepts new cycles.
        assert!(runner.run_cycle().await.is_ok());
    }

    #[tokio::test]
    async fn parallel_results_keep_listing_order() {
        let server = MockServer::start().await;
        for i in 0..8u64 {
            Mock::given(method("GET"))
                .and(path(format!("/svc{i}")))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_string("OK")
                        // Later services answer first.
                        .set_delay(Duration::from_millis(10 * (8 - i))),
                )
                .mount(&server)
                .await;
        }

        let store = StateStore::open_in_memory().unwrap();
        let urls: Vec<String> = (0..8).map(|i| format!("{}/svc{i}", server.uri())).collect();
        for url in &urls {
            add(&store, url, false, true);
        }

        let transport = Arc::new(RecordingTransport::default());
        let summary = runner(Arc::new(store), transport)
            .with_max_concurrency(4)
            .run_cycle()
            .await
            .unwrap();

        let announced: Vec<String> = summary.notification.up.iter().map(|s| s.url.clone()).collect();
        assert_eq!(announced, urls);
        let reported: Vec<String> = summary.reports.iter().map(|r| r.url.clone()).collect();
        assert_eq!(reported, urls);
    }

    #[test]
    fn text_report_lists_failures_then_done() {
        let summary = CycleSummary {
            total: 2,
            skipped: 0,
            reports: vec![
                ServiceReport {
                    key: "svc-000000000001".to_string(),
                    url: "http://y".to_string(),
                    healthy: false,
                    reason: Some("could not access http://y: connection refused".to_string()),
                    transition: Some(Direction::Down),
                    persist_error: None,
                },
                ServiceReport {
                    key: "svc-000000000002".to_string(),
                    url: "http://x/health".to_string(),
                    healthy: true,
                    reason: None,
                    transition: None,
                    persist_error: None,
                },
            ],
            notification: Notification::default(),
            notify_status: NotificationStatus::NotNeeded,
            elapsed_ms: 3,
        };

        assert_eq!(
            summary.text_report(),
            "could not access http://y: connection refused\nDone!"
        );
    }
}
