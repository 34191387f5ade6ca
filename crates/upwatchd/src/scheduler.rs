//! Interval scheduler for check cycles.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use upwatch_health::{CycleError, CycleRunner};

/// Run a cycle every `interval` until `shutdown` flips.
///
/// The first cycle starts one interval after launch. A cycle that is still
/// running when the next tick arrives (e.g. one triggered via `/check`) makes
/// that tick a no-op.
pub async fn run(runner: Arc<CycleRunner>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    info!(interval_secs = interval.as_secs_f64(), "check scheduler started");

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                match runner.run_cycle().await {
                    Ok(summary) => debug!(
                        checked = summary.reports.len(),
                        failed = summary.failures().count(),
                        "scheduled cycle finished"
                    ),
                    Err(CycleError::AlreadyRunning) => {
                        warn!("previous check cycle still running, skipping tick");
                    }
                    Err(e) => error!(error = %e, "scheduled check cycle failed"),
                }
            }
            _ = shutdown.changed() => {
                info!("check scheduler shutting down");
                break;
            }
        }
    }
}
