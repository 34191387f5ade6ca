//! Transition detection and write-back.
//!
//! A record flips only when the check outcome disagrees with its persisted
//! `up` flag. Matching outcomes are a no-op: no write and no transition, so
//! repeated identical results never produce repeated notifications.
//!
//! The write touches only `up`, so edits made while the check was running
//! (toggles, deletes) survive it.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use upwatch_state::{RecordKey, Registry, Service, ServiceRecord, StateError};

use crate::checker::CheckOutcome;

/// Direction of a state flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

/// A decided flip of one service's `up` flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub key: RecordKey,
    pub direction: Direction,
    /// The service as it was before the flip.
    pub previous: Service,
}

/// The flip was decided but could not be written; the stored record is
/// unchanged. The transition is still carried so it can be announced.
#[derive(Debug, Error)]
#[error("could not persist {:?} transition for {}: {source}", .transition.direction, .transition.key)]
pub struct PersistError {
    pub transition: Transition,
    #[source]
    pub source: StateError,
}

/// Decide whether a service currently recorded as `up` must flip.
pub fn decide(up: bool, outcome: &CheckOutcome) -> Option<Direction> {
    match (up, outcome.is_healthy()) {
        (true, false) => Some(Direction::Down),
        (false, true) => Some(Direction::Up),
        _ => None,
    }
}

/// Apply a check outcome to a record, persisting the flip if there is one.
///
/// Returns the transition with the pre-flip service value, or `None` when
/// the outcome matches the stored state or the service was deleted while it
/// was being checked.
pub fn apply(
    registry: &dyn Registry,
    record: &ServiceRecord,
    outcome: &CheckOutcome,
) -> Result<Option<Transition>, PersistError> {
    let Some(direction) = decide(record.service.up, outcome) else {
        return Ok(None);
    };

    let transition = Transition {
        key: record.key.clone(),
        direction,
        previous: record.service.clone(),
    };

    match registry.set_service_up(&record.key, direction == Direction::Up) {
        Ok(()) => {
            info!(key = %record.key, url = %record.service.url, ?direction, "service state changed");
            Ok(Some(transition))
        }
        Err(StateError::NotFound { .. }) => {
            debug!(key = %record.key, "service deleted during check, dropping transition");
            Ok(None)
        }
        Err(source) => {
            warn!(key = %record.key, error = %source, "transition write failed");
            Err(PersistError { transition, source })
        }
    }
}
