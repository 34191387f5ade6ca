//! Health check probe logic.
//!
//! A check is one bounded GET of the service URL followed by a substring
//! search for the health string. There are no retries: a transient failure
//! looks exactly like an outage until the next cycle.

use std::fmt;
use std::time::Duration;

use tracing::debug;

use upwatch_state::Service;

use crate::http::{ClientError, FetchFailure, HttpClient};

/// Default per-check timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Why a service was classified unhealthy.
///
/// All variants fold into the same transition decision; they only differ in
/// the diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnhealthyReason {
    /// Transport failure: DNS, refused connection, TLS, timeout, bad URL.
    Fetch { url: String, cause: String },
    /// The response started but the body could not be read.
    BodyRead { cause: String },
    /// The body was read but did not contain the health string.
    HealthStringMissing { url: String },
}

impl fmt::Display for UnhealthyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnhealthyReason::Fetch { url, cause } => write!(f, "could not access {url}: {cause}"),
            UnhealthyReason::BodyRead { cause } => write!(f, "could not read response body: {cause}"),
            UnhealthyReason::HealthStringMissing { url } => {
                write!(f, "health string not found on {url}")
            }
        }
    }
}

/// Result of a single health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Healthy,
    Unhealthy(UnhealthyReason),
}

impl CheckOutcome {
    pub fn is_healthy(&self) -> bool {
        matches!(self, CheckOutcome::Healthy)
    }

    /// The failure message, if any.
    pub fn reason(&self) -> Option<&UnhealthyReason> {
        match self {
            CheckOutcome::Healthy => None,
            CheckOutcome::Unhealthy(reason) => Some(reason),
        }
    }
}

/// Classify a fully read body against the expected health string.
///
/// An empty health string accepts any body.
pub fn classify_body(url: &str, health_string: &str, body: &[u8]) -> CheckOutcome {
    if health_string.is_empty() || String::from_utf8_lossy(body).contains(health_string) {
        CheckOutcome::Healthy
    } else {
        CheckOutcome::Unhealthy(UnhealthyReason::HealthStringMissing {
            url: url.to_string(),
        })
    }
}

/// Performs health checks against service URLs.
#[derive(Clone)]
pub struct HealthChecker {
    client: HttpClient,
}

impl HealthChecker {
    /// Create a checker whose fetches are bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            client: HttpClient::new(timeout)?,
        })
    }

    /// Create a checker around an existing client.
    pub fn with_client(client: HttpClient) -> Self {
        Self { client }
    }

    /// Fetch the service URL once and classify the result.
    pub async fn check(&self, service: &Service) -> CheckOutcome {
        let url = service.url.as_str();
        let outcome = match self.client.get(url).await {
            Ok(body) => classify_body(url, &service.health_string, &body),
            Err(FetchFailure::Access(cause)) => CheckOutcome::Unhealthy(UnhealthyReason::Fetch {
                url: url.to_string(),
                cause,
            }),
            Err(FetchFailure::Body(cause)) => {
                CheckOutcome::Unhealthy(UnhealthyReason::BodyRead { cause })
            }
        };
        debug!(%url, healthy = outcome.is_healthy(), "health check finished");
        outcome
    }
}
