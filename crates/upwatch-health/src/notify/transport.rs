//! Mail transport implementations (log, webhook relay).

use async_trait::async_trait;
use tracing::{info, warn};

use crate::http::HttpClient;

use super::{MailMessage, NotifyError};

/// Delivers a composed message.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Deliver one message to all of its recipients.
    async fn send(&self, message: &MailMessage) -> Result<(), NotifyError>;
}

/// Writes messages to the log instead of delivering them.
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, message: &MailMessage) -> Result<(), NotifyError> {
        if message.to.is_empty() {
            warn!(subject = %message.subject, "notification has no recipients");
        }
        info!(
            from = %message.sender,
            to = ?message.to,
            subject = %message.subject,
            body = %message.body,
            "notification"
        );
        Ok(())
    }
}

/// POSTs messages as JSON to an HTTP mail relay.
///
/// Payload: `{"sender", "to", "subject", "body"}`. Any non-2xx response is
/// a delivery failure.
pub struct WebhookTransport {
    url: String,
    client: HttpClient,
}

impl WebhookTransport {
    pub fn new(url: impl Into<String>, client: HttpClient) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    fn failure(&self, reason: impl Into<String>) -> NotifyError {
        NotifyError::Transport {
            transport: self.name().to_string(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl MailTransport for WebhookTransport {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, message: &MailMessage) -> Result<(), NotifyError> {
        let payload =
            serde_json::to_value(message).map_err(|e| self.failure(e.to_string()))?;

        let (status, body) = self
            .client
            .post_json(&self.url, &payload)
            .await
            .map_err(|e| self.failure(e.to_string()))?;

        if status.is_success() {
            Ok(())
        } else {
            Err(self.failure(format!(
                "relay returned {status}: {}",
                String::from_utf8_lossy(&body)
            )))
        }
    }
}
