//! Cycle notifications.
//!
//! A cycle collects every transition into one [`Notification`]. If it is not
//! empty the [`Notifier`] renders it once and hands a single message,
//! addressed to every registered recipient, to a [`MailTransport`].
//!
//! Notification failures never touch stored state: transitions are already
//! persisted by the time a notifier runs.

mod template;
mod transport;

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use upwatch_state::{Registry, Service, StateError};

use crate::transition::{Direction, Transition};

pub use template::render;
pub use transport::{LogTransport, MailTransport, WebhookTransport};

/// Transitions collected during one cycle, in registry listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Services that went down (pre-flip values).
    pub down: Vec<Service>,
    /// Services that came back up (pre-flip values).
    pub up: Vec<Service>,
}

impl Notification {
    pub fn is_empty(&self) -> bool {
        self.down.is_empty() && self.up.is_empty()
    }

    /// Add a transition to the matching list.
    pub fn record(&mut self, transition: &Transition) {
        match transition.direction {
            Direction::Down => self.down.push(transition.previous.clone()),
            Direction::Up => self.up.push(transition.previous.clone()),
        }
    }
}

/// Process-wide notification settings, fixed at startup.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// `From` header, e.g. `upwatch <notify@example.com>`.
    pub sender: String,
    /// Prepended to every subject line.
    pub subject_prefix: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            sender: "upwatch <notify@upwatch.local>".to_string(),
            subject_prefix: "[upwatch]".to_string(),
        }
    }
}

/// One outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailMessage {
    pub sender: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Errors raised while notifying.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("template render failed: {0}")]
    Render(#[from] askama::Error),

    #[error("could not load recipients: {0}")]
    Recipients(#[source] StateError),

    #[error("{transport} transport failed: {reason}")]
    Transport { transport: String, reason: String },
}

/// What a notify call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Notifications are turned off.
    Skipped,
    /// One message handed to the transport.
    Sent { recipients: usize },
}

/// Email notifier: render, look up recipients, send one batch.
pub struct EmailNotifier {
    config: Arc<NotifyConfig>,
    transport: Arc<dyn MailTransport>,
}

impl EmailNotifier {
    pub fn new(config: Arc<NotifyConfig>, transport: Arc<dyn MailTransport>) -> Self {
        Self { config, transport }
    }

    /// Build the message for `notification` addressed to `to`.
    pub fn compose(
        &self,
        notification: &Notification,
        to: Vec<String>,
    ) -> Result<MailMessage, NotifyError> {
        let (subject, body) = render(&self.config.subject_prefix, notification)?;
        Ok(MailMessage {
            sender: self.config.sender.clone(),
            to,
            subject,
            body,
        })
    }

    async fn notify(
        &self,
        registry: &dyn Registry,
        notification: &Notification,
    ) -> Result<NotifyOutcome, NotifyError> {
        let to: Vec<String> = registry
            .list_addresses()
            .map_err(NotifyError::Recipients)?
            .into_iter()
            .map(|record| record.address.email)
            .collect();
        let recipients = to.len();

        // Zero recipients is not an error here; the transport decides.
        let message = self.compose(notification, to)?;
        debug!(transport = self.transport.name(), recipients, subject = %message.subject, "sending notification");
        self.transport.send(&message).await?;

        info!(
            recipients,
            down = notification.down.len(),
            up = notification.up.len(),
            "notification sent"
        );
        Ok(NotifyOutcome::Sent { recipients })
    }
}

/// Notification capability of the check cycle, selected by configuration.
pub enum Notifier {
    /// Transitions are persisted but nobody is told.
    Disabled,
    Email(EmailNotifier),
}

impl Notifier {
    /// Email notifier over the given transport.
    pub fn email(config: Arc<NotifyConfig>, transport: Arc<dyn MailTransport>) -> Self {
        Notifier::Email(EmailNotifier::new(config, transport))
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Notifier::Email(_))
    }

    /// Send one message describing `notification`.
    pub async fn notify(
        &self,
        registry: &dyn Registry,
        notification: &Notification,
    ) -> Result<NotifyOutcome, NotifyError> {
        match self {
            Notifier::Disabled => {
                debug!("notifications disabled, skipping");
                Ok(NotifyOutcome::Skipped)
            }
            Notifier::Email(email) => email.notify(registry, notification).await,
        }
    }
}
