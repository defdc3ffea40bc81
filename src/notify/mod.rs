//! Best-effort notifications
//!
//! Announces a successful dispatch to a Discord-compatible webhook. Delivery
//! never influences the dispatch outcome.

pub mod webhook;

pub use webhook::WebhookNotifier;

use thiserror::Error;

/// A torrent was handed to the download client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub actor: String,
    pub torrent_id: u64,
    pub title: Option<String>,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook timed out")]
    Timeout,

    #[error("webhook returned status {0}")]
    Status(u16),

    #[error("webhook transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NotifyError::Timeout
        } else {
            NotifyError::Transport(err.to_string())
        }
    }
}

/// Fire-and-forget notification sink
///
/// `notify` returns immediately; implementations deliver in the background
/// and only log failures.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: NotificationEvent);
}

/// Notifier used when no webhook is configured
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, event: NotificationEvent) {
        tracing::debug!(torrent_id = event.torrent_id, "Notifications disabled");
    }
}
