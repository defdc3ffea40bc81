//! Discord webhook notifier

use super::{NotificationEvent, Notifier, NotifyError};
use crate::core::config::NotificationConfig;
use crate::core::error::{GatewayError, Result};
use serde::Serialize;
use std::time::Duration;

const BOT_NAME: &str = "Shelfdrop";
const EMBED_TITLE: &str = "📚 Torrent sent to qBittorrent";
const EMBED_COLOR: u32 = 0xE91E63;

#[derive(Debug, Serialize)]
pub struct WebhookPayload {
    pub username: String,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
}

impl WebhookPayload {
    pub fn for_event(event: &NotificationEvent) -> Self {
        let mut description = format!(
            "**User:** `{}`\n**Torrent ID:** `{}`",
            event.actor, event.torrent_id
        );
        if let Some(title) = event.title.as_deref().filter(|t| !t.is_empty()) {
            description.push_str(&format!("\n**Title:** {}", title));
        }

        Self {
            username: BOT_NAME.to_string(),
            embeds: vec![Embed {
                title: EMBED_TITLE.to_string(),
                description,
                color: EMBED_COLOR,
            }],
        }
    }
}

#[derive(Clone)]
pub struct WebhookNotifier {
    http_client: reqwest::Client,
    webhook_url: String,
    timeout: Duration,
}

impl WebhookNotifier {
    /// `None` when no webhook is configured
    pub fn from_config(config: &NotificationConfig) -> Result<Option<Self>> {
        let Some(url) = config.webhook() else {
            return Ok(None);
        };
        Ok(Some(Self::new(url, config.timeout())?))
    }

    pub fn new(webhook_url: &str, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::InitializationError(format!("Webhook HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            webhook_url: webhook_url.to_string(),
            timeout,
        })
    }

    /// Deliver one event and report the outcome
    pub async fn send(&self, event: &NotificationEvent) -> std::result::Result<(), NotifyError> {
        let response = self
            .http_client
            .post(&self.webhook_url)
            .json(&WebhookPayload::for_event(event))
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }
        Ok(())
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, event: NotificationEvent) {
        let notifier = self.clone();
        tokio::spawn(async move {
            match notifier.send(&event).await {
                Ok(()) => tracing::debug!(torrent_id = event.torrent_id, "Webhook delivered"),
                Err(e) => tracing::warn!(
                    torrent_id = event.torrent_id,
                    error = %e,
                    "Webhook notification failed"
                ),
            }
        });
    }
}
