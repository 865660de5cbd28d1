//! Generic JSON webhook alert channel.
//!
//! POSTs the [`AlertEvent`] as-is, so any receiver that understands
//! `{severity, subject, object, content, timestamp}` can relay it onwards
//! (SMS gateways, mail bridges, on-call tooling).

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::channels::AlertChannel;
use crate::error::ChannelError;
use crate::events::AlertEvent;

pub struct WebhookChannel {
    url: Option<String>,
    client: reqwest::Client,
}

impl WebhookChannel {
    #[must_use]
    pub fn new(url: Option<String>, client: reqwest::Client) -> Self {
        Self { url, client }
    }
}

#[async_trait]
impl AlertChannel for WebhookChannel {
    fn name(&self) -> &'static str {
        "webhook"
    }

    fn enabled(&self) -> bool {
        self.url.is_some()
    }

    async fn send(&self, event: &AlertEvent) -> Result<(), ChannelError> {
        let url = self
            .url
            .as_ref()
            .ok_or_else(|| ChannelError::NotConfigured("webhook_url".to_string()))?;

        debug!(channel = "webhook", title = %event.title(), "Sending alert");

        let response = self.client.post(url).json(event).send().await?;

        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        warn!(channel = "webhook", status = %status, "Webhook request failed");

        Err(ChannelError::Rejected {
            channel: "webhook",
            status: status.as_u16(),
            body,
        })
    }
}
