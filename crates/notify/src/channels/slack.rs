//! Slack webhook alert channel.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::channels::AlertChannel;
use crate::error::ChannelError;
use crate::events::AlertEvent;

/// Environment variable for Slack webhook URL.
pub const ENV_SLACK_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";

/// Slack webhook alert channel.
pub struct SlackChannel {
    webhook_url: Option<String>,
    client: reqwest::Client,
}

impl SlackChannel {
    /// Create a Slack channel, falling back to `SLACK_WEBHOOK_URL` when no
    /// URL is configured.
    #[must_use]
    pub fn new(webhook_url: Option<String>, client: reqwest::Client) -> Self {
        let webhook_url = webhook_url.or_else(|| std::env::var(ENV_SLACK_WEBHOOK_URL).ok());

        if webhook_url.is_some() {
            debug!("Slack alerts enabled");
        } else {
            debug!("Slack alerts disabled (no webhook URL)");
        }

        Self {
            webhook_url,
            client,
        }
    }

    /// Format an alert as a Slack webhook payload.
    fn format_payload(event: &AlertEvent) -> SlackPayload {
        let attachment = SlackAttachment {
            fallback: event.title(),
            color: event.severity.color().to_string(),
            author_name: Some(event.subject.clone()),
            title: event.title(),
            text: event.content.clone(),
            fields: vec![
                SlackField {
                    title: "Object".to_string(),
                    value: event.object.clone(),
                    short: true,
                },
                SlackField {
                    title: "Severity".to_string(),
                    value: event.severity.as_str().to_string(),
                    short: true,
                },
            ],
            footer: Some(event.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
            ts: Some(event.timestamp.timestamp()),
        };

        SlackPayload {
            attachments: vec![attachment],
        }
    }
}

#[async_trait]
impl AlertChannel for SlackChannel {
    fn name(&self) -> &'static str {
        "slack"
    }

    fn enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    async fn send(&self, event: &AlertEvent) -> Result<(), ChannelError> {
        let webhook_url = self
            .webhook_url
            .as_ref()
            .ok_or_else(|| ChannelError::NotConfigured("slack_webhook_url".to_string()))?;

        let payload = Self::format_payload(event);

        debug!(channel = "slack", title = %event.title(), "Sending alert");

        let response = self.client.post(webhook_url).json(&payload).send().await?;

        if response.status().is_success() {
            debug!(channel = "slack", "Alert sent successfully");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            warn!(
                channel = "slack",
                status = %status,
                body = %body,
                "Slack webhook request failed"
            );

            Err(ChannelError::Rejected {
                channel: "slack",
                status: status.as_u16(),
                body,
            })
        }
    }
}

// =============================================================================
// Slack API types
// =============================================================================

#[derive(Debug, Serialize)]
struct SlackPayload {
    attachments: Vec<SlackAttachment>,
}

#[derive(Debug, Serialize)]
struct SlackAttachment {
    fallback: String,
    color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    author_name: Option<String>,
    title: String,
    text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<SlackField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ts: Option<i64>,
}

#[derive(Debug, Serialize)]
struct SlackField {
    title: String,
    value: String,
    short: bool,
}
