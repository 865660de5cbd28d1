//! Alert delivery for the guardian watchdog.
//!
//! This crate owns the Alert Sink capability: the reconciliation core only
//! ever sees [`AlertSink::send_alert`], while the concrete transports live
//! behind [`AlertChannel`].
//!
//! # Usage
//!
//! ```no_run
//! use notify::{AlertEvent, AlertManagerConfig, AlertSink, Notifier};
//!
//! # async fn run() -> Result<(), notify::ChannelError> {
//! let config = AlertManagerConfig::from_value(&serde_json::json!({
//!     "slack_webhook_url": "https://hooks.slack.com/services/T000/B000/XXX"
//! }))?;
//! let notifier = Notifier::from_config(&config)?;
//!
//! notifier
//!     .send_alert(AlertEvent::error("Guardian", "etl", "will restart"))
//!     .await;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! The notifier is built from the `alert_manager` block of the guardian
//! config document:
//!
//! - `slack_webhook_url`: Slack incoming webhook (falls back to `SLACK_WEBHOOK_URL`)
//! - `webhook_url`: generic JSON webhook receiving the raw [`AlertEvent`]
//! - `disabled`: drop every alert after logging it
//! - `timeout_secs`: per-delivery HTTP timeout (default 10)

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod channels;
pub mod error;
pub mod events;

pub use channels::slack::SlackChannel;
pub use channels::webhook::WebhookChannel;
pub use channels::AlertChannel;
pub use error::ChannelError;
pub use events::{AlertEvent, Severity};

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Default per-delivery HTTP timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Capability for raising alerts.
///
/// Delivery is fire-and-forget: implementations log their own failures and
/// never hand them back to the caller.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send_alert(&self, event: AlertEvent);
}

/// Typed view of the `alert_manager` config block.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlertManagerConfig {
    pub disabled: bool,
    pub slack_webhook_url: Option<String>,
    pub webhook_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for AlertManagerConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            slack_webhook_url: None,
            webhook_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AlertManagerConfig {
    /// Parse the opaque `alert_manager` block. `null` yields the defaults.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, ChannelError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(Self::deserialize(value)?)
    }
}

/// Central alert dispatcher.
///
/// The `Notifier` manages multiple channels and delivers each alert to all
/// enabled channels.
pub struct Notifier {
    channels: Vec<Arc<dyn AlertChannel>>,
    disabled: bool,
}

impl Notifier {
    /// Build a notifier from the `alert_manager` config block.
    pub fn from_config(config: &AlertManagerConfig) -> Result<Self, ChannelError> {
        if config.disabled {
            info!("Alert delivery disabled via alert_manager.disabled");
            return Ok(Self::disabled());
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let candidates: Vec<Arc<dyn AlertChannel>> = vec![
            Arc::new(SlackChannel::new(
                config.slack_webhook_url.clone(),
                client.clone(),
            )),
            Arc::new(WebhookChannel::new(config.webhook_url.clone(), client)),
        ];

        let channels: Vec<Arc<dyn AlertChannel>> =
            candidates.into_iter().filter(|c| c.enabled()).collect();

        if channels.is_empty() {
            warn!("No alert channels configured, alerts will only be logged");
        } else {
            info!(channel_count = channels.len(), "Alert delivery initialized");
        }

        Ok(Self {
            channels,
            disabled: false,
        })
    }

    /// Create a notifier with specific channels.
    #[must_use]
    pub fn with_channels(channels: Vec<Arc<dyn AlertChannel>>) -> Self {
        Self {
            channels,
            disabled: false,
        }
    }

    /// Create a disabled notifier (alerts are logged, never delivered).
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            channels: vec![],
            disabled: true,
        }
    }

    /// Check if any alert channels are enabled.
    #[must_use]
    pub fn has_channels(&self) -> bool {
        !self.disabled && !self.channels.is_empty()
    }

    /// Get the number of enabled channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        if self.disabled {
            0
        } else {
            self.channels.len()
        }
    }

    /// Deliver an alert to every channel and collect per-channel results.
    pub async fn notify_and_wait(
        &self,
        event: &AlertEvent,
    ) -> Vec<(&'static str, Result<(), ChannelError>)> {
        if !self.has_channels() {
            return vec![];
        }

        let mut results = vec![];

        for channel in &self.channels {
            if !channel.enabled() {
                debug!(channel = channel.name(), "Channel disabled, skipping");
                continue;
            }
            results.push((channel.name(), channel.send(event).await));
        }

        results
    }
}

#[async_trait]
impl AlertSink for Notifier {
    async fn send_alert(&self, event: AlertEvent) {
        warn!(
            severity = %event.severity,
            subject = %event.subject,
            object = %event.object,
            "{}",
            event.content
        );

        for (channel, result) in self.notify_and_wait(&event).await {
            match result {
                Ok(()) => debug!(channel, "Alert delivered"),
                Err(e) => error!(channel, error = %e, "Failed to deliver alert"),
            }
        }
    }
}
