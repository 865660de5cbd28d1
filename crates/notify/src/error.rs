//! Error types for alert delivery.

use thiserror::Error;

/// Errors that can occur when delivering an alert.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Channel is not configured
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    /// The `alert_manager` block could not be parsed
    #[error("Invalid alert_manager config: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    /// The receiving service rejected the alert
    #[error("{channel} returned {status}: {body}")]
    Rejected {
        channel: &'static str,
        status: u16,
        body: String,
    },
}
