//! Alert channel implementations.

pub mod slack;
pub mod webhook;

use async_trait::async_trait;

use crate::error::ChannelError;
use crate::events::AlertEvent;

/// Trait for alert transports (Slack, plain webhooks, etc.).
#[async_trait]
pub trait AlertChannel: Send + Sync {
    /// Get the name of this channel.
    fn name(&self) -> &'static str;

    /// Check if this channel is enabled/configured.
    fn enabled(&self) -> bool;

    /// Deliver an alert through this channel.
    async fn send(&self, event: &AlertEvent) -> Result<(), ChannelError>;
}
