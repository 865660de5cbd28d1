//! Alert event types emitted by the guardian.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity levels for alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Informational - normal operations
    Info,
    /// Warning - something needs attention
    Warning,
    /// Error - automated remediation is involved or has failed
    Error,
}

impl Severity {
    /// Get the Slack attachment color for this severity.
    #[must_use]
    pub const fn color(&self) -> &'static str {
        match self {
            Self::Info => "#3498db",    // Blue
            Self::Warning => "#f39c12", // Orange
            Self::Error => "#e74c3c",   // Red
        }
    }

    /// Get the wire name for this severity.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single alert: who raised it, what it concerns, and what happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub severity: Severity,
    /// Raising component, e.g. `Guardian` or a node name.
    pub subject: String,
    /// The thing the alert is about, e.g. an application name or `Yarn RM`.
    pub object: String,
    pub content: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl AlertEvent {
    pub fn new(
        severity: Severity,
        subject: impl Into<String>,
        object: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            subject: subject.into(),
            object: object.into(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Shorthand for an `ERROR` alert.
    pub fn error(
        subject: impl Into<String>,
        object: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Error, subject, object, content)
    }

    /// Get a short title for this alert.
    #[must_use]
    pub fn title(&self) -> String {
        format!("[{}] {}: {}", self.severity, self.subject, self.object)
    }
}
