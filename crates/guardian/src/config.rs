//! Desired-state document loading.
//!
//! The guardian config is a JSON document re-read from disk on every cycle.
//! All defaulting happens here, once, so the reconciliation path only ever
//! sees fully resolved [`AppSpec`]s.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

use crate::error::ConfigError;

pub const DEFAULT_NODE_NAME: &str = "my_guardian";
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_YARN_TIMEOUT_SECS: u64 = 10;

/// Fully resolved guardian configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuardianConfig {
    /// Identity of this guardian, handed to checkers.
    pub node_name: String,
    /// Seconds to sleep between reconciliation cycles.
    pub check_interval: u64,
    /// Port of the config inspection server.
    pub port: u16,
    pub yarn: YarnConfig,
    /// Active applications only, in document order.
    pub apps: Vec<AppSpec>,
    /// Opaque block handed to the alert sink's constructor.
    pub alert_manager: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YarnConfig {
    /// Resource manager candidates as `host:port`, probed in this order.
    pub api_hosts: Vec<String>,
    /// Per-request timeout for probes and fetches.
    pub timeout_secs: u64,
}

/// One desired application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppSpec {
    #[serde(rename = "app_name")]
    pub name: String,
    #[serde(rename = "app_num")]
    pub expected_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cmd: Option<String>,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_options: Option<Value>,
}

impl AppSpec {
    /// A spec with the document defaults (`app_num: 1`, `active: true`).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expected_count: 1,
            start_cmd: None,
            active: true,
            check_type: None,
            check_options: None,
        }
    }

    #[must_use]
    pub fn with_expected_count(mut self, count: u32) -> Self {
        self.expected_count = count;
        self
    }

    #[must_use]
    pub fn with_start_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.start_cmd = Some(cmd.into());
        self
    }

    #[must_use]
    pub fn with_checker(mut self, check_type: impl Into<String>, options: Value) -> Self {
        self.check_type = Some(check_type.into());
        self.check_options = Some(options);
        self
    }

    /// The checker tag and options, only when both are configured.
    pub fn checker(&self) -> Option<(&str, &Value)> {
        match (&self.check_type, &self.check_options) {
            (Some(check_type), Some(options)) => Some((check_type.as_str(), options)),
            _ => None,
        }
    }
}

// =============================================================================
// On-disk shape
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawConfig {
    node_name: Option<String>,
    check_interval: Option<u64>,
    port: Option<u16>,
    yarn: Option<RawYarn>,
    apps: Option<Vec<RawApp>>,
    #[serde(default)]
    alert_manager: Value,
}

#[derive(Debug, Deserialize)]
struct RawYarn {
    api_hosts: Option<Vec<String>>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawApp {
    app_name: Option<String>,
    app_num: Option<u32>,
    start_cmd: Option<String>,
    active: Option<bool>,
    check_type: Option<String>,
    check_options: Option<Value>,
}

impl TryFrom<RawApp> for AppSpec {
    type Error = ConfigError;

    fn try_from(raw: RawApp) -> Result<Self, Self::Error> {
        Ok(Self {
            name: raw
                .app_name
                .ok_or(ConfigError::MissingRequiredField("apps[].app_name"))?,
            expected_count: raw.app_num.unwrap_or(1),
            start_cmd: raw.start_cmd,
            active: raw.active.unwrap_or(true),
            check_type: raw.check_type,
            check_options: raw.check_options,
        })
    }
}

impl GuardianConfig {
    /// Read and resolve the document at `path`.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let document = load_document(path).await?;
        Self::from_value(document)
    }

    /// Resolve an already parsed document.
    pub fn from_value(document: Value) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_value(document)?;

        let yarn = raw.yarn.ok_or(ConfigError::MissingRequiredField("yarn"))?;
        let api_hosts = yarn
            .api_hosts
            .ok_or(ConfigError::MissingRequiredField("yarn.api_hosts"))?;
        let raw_apps = raw.apps.ok_or(ConfigError::MissingRequiredField("apps"))?;

        let mut apps = Vec::with_capacity(raw_apps.len());
        for raw_app in raw_apps {
            let spec = AppSpec::try_from(raw_app)?;
            if spec.active {
                apps.push(spec);
            } else {
                debug!(app = %spec.name, "Skipping inactive app");
            }
        }

        let check_interval = positive(
            "check_interval",
            raw.check_interval.unwrap_or(DEFAULT_CHECK_INTERVAL_SECS),
        )?;
        let timeout_secs = positive(
            "yarn.timeout_secs",
            yarn.timeout_secs.unwrap_or(DEFAULT_YARN_TIMEOUT_SECS),
        )?;

        Ok(Self {
            node_name: raw
                .node_name
                .unwrap_or_else(|| DEFAULT_NODE_NAME.to_string()),
            check_interval,
            port: raw.port.unwrap_or(DEFAULT_PORT),
            yarn: YarnConfig {
                api_hosts,
                timeout_secs,
            },
            apps,
            alert_manager: raw.alert_manager,
        })
    }

    /// Parse a document from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Self::from_value(serde_json::from_str(json)?)
    }
}

fn positive(field: &'static str, secs: u64) -> Result<u64, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            field,
            reason: "must be at least 1 second",
        });
    }
    Ok(secs)
}

/// Read the raw document without resolving defaults.
pub async fn load_document(path: &Path) -> Result<Value, ConfigError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(serde_json::from_str(&content)?)
}
