//! Error taxonomy for the reconciliation core.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to find an active resource manager.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiscoveryError {
    /// Every candidate timed out, refused, or answered with a non-success status.
    #[error("no available yarn resource manager")]
    NoAvailableResourceManager,

    /// At least one candidate answered but none reported `haState: active`.
    #[error("no active yarn resource manager")]
    NoActiveResourceManager,
}

/// Failure to read the application list from the active resource manager.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The body had no keys at all, or was not a JSON object.
    #[error("cannot get yarn application stats: empty or malformed payload")]
    EmptyOrMalformedPayload,

    #[error("cluster apps request failed: {0}")]
    Http(String),
}

/// Anything that can go wrong while talking to YARN.
#[derive(Debug, Error)]
pub enum YarnError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Failure of one start-command attempt.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("invalid start command `{command}`: {reason}")]
    InvalidCommand { command: String, reason: String },

    #[error("start command wrote to stderr: {stderr}")]
    NonEmptyErrorOutput { stderr: String },
}

/// Failure to load the desired-state document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file is not a valid document: {0}")]
    InvalidDocument(#[from] serde_json::Error),

    #[error("config is missing required field `{0}`")]
    MissingRequiredField(&'static str),

    #[error("config field `{field}` {reason}")]
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
}
