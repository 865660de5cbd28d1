//! Guardian: keeps YARN applications at their desired instance count.
//!
//! Each cycle the guardian reloads its config document, finds the active
//! resource manager of the HA pair, compares the configured applications
//! with what is accepted or running, restarts what is missing and alerts on
//! everything it cannot fix.
//!
//! # Modules
//! - [`config`]: the desired-state document and its defaults
//! - [`yarn`]: RM discovery and cluster snapshots
//! - [`checkers`]: per-application-type deeper checks
//! - [`reconcile`]: the diff-and-decide cycle
//! - [`remediate`]: bounded-retry restarts with escalation
//! - [`scheduler`]: the periodic loop
//! - [`server`]: read-only config inspection over HTTP
//! - [`inspect`]: draft config entries for unguarded apps
//! - [`logging`]: the rotating log file

pub mod checkers;
pub mod config;
pub mod error;
pub mod inspect;
pub mod logging;
pub mod reconcile;
pub mod remediate;
pub mod scheduler;
pub mod server;
pub mod yarn;

#[cfg(test)]
mod testutil;

pub use config::{AppSpec, GuardianConfig};
pub use error::{ConfigError, DiscoveryError, FetchError, SpawnError, YarnError};
pub use reconcile::{CycleOutcome, CycleReport, Reconciler};
pub use scheduler::Scheduler;
