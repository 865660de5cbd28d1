//! Restarting under-provisioned applications.
//!
//! Each application gets up to [`MAX_START_ATTEMPTS`] launches of its
//! `start_cmd`, back to back. A launch only counts as successful when the
//! command wrote nothing to stderr, whatever its exit code.

use notify::{AlertEvent, AlertSink};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{error, info, warn};

use crate::config::AppSpec;
use crate::error::SpawnError;

pub const MAX_START_ATTEMPTS: u32 = 3;

pub(crate) const ALERT_SUBJECT: &str = "Guardian";
const WILL_RESTART: &str =
    "App is not running or less than expected number of running instance, will restart.";
const START_FAILED: &str = "Failed to start yarn app after 3 times.";

/// How remediation of one application ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemediationOutcome {
    /// A launch succeeded on attempt number `attempts`.
    Started { attempts: u32 },
    /// Every attempt failed and an escalation alert was sent.
    Failed { attempts: u32 },
    /// No spec or no start command; nothing was launched.
    MissingStartCommand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppRemediation {
    pub app: String,
    pub outcome: RemediationOutcome,
}

pub struct Remediator {
    alerts: Arc<dyn AlertSink>,
}

impl Remediator {
    pub fn new(alerts: Arc<dyn AlertSink>) -> Self {
        Self { alerts }
    }

    /// Restart every app in `app_names`, resolving start commands from `specs`.
    ///
    /// One application's failure never stops the others.
    pub async fn remediate(&self, app_names: &[String], specs: &[AppSpec]) -> Vec<AppRemediation> {
        let mut results = Vec::with_capacity(app_names.len());

        for app_name in app_names {
            let outcome = self.remediate_one(app_name, specs).await;
            results.push(AppRemediation {
                app: app_name.clone(),
                outcome,
            });
        }

        info!("Finished checking applications");
        results
    }

    async fn remediate_one(&self, app_name: &str, specs: &[AppSpec]) -> RemediationOutcome {
        let start_cmd = specs
            .iter()
            .find(|s| s.name == app_name)
            .and_then(|s| s.start_cmd.as_deref())
            .filter(|cmd| !cmd.trim().is_empty());

        let Some(start_cmd) = start_cmd else {
            error!(app = %app_name, "No start_cmd configured, cannot restart app");
            return RemediationOutcome::MissingStartCommand;
        };

        self.alerts
            .send_alert(AlertEvent::error(ALERT_SUBJECT, app_name, WILL_RESTART))
            .await;

        for attempt in 1..=MAX_START_ATTEMPTS {
            match run_start_command(start_cmd).await {
                Ok(()) => {
                    info!(app = %app_name, attempt, "App started");
                    return RemediationOutcome::Started { attempts: attempt };
                }
                Err(e) => {
                    warn!(app = %app_name, attempt, error = %e, "Start attempt failed");
                }
            }
        }

        info!(app = %app_name, "Alerting after failed {} times", MAX_START_ATTEMPTS);
        self.alerts
            .send_alert(AlertEvent::error(ALERT_SUBJECT, app_name, START_FAILED))
            .await;

        RemediationOutcome::Failed {
            attempts: MAX_START_ATTEMPTS,
        }
    }
}

/// Launch `start_cmd` once and wait for it to finish.
///
/// The command is split on whitespace into program and arguments; no shell
/// is involved. Stdout goes to the guardian's own stdout and only stderr is
/// captured. The wait is unbounded.
pub async fn run_start_command(start_cmd: &str) -> Result<(), SpawnError> {
    let mut parts = start_cmd.split_whitespace();
    let program = parts.next().ok_or_else(|| SpawnError::InvalidCommand {
        command: start_cmd.to_string(),
        reason: "empty command".to_string(),
    })?;

    let output = Command::new(program)
        .args(parts)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| {
            error!(command = %start_cmd, "Invalid start command");
            SpawnError::InvalidCommand {
                command: start_cmd.to_string(),
                reason: e.to_string(),
            }
        })?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
        return Err(SpawnError::NonEmptyErrorOutput {
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(())
}
