//! Periodic driver for reconciliation cycles.
//!
//! Every cycle re-reads the config document, so edits land on the next
//! cycle without a restart. Nothing is cached between cycles.

use notify::AlertSink;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::checkers::CheckerRegistry;
use crate::config::{GuardianConfig, DEFAULT_CHECK_INTERVAL_SECS};
use crate::error::ConfigError;
use crate::reconcile::{CycleReport, Reconciler};
use crate::yarn::YarnClient;

pub struct Scheduler {
    config_path: PathBuf,
    http: reqwest::Client,
    checkers: CheckerRegistry,
    alerts: Arc<dyn AlertSink>,
}

impl Scheduler {
    pub fn new(
        config_path: impl Into<PathBuf>,
        http: reqwest::Client,
        checkers: CheckerRegistry,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        Self {
            config_path: config_path.into(),
            http,
            checkers,
            alerts,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Reload the config and reconcile once.
    ///
    /// Returns the report together with the interval to sleep afterwards.
    pub async fn run_cycle(&self) -> Result<(CycleReport, Duration), ConfigError> {
        let config = GuardianConfig::load(&self.config_path).await?;

        let api = Arc::new(YarnClient::new(
            self.http.clone(),
            Duration::from_secs(config.yarn.timeout_secs),
        ));
        let reconciler = Reconciler::new(api, self.checkers.clone(), Arc::clone(&self.alerts));

        let report = reconciler
            .reconcile(&config.node_name, &config.apps, &config.yarn.api_hosts)
            .await;

        Ok((report, Duration::from_secs(config.check_interval)))
    }

    /// Run cycles forever, one at a time.
    ///
    /// A config that fails to load skips the cycle; the previous interval is
    /// kept until a good document shows up again.
    pub async fn run(&self) {
        info!(config = %self.config_path.display(), "Starting to check applications");

        let mut interval = Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS);

        loop {
            match self.run_cycle().await {
                Ok((report, next)) => {
                    info!(
                        outcome = ?report.outcome,
                        restarted = report.remediations.len(),
                        checks = report.evaluation.checks_run,
                        "Cycle finished"
                    );
                    interval = next;
                }
                Err(e) => {
                    error!(error = %e, "Failed to reload config, skipping this cycle");
                }
            }

            tokio::time::sleep(interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::RecordingSink;

    fn scheduler(path: &Path) -> (Scheduler, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let scheduler = Scheduler::new(
            path,
            reqwest::Client::new(),
            CheckerRegistry::with_defaults(),
            sink.clone(),
        );
        (scheduler, sink)
    }

    #[tokio::test]
    async fn test_bad_config_fails_the_cycle_without_alerting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let (scheduler, sink) = scheduler(&path);

        let err = scheduler.run_cycle().await.unwrap_err();

        assert!(matches!(err, ConfigError::InvalidDocument(_)));
        assert!(sink.events().is_empty());
    }

    #[tokio::test]
    async fn test_missing_config_fails_the_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let (scheduler, _sink) = scheduler(&dir.path().join("missing.json"));

        assert!(matches!(
            scheduler.run_cycle().await,
            Err(ConfigError::Io { .. })
        ));
    }
}
