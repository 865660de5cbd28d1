//! The reconciliation cycle.
//!
//! One call to [`Reconciler::reconcile`] runs discover -> fetch -> diff -> act
//! for the whole desired list:
//!
//! 1. Locate the active RM and fetch live apps, up to [`MAX_FETCH_ATTEMPTS`]
//!    times. If that never works, alert once and stop the cycle without
//!    judging any application.
//! 2. Compare each desired app with the snapshot. Too few instances means
//!    restart, too many means alert, an exact match runs the configured
//!    checker.
//! 3. Hand the restart list to the [`Remediator`].

use notify::{AlertEvent, AlertSink};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::checkers::{CheckContext, CheckerRegistry};
use crate::config::AppSpec;
use crate::remediate::{AppRemediation, Remediator, ALERT_SUBJECT};
use crate::yarn::{self, ClusterSnapshot, Endpoint, ResourceManagerApi};

pub const MAX_FETCH_ATTEMPTS: u32 = 3;

const RM_OBJECT: &str = "Yarn RM";
const RM_UNREACHABLE: &str = "Failed to send request to yarn resource manager.";

/// How a cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Every fetch attempt failed; no app was evaluated.
    ResourceManagerUnreachable,
    /// Every desired app was evaluated.
    Reconciled,
}

/// Decisions taken while diffing desired against actual state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Apps with fewer instances than expected, in desired order.
    pub to_remediate: Vec<String>,
    /// Apps with more instances than expected.
    pub over_provisioned: Vec<String>,
    /// Number of checker invocations, failed ones included.
    pub checks_run: usize,
}

/// Summary of one reconciliation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    pub active_rm: Option<Endpoint>,
    pub evaluation: Evaluation,
    pub remediations: Vec<AppRemediation>,
}

impl CycleReport {
    fn unreachable() -> Self {
        Self {
            outcome: CycleOutcome::ResourceManagerUnreachable,
            active_rm: None,
            evaluation: Evaluation::default(),
            remediations: Vec::new(),
        }
    }
}

pub struct Reconciler {
    api: Arc<dyn ResourceManagerApi>,
    checkers: CheckerRegistry,
    alerts: Arc<dyn AlertSink>,
    remediator: Remediator,
}

impl Reconciler {
    pub fn new(
        api: Arc<dyn ResourceManagerApi>,
        checkers: CheckerRegistry,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        Self {
            api,
            checkers,
            remediator: Remediator::new(Arc::clone(&alerts)),
            alerts,
        }
    }

    /// Run one full cycle.
    pub async fn reconcile(
        &self,
        node_name: &str,
        desired: &[AppSpec],
        candidates: &[String],
    ) -> CycleReport {
        info!("Starting to check applications");

        let Some((snapshot, active_rm)) = self.fetch_with_retry(candidates).await else {
            error!(
                hosts = %candidates.join(", "),
                "Failed to send request to yarn resource manager"
            );
            self.alerts
                .send_alert(AlertEvent::error(
                    ALERT_SUBJECT,
                    RM_OBJECT,
                    format!("{RM_UNREACHABLE} Hosts: {}", candidates.join(", ")),
                ))
                .await;
            return CycleReport::unreachable();
        };

        let evaluation = self
            .evaluate(node_name, desired, &snapshot, &active_rm)
            .await;

        let remediations = if evaluation.to_remediate.is_empty() {
            info!("There is no application need to be started");
            Vec::new()
        } else {
            self.remediator
                .remediate(&evaluation.to_remediate, desired)
                .await
        };

        CycleReport {
            outcome: CycleOutcome::Reconciled,
            active_rm: Some(active_rm),
            evaluation,
            remediations,
        }
    }

    /// Locate + fetch with immediate retries.
    async fn fetch_with_retry(&self, candidates: &[String]) -> Option<(ClusterSnapshot, Endpoint)> {
        for attempt in 1..=MAX_FETCH_ATTEMPTS {
            match yarn::request_cluster_state(self.api.as_ref(), candidates).await {
                Ok(state) => return Some(state),
                Err(e) => {
                    warn!(
                        attempt,
                        error = %e,
                        "Failed to send request to yarn resource manager, retry"
                    );
                }
            }
        }
        None
    }

    /// Diff desired apps against the snapshot and run checkers on exact matches.
    ///
    /// Over-provisioning and checker findings are alerted here; restarts are
    /// only collected.
    pub async fn evaluate(
        &self,
        node_name: &str,
        desired: &[AppSpec],
        snapshot: &ClusterSnapshot,
        active_rm: &Endpoint,
    ) -> Evaluation {
        let mut evaluation = Evaluation::default();

        for spec in desired {
            let instances = snapshot.instances(&spec.name);
            let actual = instances.len();
            let expected = spec.expected_count as usize;

            if actual < expected {
                debug!(app = %spec.name, expected, actual, "App is under-provisioned");
                evaluation.to_remediate.push(spec.name.clone());
                continue;
            }

            if actual > expected {
                self.alerts
                    .send_alert(AlertEvent::error(
                        ALERT_SUBJECT,
                        &spec.name,
                        format!(
                            "Unexpected running app number, expected/actual: {expected}/{actual}"
                        ),
                    ))
                    .await;
                evaluation.over_provisioned.push(spec.name.clone());
                continue;
            }

            let Some((check_type, _)) = spec.checker() else {
                continue;
            };

            let Some(checker) = self.checkers.get(check_type) else {
                warn!(app = %spec.name, check_type, "No checker registered for check_type");
                continue;
            };

            let ctx = CheckContext {
                spec,
                active_rm,
                node_name,
            };
            evaluation.checks_run += 1;
            if let Err(e) = checker.check(instances, &ctx, self.alerts.as_ref()).await {
                error!(app = %spec.name, check_type, error = %e, "Checker failed");
            }
        }

        evaluation
    }
}
