//! `state` checker: flags instances stuck outside the expected YARN state,
//! e.g. an app that has been `ACCEPTED` but never got containers.

use anyhow::Context as _;
use async_trait::async_trait;
use notify::{AlertEvent, AlertSink, Severity};
use serde::Deserialize;

use super::{CheckContext, Checker};
use crate::yarn::AppInstance;

fn default_expected_state() -> String {
    "RUNNING".to_string()
}

#[derive(Debug, Deserialize)]
struct StateOptions {
    #[serde(default = "default_expected_state")]
    expected_state: String,
}

pub struct StateChecker;

#[async_trait]
impl Checker for StateChecker {
    fn name(&self) -> &'static str {
        "state"
    }

    async fn check(
        &self,
        instances: &[AppInstance],
        ctx: &CheckContext<'_>,
        alerts: &dyn AlertSink,
    ) -> anyhow::Result<()> {
        let options: StateOptions = ctx
            .spec
            .check_options
            .clone()
            .map(serde_json::from_value)
            .transpose()
            .context("invalid check_options for state checker")?
            .unwrap_or_else(|| StateOptions {
                expected_state: default_expected_state(),
            });

        for instance in instances {
            if instance.state.eq_ignore_ascii_case(&options.expected_state) {
                continue;
            }
            alerts
                .send_alert(AlertEvent::new(
                    Severity::Warning,
                    ctx.node_name,
                    &ctx.spec.name,
                    format!(
                        "App instance {} is in state {}, expected {}.",
                        instance.id, instance.state, options.expected_state
                    ),
                ))
                .await;
        }

        Ok(())
    }
}
