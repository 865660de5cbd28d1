//! `guardian inspect`: draft config entries for running apps nobody guards yet.

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use tracing::info;

use crate::config::GuardianConfig;
use crate::yarn::{self, ResourceManagerApi};

/// The only filter `inspect` understands.
pub const APP_NAME_FILTER: &str = "app_name";

/// Placeholder written for start commands the operator still has to fill in.
pub const START_CMD_PLACEHOLDER: &str = "TODO";

/// Validate the filter name and compile the pattern.
pub fn parse_filter(filter: &str, pattern: &str) -> Result<Regex> {
    if filter != APP_NAME_FILTER {
        bail!("Invalid filter `{filter}`, only \"{APP_NAME_FILTER}\" is supported");
    }
    Regex::new(pattern).with_context(|| format!("Invalid regular expression: {pattern}"))
}

/// Append an entry to `document.apps` for every running app whose name
/// matches `pattern` and is not configured yet (inactive entries count as
/// configured). The rest of the document is returned untouched.
pub async fn inspect(
    mut document: Value,
    api: &dyn ResourceManagerApi,
    pattern: &Regex,
) -> Result<Value> {
    info!("Starting to inspect applications");

    let config = GuardianConfig::from_value(document.clone())?;
    let (snapshot, active_rm) = yarn::request_cluster_state(api, &config.yarn.api_hosts)
        .await
        .context("Failed to query yarn resource manager")?;

    if snapshot.is_empty() {
        info!(rm = %active_rm, "There's no app in yarn");
        return Ok(document);
    }

    let apps = document
        .get_mut("apps")
        .and_then(Value::as_array_mut)
        .context("config field `apps` must be an array")?;

    let configured: BTreeSet<String> = apps
        .iter()
        .filter_map(|a| a.get("app_name").and_then(Value::as_str))
        .map(str::to_string)
        .collect();

    let missing: BTreeSet<&str> = snapshot
        .names()
        .filter(|name| pattern.is_match(name))
        .filter(|name| !configured.contains(*name))
        .collect();

    for app_name in missing {
        apps.push(json!({
            "app_name": app_name,
            "start_cmd": START_CMD_PLACEHOLDER,
            "app_num": 1,
        }));
    }

    info!("Finished inspecting applications, please check config");
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::yarn::{AppInstance, ClusterSnapshot, Endpoint, ResourceManagerHealth};
    use async_trait::async_trait;

    struct Cluster(Option<ClusterSnapshot>);

    #[async_trait]
    impl ResourceManagerApi for Cluster {
        async fn probe(&self, _host: &str) -> ResourceManagerHealth {
            if self.0.is_some() {
                ResourceManagerHealth::Active
            } else {
                ResourceManagerHealth::Unreachable
            }
        }

        async fn fetch(&self, _endpoint: &Endpoint) -> Result<ClusterSnapshot, FetchError> {
            Ok(self.0.clone().unwrap_or_default())
        }
    }

    fn document() -> Value {
        json!({
            "node_name": "edge-1",
            "yarn": { "api_hosts": ["rm1:8088"] },
            "apps": [
                { "app_name": "waterdrop_etl", "start_cmd": "run-etl" },
                { "app_name": "waterdrop_old", "active": false }
            ],
            "alert_manager": { "webhook_url": "http://alerts" }
        })
    }

    #[test]
    fn test_only_app_name_filter_is_supported() {
        assert!(parse_filter("app_name", "^waterdrop_").is_ok());
        assert!(parse_filter("queue", "default").is_err());
        assert!(parse_filter("app_name", "(").is_err());
    }

    #[tokio::test]
    async fn test_appends_unconfigured_matching_apps() {
        let cluster = Cluster(Some(ClusterSnapshot::from_instances(vec![
            AppInstance::new("waterdrop_etl", "application_1", "RUNNING"),
            AppInstance::new("waterdrop_old", "application_2", "RUNNING"),
            AppInstance::new("waterdrop_stream", "application_3", "RUNNING"),
            AppInstance::new("waterdrop_stream", "application_4", "RUNNING"),
            AppInstance::new("other", "application_5", "RUNNING"),
        ])));
        let pattern = parse_filter("app_name", "waterdrop_").unwrap();

        let result = inspect(document(), &cluster, &pattern).await.unwrap();

        let apps = result["apps"].as_array().unwrap();
        assert_eq!(apps.len(), 3);
        assert_eq!(
            apps[2],
            json!({ "app_name": "waterdrop_stream", "start_cmd": "TODO", "app_num": 1 })
        );
        assert_eq!(result["alert_manager"], document()["alert_manager"]);
    }

    #[tokio::test]
    async fn test_empty_cluster_leaves_document_alone() {
        let cluster = Cluster(Some(ClusterSnapshot::default()));
        let pattern = parse_filter("app_name", ".*").unwrap();

        let result = inspect(document(), &cluster, &pattern).await.unwrap();
        assert_eq!(result, document());
    }

    #[tokio::test]
    async fn test_unreachable_rm_is_an_error() {
        let pattern = parse_filter("app_name", ".*").unwrap();
        assert!(inspect(document(), &Cluster(None), &pattern).await.is_err());
    }
}
