//! YARN resource manager discovery and cluster state fetching.
//!
//! Consumes two read-only endpoints of the RM REST API:
//! - `GET /ws/v1/cluster/info` to find the active RM of an HA pair
//! - `GET /ws/v1/cluster/apps?states=accepted,running` for the live apps

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{DiscoveryError, FetchError, YarnError};

/// Health of one resource manager candidate, computed per probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceManagerHealth {
    /// Timed out, refused, or answered with a non-success status.
    Unreachable,
    /// Answered, but is not the active RM.
    Standby,
    Active,
}

/// The resource manager picked for this cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub host: String,
}

impl Endpoint {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.host)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.host)
    }
}

/// One running or accepted application as reported by the RM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInstance {
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl AppInstance {
    pub fn new(name: impl Into<String>, id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            state: state.into(),
            tracking_url: None,
            queue: None,
            user: None,
        }
    }
}

/// Live applications grouped by name, in report order within each group.
///
/// Built once per cycle and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterSnapshot {
    apps: HashMap<String, Vec<AppInstance>>,
}

impl ClusterSnapshot {
    pub fn from_instances(instances: impl IntoIterator<Item = AppInstance>) -> Self {
        let mut apps: HashMap<String, Vec<AppInstance>> = HashMap::new();
        for instance in instances {
            apps.entry(instance.name.clone()).or_default().push(instance);
        }
        Self { apps }
    }

    /// Instances for `name`; empty when the app is not running at all.
    pub fn instances(&self, name: &str) -> &[AppInstance] {
        self.apps.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, name: &str) -> usize {
        self.instances(name).len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.apps.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

/// Seam between the reconciler and the RM REST API.
#[async_trait]
pub trait ResourceManagerApi: Send + Sync {
    /// Probe one candidate's HA state.
    async fn probe(&self, host: &str) -> ResourceManagerHealth;

    /// Fetch accepted and running applications from the active RM.
    async fn fetch(&self, endpoint: &Endpoint) -> Result<ClusterSnapshot, FetchError>;
}

/// Find the active resource manager.
///
/// Candidates are probed strictly in order and the first active one is
/// returned without probing the rest.
pub async fn locate(
    api: &dyn ResourceManagerApi,
    candidates: &[String],
) -> Result<Endpoint, DiscoveryError> {
    let mut reachable = candidates.len();

    for host in candidates {
        match api.probe(host).await {
            ResourceManagerHealth::Active => {
                debug!(host = %host, "Picked up yarn active resource manager");
                return Ok(Endpoint::new(host.clone()));
            }
            ResourceManagerHealth::Standby => {
                debug!(host = %host, "Resource manager is not active");
            }
            ResourceManagerHealth::Unreachable => {
                reachable -= 1;
            }
        }
    }

    if reachable == 0 {
        Err(DiscoveryError::NoAvailableResourceManager)
    } else {
        Err(DiscoveryError::NoActiveResourceManager)
    }
}

/// Locate the active RM and fetch its application list.
pub async fn request_cluster_state(
    api: &dyn ResourceManagerApi,
    candidates: &[String],
) -> Result<(ClusterSnapshot, Endpoint), YarnError> {
    let endpoint = locate(api, candidates).await?;
    let snapshot = api.fetch(&endpoint).await?;
    Ok((snapshot, endpoint))
}

// =============================================================================
// HTTP implementation
// =============================================================================

#[derive(Debug, Deserialize)]
struct ClusterInfoResponse {
    #[serde(rename = "clusterInfo")]
    cluster_info: ClusterInfo,
}

#[derive(Debug, Deserialize)]
struct ClusterInfo {
    #[serde(rename = "haState")]
    ha_state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClusterAppsResponse {
    apps: Option<AppList>,
}

#[derive(Debug, Deserialize)]
struct AppList {
    #[serde(default)]
    app: Option<Vec<AppInstance>>,
}

/// RM REST client with an explicit per-request timeout.
#[derive(Debug, Clone)]
pub struct YarnClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl YarnClient {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl ResourceManagerApi for YarnClient {
    async fn probe(&self, host: &str) -> ResourceManagerHealth {
        let url = Endpoint::new(host).url("/ws/v1/cluster/info");

        let response = match self.client.get(&url).timeout(self.timeout).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(host = %host, error = %e, "Resource manager unreachable");
                return ResourceManagerHealth::Unreachable;
            }
        };

        if !response.status().is_success() {
            warn!(host = %host, status = %response.status(), "Resource manager answered with error status");
            return ResourceManagerHealth::Unreachable;
        }

        match response.json::<ClusterInfoResponse>().await {
            Ok(info)
                if info
                    .cluster_info
                    .ha_state
                    .as_deref()
                    .is_some_and(|s| s.eq_ignore_ascii_case("active")) =>
            {
                ResourceManagerHealth::Active
            }
            Ok(_) => ResourceManagerHealth::Standby,
            Err(e) if e.is_timeout() || e.is_body() => {
                warn!(host = %host, error = %e, "Resource manager stalled while sending cluster info");
                ResourceManagerHealth::Unreachable
            }
            Err(e) => {
                warn!(host = %host, error = %e, "Unreadable cluster info, treating as not active");
                ResourceManagerHealth::Standby
            }
        }
    }

    async fn fetch(&self, endpoint: &Endpoint) -> Result<ClusterSnapshot, FetchError> {
        let url = endpoint.url("/ws/v1/cluster/apps?states=accepted,running");

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Http(format!(
                "{} returned {}",
                endpoint,
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|_| FetchError::EmptyOrMalformedPayload)?;

        parse_cluster_apps(body)
    }
}

/// Turn a `/ws/v1/cluster/apps` body into a snapshot.
///
/// `{}` and non-objects are malformed; `{"apps": null}` is an empty cluster.
pub fn parse_cluster_apps(body: Value) -> Result<ClusterSnapshot, FetchError> {
    match &body {
        Value::Object(map) if !map.is_empty() => {}
        _ => return Err(FetchError::EmptyOrMalformedPayload),
    }

    let parsed: ClusterAppsResponse =
        serde_json::from_value(body).map_err(|_| FetchError::EmptyOrMalformedPayload)?;

    let instances = match parsed.apps {
        Some(AppList { app: Some(apps) }) => apps,
        _ => {
            debug!("There is no app in yarn");
            Vec::new()
        }
    };

    Ok(ClusterSnapshot::from_instances(instances))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Scripted RM cluster that records which hosts were probed.
    struct ScriptedApi {
        health: HashMap<String, ResourceManagerHealth>,
        probed: Mutex<Vec<String>>,
    }

    impl ScriptedApi {
        fn new(health: &[(&str, ResourceManagerHealth)]) -> Self {
            Self {
                health: health
                    .iter()
                    .map(|(h, s)| ((*h).to_string(), *s))
                    .collect(),
                probed: Mutex::new(Vec::new()),
            }
        }

        fn probed(&self) -> Vec<String> {
            self.probed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ResourceManagerApi for ScriptedApi {
        async fn probe(&self, host: &str) -> ResourceManagerHealth {
            self.probed.lock().unwrap().push(host.to_string());
            self.health
                .get(host)
                .copied()
                .unwrap_or(ResourceManagerHealth::Unreachable)
        }

        async fn fetch(&self, _endpoint: &Endpoint) -> Result<ClusterSnapshot, FetchError> {
            Ok(ClusterSnapshot::default())
        }
    }

    fn hosts(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    use ResourceManagerHealth::{Active, Standby, Unreachable};

    #[tokio::test]
    async fn test_all_unreachable_is_no_available() {
        let api = ScriptedApi::new(&[("rm1", Unreachable), ("rm2", Unreachable)]);
        let err = locate(&api, &hosts(&["rm1", "rm2"])).await.unwrap_err();
        assert_eq!(err, DiscoveryError::NoAvailableResourceManager);
    }

    #[tokio::test]
    async fn test_empty_candidate_list_is_no_available() {
        let api = ScriptedApi::new(&[]);
        let err = locate(&api, &[]).await.unwrap_err();
        assert_eq!(err, DiscoveryError::NoAvailableResourceManager);
    }

    #[tokio::test]
    async fn test_responders_without_active_is_no_active() {
        let api = ScriptedApi::new(&[("rm1", Unreachable), ("rm2", Standby)]);
        let err = locate(&api, &hosts(&["rm1", "rm2"])).await.unwrap_err();
        assert_eq!(err, DiscoveryError::NoActiveResourceManager);
    }

    #[tokio::test]
    async fn test_third_candidate_wins_behind_any_non_active_prefix() {
        let prefixes = [
            (Standby, Standby),
            (Standby, Unreachable),
            (Unreachable, Standby),
            (Unreachable, Unreachable),
        ];

        for (first, second) in prefixes {
            let api = ScriptedApi::new(&[
                ("rm1", first),
                ("rm2", second),
                ("rm3", Active),
                ("rm4", Active),
            ]);
            let endpoint = locate(&api, &hosts(&["rm1", "rm2", "rm3", "rm4"]))
                .await
                .unwrap();
            assert_eq!(endpoint.host, "rm3");
            assert_eq!(api.probed(), hosts(&["rm1", "rm2", "rm3"]));
        }
    }

    #[tokio::test]
    async fn test_first_active_short_circuits() {
        let api = ScriptedApi::new(&[("rm1", Active), ("rm2", Active)]);
        let endpoint = locate(&api, &hosts(&["rm1", "rm2"])).await.unwrap();
        assert_eq!(endpoint.host, "rm1");
        assert_eq!(api.probed(), hosts(&["rm1"]));
    }

    #[test]
    fn test_null_apps_is_an_empty_cluster() {
        let snapshot = parse_cluster_apps(json!({ "apps": null })).unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.count("etl"), 0);
    }

    #[test]
    fn test_empty_or_non_object_payload_is_malformed() {
        assert!(matches!(
            parse_cluster_apps(json!({})),
            Err(FetchError::EmptyOrMalformedPayload)
        ));
        assert!(matches!(
            parse_cluster_apps(json!([])),
            Err(FetchError::EmptyOrMalformedPayload)
        ));
        assert!(matches!(
            parse_cluster_apps(json!({ "apps": { "app": "nope" } })),
            Err(FetchError::EmptyOrMalformedPayload)
        ));
    }

    #[test]
    fn test_instances_grouped_by_name_in_report_order() {
        let snapshot = parse_cluster_apps(json!({
            "apps": { "app": [
                { "name": "etl", "id": "application_1", "state": "RUNNING" },
                { "name": "stream", "id": "application_2", "state": "ACCEPTED" },
                { "name": "etl", "id": "application_3", "state": "RUNNING",
                  "trackingUrl": "http://rm1:8088/proxy/application_3/" },
            ]}
        }))
        .unwrap();

        let etl: Vec<_> = snapshot.instances("etl").iter().map(|a| a.id.as_str()).collect();
        assert_eq!(etl, vec!["application_1", "application_3"]);
        assert_eq!(
            snapshot.instances("etl")[1].tracking_url.as_deref(),
            Some("http://rm1:8088/proxy/application_3/")
        );
        assert_eq!(snapshot.count("stream"), 1);
        assert!(snapshot.instances("missing").is_empty());
    }

    /// Answer every connection with `response`, then keep the socket open.
    async fn raw_rm(response: &'static str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let (mut socket, _) = listener.accept().await.unwrap();
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    let _ = socket.write_all(response.as_bytes()).await;
                    tokio::time::sleep(Duration::from_secs(5)).await;
                });
            }
        });
        addr.to_string()
    }

    #[tokio::test]
    async fn test_body_stalled_after_headers_is_unreachable() {
        let host = raw_rm(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n{\"clu",
        )
        .await;
        let client = YarnClient::new(reqwest::Client::new(), Duration::from_millis(300));

        assert_eq!(client.probe(&host).await, Unreachable);
        let err = locate(&client, &[host]).await.unwrap_err();
        assert_eq!(err, DiscoveryError::NoAvailableResourceManager);
    }

    #[tokio::test]
    async fn test_unparseable_cluster_info_is_a_non_active_responder() {
        let host = raw_rm(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 8\r\n\r\nnot json",
        )
        .await;
        let client = YarnClient::new(reqwest::Client::new(), Duration::from_secs(2));

        let err = locate(&client, &[host]).await.unwrap_err();
        assert_eq!(err, DiscoveryError::NoActiveResourceManager);
    }
}
