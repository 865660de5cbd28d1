//! Shared fixtures: a mock YARN resource manager and a recording alert sink.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use notify::{AlertEvent, AlertSink};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

// =============================================================================
// Mock Resource Manager
// =============================================================================

/// Canned responses and hit counters for one mock RM.
pub struct MockRmState {
    ha_state: String,
    apps_status: StatusCode,
    apps_body: Value,
    pub info_hits: AtomicUsize,
    pub apps_hits: AtomicUsize,
}

async fn cluster_info(State(state): State<Arc<MockRmState>>) -> impl IntoResponse {
    state.info_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "clusterInfo": { "haState": state.ha_state } }))
}

async fn cluster_apps(State(state): State<Arc<MockRmState>>) -> impl IntoResponse {
    state.apps_hits.fetch_add(1, Ordering::SeqCst);
    (state.apps_status, Json(state.apps_body.clone()))
}

pub struct MockRm {
    pub host: String,
    pub state: Arc<MockRmState>,
}

impl MockRm {
    /// Start a mock RM on a random port.
    pub async fn start(ha_state: &str, apps_status: StatusCode, apps_body: Value) -> Self {
        let state = Arc::new(MockRmState {
            ha_state: ha_state.to_string(),
            apps_status,
            apps_body,
            info_hits: AtomicUsize::new(0),
            apps_hits: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/ws/v1/cluster/info", get(cluster_info))
            .route("/ws/v1/cluster/apps", get(cluster_apps))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            host: addr.to_string(),
            state,
        }
    }

    /// An active RM serving the given running apps as `(name, id)` pairs.
    pub async fn active_with(apps: &[(&str, &str)]) -> Self {
        let body = if apps.is_empty() {
            json!({ "apps": null })
        } else {
            let list: Vec<Value> = apps
                .iter()
                .map(|(name, id)| json!({ "name": name, "id": id, "state": "RUNNING" }))
                .collect();
            json!({ "apps": { "app": list } })
        };
        Self::start("ACTIVE", StatusCode::OK, body).await
    }

    pub async fn standby() -> Self {
        Self::start("STANDBY", StatusCode::OK, json!({ "apps": null })).await
    }

    pub fn info_hits(&self) -> usize {
        self.state.info_hits.load(Ordering::SeqCst)
    }

    pub fn apps_hits(&self) -> usize {
        self.state.apps_hits.load(Ordering::SeqCst)
    }
}

/// An address nothing listens on.
pub async fn closed_host() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr.to_string()
}

// =============================================================================
// Alerts
// =============================================================================

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<AlertEvent>>,
}

impl RecordingSink {
    pub fn contents(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.content.clone())
            .collect()
    }
}

#[async_trait]
impl AlertSink for RecordingSink {
    async fn send_alert(&self, event: AlertEvent) {
        self.events.lock().unwrap().push(event);
    }
}

// =============================================================================
// Files
// =============================================================================

pub fn write_config(dir: &Path, document: &Value) -> PathBuf {
    let path = dir.join("config.json");
    std::fs::write(&path, serde_json::to_string_pretty(document).unwrap()).unwrap();
    path
}

/// A start command that records each launch in `<name>.runs` and then runs `body`.
pub fn start_script(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    let runs = dir.join(format!("{name}.runs"));
    std::fs::write(&path, format!("echo run >> {}\n{body}\n", runs.display())).unwrap();
    format!("sh {}", path.display())
}

pub fn launches(dir: &Path, name: &str) -> usize {
    std::fs::read_to_string(dir.join(format!("{name}.runs")))
        .map(|s| s.lines().count())
        .unwrap_or(0)
}
