//! Read-only HTTP view of the config document.
//!
//! The server never talks to the scheduler; each request reads the document
//! from disk, exactly as the next cycle will.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::GuardianConfig;

/// Server state: only the location of the document.
#[derive(Debug, Clone)]
pub struct InspectState {
    pub config_path: PathBuf,
}

/// Build the inspection router.
pub fn build_router(config_path: PathBuf) -> Router {
    Router::new()
        .route("/config", get(config_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(InspectState { config_path }))
}

/// Serve the inspection router until the listener fails.
pub async fn serve(listener: TcpListener, config_path: PathBuf) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Config inspection server listening");
    }
    axum::serve(listener, build_router(config_path)).await
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn config_handler(State(state): State<Arc<InspectState>>) -> impl IntoResponse {
    match GuardianConfig::load(&state.config_path).await {
        Ok(config) => (StatusCode::OK, Json(config)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to load config for inspection");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}
