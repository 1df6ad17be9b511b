//! Liveness and readiness endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Body of the liveness probe.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// "ok" whenever the process is up
    pub status: String,
}

/// Body of the readiness probe.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiHealthResponse {
    /// "ok" or "unhealthy"
    pub status: String,

    /// Job store connectivity ("connected" / "disconnected")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,

    /// Seconds since the server started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_seconds: Option<u64>,

    /// Server version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// `GET /health` — liveness.
///
/// Answers without touching the store, so load balancers get a fast
/// yes/no on whether the process is alive.
pub async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "ok".to_string(),
    })
}

/// `GET /api/health` — readiness.
///
/// Probes the job store; a failed probe turns the response into a 503
/// so orchestration stops routing traffic here.
pub async fn api_health(State(state): State<AppState>) -> (StatusCode, Json<ApiHealthResponse>) {
    let store_ok = state.store.health().await;

    let response = ApiHealthResponse {
        status: if store_ok { "ok" } else { "unhealthy" }.to_string(),
        store: Some(if store_ok { "connected" } else { "disconnected" }.to_string()),
        uptime_seconds: Some(state.uptime_seconds()),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    };

    let code = if store_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(response))
}
