//! Health check endpoints for Kubernetes probes

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::api::types::Json;

use super::state::AppState;

/// Health response with optional component detail
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

#[derive(Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Simple liveness probe; returns 200 while the process runs
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
        latency_ms: None,
    };

    (StatusCode::OK, Json(response))
}

/// Alias for `health_check` used by orchestrators expecting `/live`
pub async fn live_check() -> impl IntoResponse {
    health_check().await
}

/// Readiness probe verifying the vector store is reachable.
///
/// The cache is reported but never degrades readiness; the service answers
/// without it.
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let mut checks = Vec::new();
    let mut overall_status = HealthStatus::Healthy;

    let retriever_check = match state.retriever.health_check().await {
        Ok(()) => HealthCheck {
            name: state.retriever.backend_name().to_string(),
            status: HealthStatus::Healthy,
            message: None,
        },
        Err(e) => {
            overall_status = HealthStatus::Degraded;
            HealthCheck {
                name: state.retriever.backend_name().to_string(),
                status: HealthStatus::Degraded,
                message: Some(e.to_string()),
            }
        }
    };
    checks.push(retriever_check);

    checks.push(HealthCheck {
        name: "semantic_cache".to_string(),
        status: HealthStatus::Healthy,
        message: if state.cache.enabled() {
            None
        } else {
            Some("disabled".to_string())
        },
    });

    let response = HealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(checks),
        latency_ms: Some(start.elapsed().as_millis() as u64),
    };

    let status_code = match overall_status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Degraded => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}
