//! Health check endpoints

use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;

use super::ApiState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Detailed readiness response
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub checks: ReadinessChecks,
}

/// Individual readiness checks
#[derive(Serialize)]
pub struct ReadinessChecks {
    pub api_key: CheckResult,
}

/// Result of a single health check
#[derive(Serialize)]
pub struct CheckResult {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckResult {
    const fn ok() -> Self {
        Self {
            status: "ok",
            message: None,
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            status: "fail",
            message: Some(message.into()),
        }
    }
}

/// Liveness check - is the service running?
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness check - can consultations reach the remote APIs?
async fn ready(State(state): State<Arc<ApiState>>) -> (StatusCode, Json<ReadinessResponse>) {
    let api_key = if state.api_key_configured {
        CheckResult::ok()
    } else {
        CheckResult::fail("GROQ_API_KEY not set")
    };

    let all_ok = api_key.status == "ok";
    let (status, http_status) = if all_ok {
        ("ok", StatusCode::OK)
    } else {
        ("degraded", StatusCode::SERVICE_UNAVAILABLE)
    };

    (
        http_status,
        Json(ReadinessResponse {
            status,
            checks: ReadinessChecks { api_key },
        }),
    )
}

/// System status response including model info
#[derive(Serialize)]
pub struct StatusResponse {
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<ModelStatus>,
}

#[derive(Serialize)]
pub struct ModelStatus {
    pub vision: String,
    pub stt: String,
    pub tts: String,
}

/// Get system status including configured models
async fn status(State(state): State<Arc<ApiState>>) -> Json<StatusResponse> {
    let models = state.models.as_ref().map(|m| ModelStatus {
        vision: m.vision.clone(),
        stt: m.stt.clone(),
        tts: m.tts.clone(),
    });

    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        models,
    })
}

/// Build health router (liveness only, no state needed)
pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

/// Build readiness router (needs state for checks)
pub fn ready_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/ready", get(ready))
        .route("/api/status", get(status))
        .with_state(state)
}
