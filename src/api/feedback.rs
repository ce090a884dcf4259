//! Flagging consultations for human review
//!
//! Flags are written to the log only; nothing is stored.

use axum::{Json, Router, routing::post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Acknowledgement shown after flagging
pub const FLAG_MESSAGE: &str = "Flagged — thanks. We'll review this case.";

/// Flag request carrying the reply the user is unhappy with
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FlagRequest {
    pub analysis: String,
    pub treatment: String,
}

/// Flag acknowledgement
#[derive(Debug, Serialize)]
pub struct FlagResponse {
    pub message: &'static str,
    pub flagged_at: DateTime<Utc>,
}

async fn flag(Json(request): Json<FlagRequest>) -> Json<FlagResponse> {
    let flagged_at = Utc::now();
    tracing::warn!(
        flagged_at = %flagged_at.to_rfc3339(),
        analysis = %request.analysis,
        treatment = %request.treatment,
        "consultation flagged for review"
    );

    Json(FlagResponse {
        message: FLAG_MESSAGE,
        flagged_at,
    })
}

/// Build feedback router
pub fn router() -> Router {
    Router::new().route("/flag", post(flag))
}
