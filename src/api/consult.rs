//! Consultation endpoint
//!
//! Accepts a multipart form with optional `audio` and `image` files and
//! returns the transcript, the structured reply, and a link to the spoken reply.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Serialize;

use super::{AUDIO_ROUTE, ApiState};
use crate::consult::{ConsultOutcome, Submission};
use crate::media::{AudioInput, ImageInput};

/// Largest accepted multipart body
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Build consultation router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/consult", post(consult))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Consultation response
#[derive(Debug, Serialize)]
pub struct ConsultResponse {
    pub transcript: String,
    pub analysis: String,
    pub treatment: String,
    pub audio_url: Option<String>,
}

impl From<ConsultOutcome> for ConsultResponse {
    fn from(outcome: ConsultOutcome) -> Self {
        let audio_url = outcome
            .audio_path
            .as_deref()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .map(|name| format!("{AUDIO_ROUTE}/{name}"));

        Self {
            transcript: outcome.transcript,
            analysis: outcome.analysis,
            treatment: outcome.treatment,
            audio_url,
        }
    }
}

/// Run a consultation
///
/// Remote failures never fail the request; only a malformed form does.
async fn consult(
    State(state): State<Arc<ApiState>>,
    multipart: Multipart,
) -> Result<Json<ConsultResponse>, ConsultError> {
    let submission = read_submission(multipart).await?;
    let outcome = state.consultant.consult(submission).await;
    Ok(Json(outcome.into()))
}

/// Collect the optional uploads; empty parts count as absent
async fn read_submission(mut multipart: Multipart) -> Result<Submission, ConsultError> {
    let mut submission = Submission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ConsultError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(ToString::to_string);
        let content_type = field.content_type().map(ToString::to_string);

        let data = field
            .bytes()
            .await
            .map_err(|e| ConsultError::BadRequest(e.body_text()))?;

        if data.is_empty() {
            tracing::debug!(field = %name, "skipping empty upload");
            continue;
        }

        match name.as_str() {
            "audio" => {
                let audio = AudioInput {
                    data: data.to_vec(),
                    file_name: file_name.unwrap_or_else(|| "audio.webm".to_string()),
                    mime_type: content_type.unwrap_or_else(|| "audio/webm".to_string()),
                };
                submission.audio = Some(audio.into());
            }
            "image" => {
                let image = ImageInput {
                    data: data.to_vec(),
                    mime_type: content_type.unwrap_or_else(|| "image/jpeg".to_string()),
                };
                submission.image = Some(image.into());
            }
            other => tracing::debug!(field = %other, "ignoring unknown form field"),
        }
    }

    Ok(submission)
}

/// Consultation API errors
#[derive(Debug)]
pub enum ConsultError {
    BadRequest(String),
    RateLimited { retry_after: std::time::Duration },
}

impl IntoResponse for ConsultError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
        }

        let (status, code, message, retry_after) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            Self::RateLimited { retry_after } => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "Too many consultations, try again shortly".to_string(),
                Some(retry_after),
            ),
        };

        let mut response =
            (status, Json(ErrorResponse { error: ErrorBody { code, message } })).into_response();
        if let Some(wait) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(wait.as_secs().max(1)));
        }
        response
    }
}
