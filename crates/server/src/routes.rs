//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use nodes::draft_submission;
use pipeline::{ArticleRequest, ArticleResponse, PipelineError};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// API error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip)]
    status: StatusCode,
}

impl From<PipelineError> for ErrorResponse {
    fn from(error: PipelineError) -> Self {
        let (status, code) = match &error {
            PipelineError::Generation { .. } => (StatusCode::BAD_GATEWAY, "GENERATION_FAILED"),
            PipelineError::InvalidGraph { .. } | PipelineError::Configuration { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PIPELINE_MISCONFIGURED")
            }
        };
        Self {
            error: error.to_string(),
            code,
            status,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Runs the full pipeline for one topic.
pub async fn generate_blog(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ArticleRequest>,
) -> Result<Json<ArticleResponse>, ErrorResponse> {
    info!(topic = %request.topic, "Received generation request");

    let report = state.executor.run(request).await.map_err(|e| {
        error!(error = %e, "Generation failed");
        ErrorResponse::from(e)
    })?;

    Ok(Json(report.into_response()))
}

#[derive(Debug, Deserialize)]
pub struct PublishBody {
    pub topic: String,
    pub content: String,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PublishOutcome {
    Success { url: String },
    Error { message: String },
}

/// Submits an already written article as a draft.
///
/// Always answers 200; the body's `status` says whether it worked.
pub async fn publish(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PublishBody>,
) -> Json<PublishOutcome> {
    let request = draft_submission(&body.topic, &body.content, &state.tags);
    match state.publisher.publish(request).await {
        Ok(article) => {
            info!(url = %article.url, "Manual publish succeeded");
            Json(PublishOutcome::Success { url: article.url })
        }
        Err(e) => {
            warn!(error = %e, "Manual publish failed");
            Json(PublishOutcome::Error {
                message: "Failed to publish".to_string(),
            })
        }
    }
}
