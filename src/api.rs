use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::feedback::{FeedbackRecord, FeedbackStore};
use crate::models::{FeedbackRequest, FeedbackResponse, GenerateRequest, GenerateResponse};
use crate::pipeline::BlogPipeline;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<BlogPipeline>,
    pub feedback: Arc<dyn FeedbackStore>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat_endpoint))
        .route("/api/feedback", post(feedback_endpoint))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn chat_endpoint(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    let Json(req) = payload.map_err(|e| AppError::invalid("body", e.body_text()))?;
    let request = req.validate()?;

    tracing::info!(
        "generating post on {:?} with {} ({} urls supplied)",
        request.topic,
        request.model.model_name(),
        request.urls.len()
    );
    let content = state.pipeline.run(&request).await?;
    Ok(Json(GenerateResponse { content }))
}

async fn feedback_endpoint(
    State(state): State<AppState>,
    payload: Result<Json<FeedbackRequest>, JsonRejection>,
) -> Result<Json<FeedbackResponse>, AppError> {
    let Json(req) = payload.map_err(|e| AppError::invalid("body", e.body_text()))?;

    let image_url = req
        .image_url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::invalid("imageUrl", "Invalid or missing imageUrl"))?;
    let query = req
        .query
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::invalid("query", "Invalid or missing query"))?;
    let relevant = req
        .relevant
        .ok_or_else(|| AppError::invalid("relevant", "Invalid or missing relevant flag"))?;

    let record = FeedbackRecord {
        image_url,
        query,
        relevant,
        timestamp: chrono::Utc::now(),
    };
    state.feedback.record(&record).await?;

    Ok(Json(FeedbackResponse { success: true }))
}
