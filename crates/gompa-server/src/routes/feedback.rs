//! Feedback route. Fire-and-forget: no validation, always acknowledged
//! unless the sink itself fails.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use gompa_chat::{FeedbackEntry, FeedbackRequest};
use tracing::error;

use super::not_found;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/feedback", post(feedback).fallback(not_found))
}

async fn feedback(
    State(state): State<Arc<AppState>>,
    body: Result<Json<FeedbackRequest>, JsonRejection>,
) -> impl IntoResponse {
    // A body that is not declared as JSON is read as an empty object.
    let result = match body {
        Ok(Json(req)) => state.feedback.record(&FeedbackEntry::new(req)),
        Err(JsonRejection::MissingJsonContentType(_)) => state
            .feedback
            .record(&FeedbackEntry::new(FeedbackRequest::default())),
        Err(rejection) => Err(gompa_core::Error::Internal(rejection.body_text())),
    };

    match result {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": "Thank you for your feedback!",
            })),
        ),
        Err(e) => {
            error!("Failed to process feedback: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "success": false,
                    "error": "Failed to process feedback",
                })),
            )
        }
    }
}
