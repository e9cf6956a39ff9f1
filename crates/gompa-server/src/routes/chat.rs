//! Chat route — one message in, one generated reply out.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use gompa_chat::ChatRequest;
use tracing::debug;

use super::not_found;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/chat", post(chat).fallback(not_found))
}

/// POST /api/chat — an unreadable body counts as a missing message.
async fn chat(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = body.map(|Json(req)| req).unwrap_or_else(|rejection| {
        debug!("Unreadable chat body: {}", rejection.body_text());
        ChatRequest::default()
    });

    let envelope = state.chat.handle(req.message.as_deref()).await;
    let status = StatusCode::from_u16(envelope.status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (status, Json(envelope))
}
