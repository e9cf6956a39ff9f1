//! Health check route.

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};

use super::not_found;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health).fallback(not_found))
}

/// GET /api/health — static liveness payload, independent of configuration.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "OK",
        "message": "Chatbot API is running",
    }))
}
