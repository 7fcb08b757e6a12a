//! Health check endpoint

use axum::{routing::get, Router};
use shared::error::ApiResponse;

use crate::core::ServerState;

/// Health router
pub fn router() -> Router<ServerState> {
    Router::new().route("/api/health", get(health))
}

async fn health() -> ApiResponse<serde_json::Value> {
    ApiResponse::success(serde_json::json!({ "status": "ok" }))
}
