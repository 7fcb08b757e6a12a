//! Stock API Module
//!
//! Read access to per-product counters plus the administrative override.
//! The override bypasses the reserve/release/commit protocol and exists for
//! inventory tooling only.

mod handler;

use axum::{routing::get, Router};

use crate::core::ServerState;

/// Stock router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/stock", routes())
}

fn routes() -> Router<ServerState> {
    Router::new().route("/{id}", get(handler::get_levels).put(handler::adjust))
}
