//! Order API Module
//!
//! Checkout, queries, payment, cancellation, and the provider's callback
//! pair. All mutations go through OrderManager.

mod handler;

use axum::{
    routing::{get, post},
    Router,
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        // Checkout + order list
        .route("/", post(handler::create).get(handler::list))
        // Provider callbacks (fixed endpoints, no user scope)
        .route("/notify", post(handler::notify))
        .route("/return", get(handler::payment_return))
        // Order detail / cancel
        .route("/{id}", get(handler::get_by_id).delete(handler::cancel))
        // Pay: provider form payload
        .route("/{id}/pay", post(handler::pay))
}
