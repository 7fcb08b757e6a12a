//! Stock API Handlers

use axum::{
    extract::{Path, State},
    Json,
};

use crate::core::ServerState;
use crate::db::repository::record_id;
use crate::utils::{ApiResponse, AppResult};
use shared::order::{StockAdjustment, StockLevels};

/// Accept both "product:abc" and bare "abc" in the path
fn normalize(id: &str) -> String {
    record_id("product", id).to_string()
}

/// Current counters for a product
pub async fn get_levels(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<StockLevels>> {
    let levels = state.orders.stock_levels(&normalize(&id))?;
    Ok(ApiResponse::success(levels))
}

/// Administrative stock override
pub async fn adjust(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<StockAdjustment>,
) -> AppResult<ApiResponse<StockLevels>> {
    let levels = state.orders.adjust_stock(&normalize(&id), payload)?;
    Ok(ApiResponse::success_with_message("Stock adjusted", levels))
}
