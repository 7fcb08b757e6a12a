//! Order API Handlers

use axum::{
    extract::{Form, Path, Query, State},
    response::Redirect,
    Json,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use validator::Validate;

use crate::api::CurrentUser;
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppError, AppResult};
use shared::order::{CheckoutRequest, Order, PaymentForm, PaymentNotice};

/// Create an order from a cart selection
pub async fn create(
    State(state): State<ServerState>,
    CurrentUser(user_id): CurrentUser,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<ApiResponse<Order>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let order = state.orders.checkout(user_id, payload).await?;
    Ok(ApiResponse::success(order))
}

/// List the caller's orders, newest first
pub async fn list(
    State(state): State<ServerState>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<ApiResponse<Vec<Order>>> {
    let orders = state.orders.list_orders(user_id)?;
    Ok(ApiResponse::success(orders))
}

/// Get one of the caller's orders
pub async fn get_by_id(
    State(state): State<ServerState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Order>> {
    let order = state.orders.get_order(user_id, id)?;
    Ok(ApiResponse::success(order))
}

/// Obtain the provider pay-form payload for a pending order
pub async fn pay(
    State(state): State<ServerState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<PaymentForm>> {
    let order = state.orders.pay_order(user_id, id)?;
    let form = state.payment.create_pay_form(&order);
    Ok(ApiResponse::success(form))
}

/// Cancel a pending order
pub async fn cancel(
    State(state): State<ServerState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Order>> {
    let order = state.orders.cancel_order(user_id, id)?;
    Ok(ApiResponse::success_with_message("Order cancelled", order))
}

/// Asynchronous payment notification from the provider
///
/// This is the authoritative payment signal. The payload is form-urlencoded
/// and signed; verification failures are rejected before any order state is
/// touched.
pub async fn notify(
    State(state): State<ServerState>,
    Form(params): Form<BTreeMap<String, String>>,
) -> AppResult<ApiResponse<PaymentNotice>> {
    tracing::info!(
        out_trade_no = params.get("out_trade_no").map(String::as_str),
        trade_status = params.get("trade_status").map(String::as_str),
        "Payment notification received"
    );

    let notice = state.payment.verify_notice(&params)?;
    let ack = state.orders.handle_payment_notice(notice).await?;
    Ok(ApiResponse::success_with_message("Payment accepted", ack))
}

/// Query params of the synchronous browser return
#[derive(Debug, Deserialize)]
pub struct ReturnQuery {
    pub out_trade_no: String,
}

/// Synchronous browser return after payment
///
/// UX only: redirects to the frontend success page. The redirect can be
/// skipped or replayed by the client, so it never drives order state; that
/// is what [`notify`] is for.
pub async fn payment_return(
    State(state): State<ServerState>,
    Query(query): Query<ReturnQuery>,
) -> Redirect {
    let url = state
        .payment
        .success_redirect(&state.config.frontend_base_url, &query.out_trade_no);
    tracing::info!(out_trade_no = %query.out_trade_no, "Payment return, redirecting");
    Redirect::temporary(&url)
}
