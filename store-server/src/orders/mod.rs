//! Order core: state machine, stock ledger, checkout, expiry
//!
//! # Structure
//!
//! - [`storage`] - redb tables and the explicit transaction handle
//! - [`ledger`] - stock reserve/release/commit/adjust
//! - [`actions`] - one file per state-machine command
//! - [`manager`] - command execution and collaborator resolution
//! - [`sweeper`] - periodic expiry of stale pending orders

pub mod actions;
pub mod ledger;
pub mod manager;
pub mod storage;
pub mod sweeper;

pub use actions::OrderError;
pub use ledger::StockLedger;
pub use manager::OrderManager;
pub use storage::OrderStore;
pub use sweeper::ExpirySweeper;

use shared::error::{AppError, ErrorCode};

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::EmptySelection => AppError::new(ErrorCode::EmptySelection),
            OrderError::CartLineNotFound(id) => {
                AppError::with_message(ErrorCode::CartLineNotFound, format!("Cart line {id} not found"))
                    .with_detail("cart_line_id", id)
            }
            OrderError::ProductNotFound(id) => {
                AppError::with_message(ErrorCode::ProductNotFound, format!("Product {id} not found"))
                    .with_detail("product_id", id)
            }
            OrderError::StockNotFound(id) => {
                AppError::with_message(ErrorCode::StockNotFound, format!("No stock record for {id}"))
                    .with_detail("product_id", id)
            }
            OrderError::InsufficientStock {
                product_id,
                available,
                requested,
            } => AppError::with_message(
                ErrorCode::InsufficientStock,
                format!(
                    "Insufficient stock for {product_id}: available {available}, requested {requested}"
                ),
            )
            .with_detail("product_id", product_id)
            .with_detail("available", available)
            .with_detail("requested", requested),
            OrderError::OrderNotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, format!("Order {id} not found"))
                    .with_detail("order_id", id)
            }
            OrderError::OrderStatusError { current, expected } => AppError::with_message(
                ErrorCode::OrderStatusError,
                format!("Order status is {current}, expected {expected}"),
            )
            .with_detail("current", current.to_string())
            .with_detail("expected", expected.to_string()),
            OrderError::OrderCannotCancel(status) => AppError::with_message(
                ErrorCode::OrderCannotCancel,
                format!("Order in status {status} cannot be cancelled"),
            )
            .with_detail("current", status.to_string()),
            OrderError::PaymentAmountMismatch { expected, reported } => AppError::with_message(
                ErrorCode::PaymentAmountMismatch,
                "Payment amount does not match order total",
            )
            .with_detail("expected", expected.to_string())
            .with_detail("reported", reported.to_string()),
            OrderError::Storage(e) => AppError::database(e.to_string()),
            OrderError::Database(msg) => AppError::database(msg),
        }
    }
}
