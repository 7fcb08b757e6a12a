//! Order state-machine actions
//!
//! One file per command. Every action executes against an [`ActionContext`]
//! carrying the write transaction: it loads current state, checks the status
//! precondition, mutates, and persists, all inside the one transaction, so
//! the precondition check and the state change are a single test-and-set.
//! An action that returns an error leaves the transaction uncommitted and
//! therefore leaves no trace.

pub mod cancel_order;
pub mod checkout;
pub mod expire_order;
pub mod mark_paid;

pub use cancel_order::CancelOrderAction;
pub use checkout::{CheckoutAction, ResolvedLine};
pub use expire_order::ExpireOrderAction;
pub use mark_paid::MarkPaidAction;

use redb::WriteTransaction;
use rust_decimal::Decimal;
use shared::order::OrderStatus;
use thiserror::Error;

use super::ledger::LedgerError;
use super::storage::{OrderStore, StorageError};

/// Shared context for action execution
///
/// `now` is injected by the caller rather than read from the wall clock, so
/// tests can replay any moment in time.
pub struct ActionContext<'a> {
    pub txn: &'a WriteTransaction,
    pub store: &'a OrderStore,
    pub now: i64,
}

impl<'a> ActionContext<'a> {
    pub fn new(txn: &'a WriteTransaction, store: &'a OrderStore, now: i64) -> Self {
        Self { txn, store, now }
    }
}

/// Business errors of the order core
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("No cart lines selected for checkout")]
    EmptySelection,

    #[error("Cart line not found: {0}")]
    CartLineNotFound(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("No stock record for product {0}")]
    StockNotFound(String),

    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: u32,
        requested: u32,
    },

    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    #[error("Order status is {current}, expected {expected}")]
    OrderStatusError {
        current: OrderStatus,
        expected: OrderStatus,
    },

    #[error("Order cannot be cancelled in status {0}")]
    OrderCannotCancel(OrderStatus),

    #[error("Payment amount {reported} does not match order total {expected}")]
    PaymentAmountMismatch {
        expected: Decimal,
        reported: Decimal,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<LedgerError> for OrderError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::StockNotFound(id) => OrderError::StockNotFound(id),
            LedgerError::InsufficientStock {
                product_id,
                available,
                requested,
            } => OrderError::InsufficientStock {
                product_id,
                available,
                requested,
            },
            LedgerError::Storage(e) => OrderError::Storage(e),
        }
    }
}

pub type OrderResult<T> = Result<T, OrderError>;
