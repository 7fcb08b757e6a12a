//! Unified error codes for the store platform
//!
//! Error codes are shared between the server and its clients so failures can
//! be matched programmatically. Codes are organized by category:
//! - 0xxx: General errors
//! - 3xxx: Cart errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Product / stock errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 3xxx: Cart ====================
    /// Checkout selection is empty
    EmptySelection = 3001,
    /// Selected cart line not found
    CartLineNotFound = 3002,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order is not in the status the operation requires
    OrderStatusError = 4002,
    /// Order cannot be cancelled in its current status
    OrderCannotCancel = 4003,

    // ==================== 5xxx: Payment ====================
    /// Payment processing failed
    PaymentFailed = 5001,
    /// Reported payment amount does not match the order total
    PaymentAmountMismatch = 5002,
    /// Payment notification signature is invalid
    PaymentSignatureInvalid = 5003,

    // ==================== 6xxx: Product / Stock ====================
    /// Product not found
    ProductNotFound = 6001,
    /// Not enough available stock to reserve
    InsufficientStock = 6002,
    /// No stock record exists for the product
    StockNotFound = 6003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the default human-readable message for this code
    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::InvalidRequest => "Invalid request",

            Self::EmptySelection => "No cart lines selected for checkout",
            Self::CartLineNotFound => "Cart line not found",

            Self::OrderNotFound => "Order not found",
            Self::OrderStatusError => "Order status does not allow this operation",
            Self::OrderCannotCancel => "Only pending orders can be cancelled",

            Self::PaymentFailed => "Payment processing failed",
            Self::PaymentAmountMismatch => "Payment amount does not match order total",
            Self::PaymentSignatureInvalid => "Payment notification signature invalid",

            Self::ProductNotFound => "Product not found",
            Self::InsufficientStock => "Insufficient stock",
            Self::StockNotFound => "Stock record not found",

            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown u16 into an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => Self::Success,
            1 => Self::Unknown,
            2 => Self::ValidationFailed,
            3 => Self::NotFound,
            5 => Self::InvalidRequest,

            3001 => Self::EmptySelection,
            3002 => Self::CartLineNotFound,

            4001 => Self::OrderNotFound,
            4002 => Self::OrderStatusError,
            4003 => Self::OrderCannotCancel,

            5001 => Self::PaymentFailed,
            5002 => Self::PaymentAmountMismatch,
            5003 => Self::PaymentSignatureInvalid,

            6001 => Self::ProductNotFound,
            6002 => Self::InsufficientStock,
            6003 => Self::StockNotFound,

            9001 => Self::InternalError,
            9002 => Self::DatabaseError,

            other => return Err(InvalidErrorCode(other)),
        };
        Ok(code)
    }
}
