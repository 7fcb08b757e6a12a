//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::CartLineNotFound
            | Self::OrderNotFound
            | Self::ProductNotFound
            | Self::StockNotFound => StatusCode::NOT_FOUND,

            // 400 Bad Request
            Self::ValidationFailed
            | Self::InvalidRequest
            | Self::EmptySelection
            | Self::PaymentSignatureInvalid => StatusCode::BAD_REQUEST,

            // 409 Conflict - the resource is in a state that rejects the operation
            Self::OrderStatusError | Self::OrderCannotCancel => StatusCode::CONFLICT,

            // 422 Unprocessable - business rule violations
            Self::InsufficientStock | Self::PaymentAmountMismatch | Self::PaymentFailed => {
                StatusCode::UNPROCESSABLE_ENTITY
            }

            // 500 Internal Server Error
            Self::Unknown | Self::InternalError | Self::DatabaseError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
