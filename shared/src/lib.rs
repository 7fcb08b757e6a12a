//! Shared types for the store platform
//!
//! Domain types and infrastructure shared between the server and any
//! tooling that talks to it: the order aggregate, unified error codes,
//! the API response envelope, and time/id utilities.

pub mod error;
pub mod order;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use order::{Order, OrderLine, OrderStatus, PaymentMethod, StockLevels};
