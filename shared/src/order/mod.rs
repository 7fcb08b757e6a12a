//! Order domain types
//!
//! The order aggregate and its wire DTOs. The aggregate is passed by value
//! between components (no lazy loading): an [`Order`] always carries its
//! full line set, so state-machine code never reaches back into storage to
//! discover what a transition must release or commit.

pub mod dto;
pub mod types;

pub use dto::{CheckoutRequest, PaymentForm, PaymentNotice, StockAdjustment};
pub use types::{Order, OrderLine, OrderStatus, PaymentMethod, StockLevels};
