//! Wire DTOs for the order API

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::types::PaymentMethod;

/// Checkout request: a selection of the caller's cart lines plus delivery
/// and payment choices
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CheckoutRequest {
    /// Cart line ids to check out (must belong to the caller)
    pub cart_line_ids: Vec<String>,
    /// 收货地址
    #[validate(length(min = 1, message = "shipping address must not be empty"))]
    pub shipping_address: String,
    /// Payment method tag
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

/// Asynchronous payment notification, decoded and signature-verified from
/// the provider's webhook
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentNotice {
    /// Order id (the provider echoes our out_trade_no)
    pub order_id: i64,
    /// Provider-side trade reference
    pub trade_no: String,
    /// Provider-reported status string (carried through, not gated)
    pub status: String,
    /// Reported paid amount; must equal the order total exactly
    pub total_amount: Decimal,
    /// Payment wall-clock time (Unix millis), when the provider reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_time: Option<i64>,
}

/// Pay-order response: the opaque redirect payload the client submits to
/// the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentForm {
    pub order_id: i64,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    /// Auto-submitting HTML form targeting the provider gateway
    pub form_html: String,
}

/// Administrative stock override (inventory tooling only, bypasses the
/// reserve/release/commit protocol)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub available: u32,
    pub reserved: u32,
}
