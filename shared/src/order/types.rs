//! Core order and stock types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Order Status
// ============================================================================

/// 订单状态
///
/// PENDING 是唯一的非终态；PAID / CANCELLED / TIMEOUT 均为终态，
/// 任何从终态出发的转换都是非法的。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// 待支付
    #[default]
    Pending,
    /// 已支付（终态）
    Paid,
    /// 已取消（终态，用户发起）
    Cancelled,
    /// 已超时（终态，系统发起）
    Timeout,
}

impl OrderStatus {
    /// Terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Timeout => "TIMEOUT",
        };
        write!(f, "{}", s)
    }
}

// ============================================================================
// Payment Method
// ============================================================================

/// 支付方式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// 网关页面支付（跳转表单）
    #[default]
    Gateway,
}

// ============================================================================
// Order Aggregate
// ============================================================================

/// A single checked-out line
///
/// `unit_price` and `title` are frozen at checkout time. Later catalog price
/// changes never alter an existing order's total.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    /// Originating cart line id (cleared from the cart once the order is paid)
    pub cart_line_id: String,
    /// Product record id
    pub product_id: String,
    /// Product title snapshot
    pub title: String,
    /// Unit price snapshot
    pub unit_price: Decimal,
    /// Reserved quantity
    pub quantity: u32,
}

impl OrderLine {
    /// Line subtotal: unit price × quantity
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Order aggregate
///
/// Created once by checkout, mutated only by state-machine transitions,
/// never deleted. Stored and passed around as a whole, lines included.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Order id (snowflake i64, doubles as the provider's out_trade_no)
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Total at checkout time
    pub total_amount: Decimal,
    /// Shipping address
    pub shipping_address: String,
    /// Payment method
    pub payment_method: PaymentMethod,
    /// Current status
    pub status: OrderStatus,
    /// External trade reference, set when the order is paid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_no: Option<String>,
    /// Payment timestamp (Unix millis), set when the order is paid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_time: Option<i64>,
    /// Creation timestamp (Unix millis)
    pub created_at: i64,
    /// Last update timestamp (Unix millis)
    pub updated_at: i64,
    /// Line items, in checkout selection order
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// Total reserved quantity across all lines
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

// ============================================================================
// Stock
// ============================================================================

/// Per-product stock counters, as exposed to callers
///
/// Invariant: both counters are unsigned, so "never negative" holds by
/// construction; the ledger enforces that a reservation cannot push
/// `available` below zero.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StockLevels {
    /// Sellable units
    pub available: u32,
    /// Units held by pending orders
    pub reserved: u32,
}
