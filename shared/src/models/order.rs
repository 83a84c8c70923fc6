//! Order and order line models

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub order_number: String,
    pub shop_id: Uuid,
    pub series_name: String,
    pub order_date: NaiveDate,
    pub status: OrderStatus,
    pub is_closed: bool,
}

/// Fulfillment status of an order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Partial,
    /// Older rows were written as "delivered"
    #[serde(alias = "delivered")]
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Partial => "partial",
            OrderStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "partial" => Some(OrderStatus::Partial),
            "completed" | "delivered" => Some(OrderStatus::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "Pending"),
            OrderStatus::Partial => write!(f, "Partial"),
            OrderStatus::Completed => write!(f, "Completed"),
        }
    }
}

/// Demand for one product/color within an order.
///
/// Identity is (order_number, product_number, color).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    pub order_number: String,
    pub shop_id: Uuid,
    pub series_name: String,
    pub product_number: String,
    pub color: String,
    pub quantity: i64,
}

impl OrderLine {
    pub fn matches(&self, order_number: &str, product_number: &str, color: &str) -> bool {
        self.order_number == order_number
            && self.product_number == product_number
            && crate::colors_match(&self.color, color)
    }
}

/// Numeric suffix of an order number ("VVI-42" -> 42).
pub fn order_sequence(order_number: &str) -> Option<i64> {
    order_number
        .rsplit_once('-')
        .and_then(|(_, suffix)| suffix.trim().parse().ok())
}

/// Oldest-first ordering of order numbers.
///
/// Numbered orders sort by their suffix; anything without a parseable
/// suffix goes last. Ties fall back to the raw string.
pub fn compare_order_numbers(a: &str, b: &str) -> Ordering {
    match (order_sequence(a), order_sequence(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Generate an order number
pub fn generate_order_number(prefix: &str, sequence: i64) -> String {
    format!("{}-{}", prefix, sequence)
}

/// Next order number after the highest existing sequence
pub fn next_order_number<'a>(prefix: &str, existing: impl IntoIterator<Item = &'a str>) -> String {
    let last = existing
        .into_iter()
        .filter_map(order_sequence)
        .max()
        .unwrap_or(0);
    generate_order_number(prefix, last + 1)
}
