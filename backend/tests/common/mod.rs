//! Ledger fixtures shared by the integration tests

#![allow(dead_code)]

use chrono::NaiveDate;
use shared::{Ledger, Order, OrderLine, OrderStatus, ReceiveBatch, ReceiveLine, Scope};
use uuid::Uuid;

pub const SERIES: &str = "Classic";

pub fn shop() -> Uuid {
    Uuid::from_u128(0x5107)
}

pub fn scope() -> Scope {
    Scope::new(shop(), SERIES)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Builder over a `Ledger` for one shop and series
#[derive(Default)]
pub struct LedgerBuilder {
    ledger: Ledger,
}

impl LedgerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending order with one line per (product, color, quantity)
    pub fn order(mut self, order_number: &str, lines: &[(&str, &str, i64)]) -> Self {
        let sequence = shared::order_sequence(order_number).unwrap_or(1) as u32;
        self.ledger.orders.push(Order {
            order_number: order_number.to_string(),
            shop_id: shop(),
            series_name: SERIES.to_string(),
            order_date: date(2024, 1, sequence.clamp(1, 28)),
            status: OrderStatus::Pending,
            is_closed: false,
        });
        for (product, color, quantity) in lines {
            self.ledger.order_lines.push(OrderLine {
                order_number: order_number.to_string(),
                shop_id: shop(),
                series_name: SERIES.to_string(),
                product_number: product.to_string(),
                color: color.to_string(),
                quantity: *quantity,
            });
        }
        self
    }

    /// Receive batch, dispatched on `dispatched` when given
    pub fn batch(
        mut self,
        receive_number: &str,
        dispatched: Option<NaiveDate>,
        lines: &[(&str, &str, i64)],
    ) -> Self {
        self.ledger.batches.push(ReceiveBatch {
            receive_number: receive_number.to_string(),
            shop_id: shop(),
            series_name: SERIES.to_string(),
            dispatch_date: dispatched,
            estimated_arrival_date: dispatched.map(|d| d + chrono::Duration::days(30)),
            mode_of_transport: Some("Sea".to_string()),
            notes: None,
            is_completed: false,
        });
        for (product, color, quantity) in lines {
            self.ledger.receive_lines.push(ReceiveLine {
                receive_number: receive_number.to_string(),
                order_number: None,
                product_number: product.to_string(),
                color: color.to_string(),
                quantity: *quantity,
                actual_arrival_date: None,
            });
        }
        self
    }

    /// Receive line packed for a specific order
    pub fn tagged_line(
        mut self,
        receive_number: &str,
        order_number: &str,
        product: &str,
        color: &str,
        quantity: i64,
    ) -> Self {
        self.ledger.receive_lines.push(ReceiveLine {
            receive_number: receive_number.to_string(),
            order_number: Some(order_number.to_string()),
            product_number: product.to_string(),
            color: color.to_string(),
            quantity,
            actual_arrival_date: None,
        });
        self
    }

    pub fn build(self) -> Ledger {
        self.ledger
    }
}

/// Allocated total for one order line
pub fn allocated(ledger: &Ledger, order_number: &str, product: &str, color: &str) -> i64 {
    shared::allocated_to(&ledger.allocations, order_number, product, color)
}

pub fn status(ledger: &Ledger, order_number: &str) -> OrderStatus {
    ledger.order(order_number).map(|o| o.status).unwrap()
}
