//! Read-only pending views.
//!
//! The three views answer different questions from different signals and
//! must stay separate:
//! - manufacturing: ordered minus everything that has left the factory
//!   (dispatch date set), for orders still `pending`
//! - in transit: dispatched batches not yet confirmed arrived
//! - total pending: ordered minus FIFO allocations from completed batches

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    allocated_to, compare_order_numbers, product_color_key, Allocation, Order, OrderLine,
    OrderStatus, ReceiveBatch, ReceiveLine, Scope,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManufacturingRow {
    pub order_number: String,
    pub order_date: NaiveDate,
    pub product_number: String,
    pub color: String,
    pub ordered_quantity: i64,
    pub shipped_quantity: i64,
    pub manufacturing_quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InTransitRow {
    pub receive_number: String,
    pub dispatch_date: Option<NaiveDate>,
    pub eta_date: Option<NaiveDate>,
    pub transport_mode: Option<String>,
    pub notes: Option<String>,
    pub product_number: String,
    pub color: String,
    pub in_transit_quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TotalPendingRow {
    pub order_number: String,
    pub order_date: NaiveDate,
    pub product_number: String,
    pub color: String,
    pub ordered_quantity: i64,
    pub allocated_quantity: i64,
    pub pending_quantity: i64,
}

/// Facts the projector reads, borrowed from a ledger snapshot
pub struct ViewInput<'a> {
    pub orders: &'a [Order],
    pub order_lines: &'a [OrderLine],
    pub batches: &'a [ReceiveBatch],
    pub receive_lines: &'a [ReceiveLine],
    pub allocations: &'a [Allocation],
}

impl<'a> ViewInput<'a> {
    fn order(&self, order_number: &str) -> Option<&'a Order> {
        self.orders.iter().find(|o| o.order_number == order_number)
    }

    /// Order lines in scope, oldest order first, then by insertion
    fn scoped_lines(&self, scope: &Scope) -> Vec<&'a OrderLine> {
        let mut lines: Vec<&OrderLine> = self
            .order_lines
            .iter()
            .filter(|l| scope.contains(l.shop_id, &l.series_name))
            .collect();
        lines.sort_by(|a, b| compare_order_numbers(&a.order_number, &b.order_number));
        lines
    }

    fn scoped_batches(&self, scope: &Scope) -> HashMap<&'a str, &'a ReceiveBatch> {
        self.batches
            .iter()
            .filter(|b| scope.contains(b.shop_id, &b.series_name))
            .map(|b| (b.receive_number.as_str(), b))
            .collect()
    }
}

/// Ordered minus dispatched, for orders still `pending`.
///
/// A dispatched receive line tagged with an order number counts against
/// that order's matching line. Untagged dispatched quantity is spread over
/// the scope's order lines for the same product/color oldest order first,
/// each line absorbing at most what its own tagged shipments left open.
/// Rows with nothing left to manufacture are suppressed.
pub fn manufacturing_view(input: &ViewInput<'_>, scope: &Scope) -> Vec<ManufacturingRow> {
    let lines = input.scoped_lines(scope);
    let batches = input.scoped_batches(scope);

    let mut tagged: HashMap<(String, String, String), i64> = HashMap::new();
    let mut untagged: HashMap<(String, String), i64> = HashMap::new();

    for rl in input.receive_lines {
        let dispatched = batches
            .get(rl.receive_number.as_str())
            .is_some_and(|b| b.is_dispatched());
        if !dispatched {
            continue;
        }
        let key = product_color_key(&rl.product_number, &rl.color);
        let owner = rl
            .order_number
            .as_deref()
            .filter(|o| !o.is_empty())
            .filter(|o| lines.iter().any(|l| l.matches(o, &rl.product_number, &rl.color)));
        match owner {
            Some(order_number) => {
                *tagged
                    .entry((order_number.to_string(), key.0, key.1))
                    .or_insert(0) += rl.quantity;
            }
            None => *untagged.entry(key).or_insert(0) += rl.quantity,
        }
    }

    let mut rows = Vec::new();
    for line in lines {
        let key = product_color_key(&line.product_number, &line.color);
        let mut shipped = tagged
            .get(&(line.order_number.clone(), key.0.clone(), key.1.clone()))
            .copied()
            .unwrap_or(0);

        let open = (line.quantity - shipped).max(0);
        if let Some(pool) = untagged.get_mut(&key) {
            let take = open.min(*pool);
            shipped += take;
            *pool -= take;
        }

        let Some(order) = input.order(&line.order_number) else {
            continue;
        };
        let manufacturing = line.quantity - shipped;
        if order.status != OrderStatus::Pending || manufacturing <= 0 {
            continue;
        }
        rows.push(ManufacturingRow {
            order_number: line.order_number.clone(),
            order_date: order.order_date,
            product_number: line.product_number.clone(),
            color: line.color.clone(),
            ordered_quantity: line.quantity,
            shipped_quantity: shipped,
            manufacturing_quantity: manufacturing,
        });
    }
    rows
}

/// Dispatched but not yet completed, per batch and product/color.
///
/// Independent of orders and allocations. Sorted by dispatch date, then
/// receive number.
pub fn in_transit_view(input: &ViewInput<'_>, scope: &Scope) -> Vec<InTransitRow> {
    let batches = input.scoped_batches(scope);
    let mut grouped: BTreeMap<(Option<NaiveDate>, String, String, String), InTransitRow> =
        BTreeMap::new();

    for rl in input.receive_lines {
        let Some(batch) = batches.get(rl.receive_number.as_str()) else {
            continue;
        };
        if !batch.is_in_transit() {
            continue;
        }
        let key = (
            batch.dispatch_date,
            batch.receive_number.clone(),
            rl.product_number.clone(),
            rl.color.to_lowercase(),
        );
        grouped
            .entry(key)
            .or_insert_with(|| InTransitRow {
                receive_number: batch.receive_number.clone(),
                dispatch_date: batch.dispatch_date,
                eta_date: batch.estimated_arrival_date,
                transport_mode: batch.mode_of_transport.clone(),
                notes: batch.notes.clone(),
                product_number: rl.product_number.clone(),
                color: rl.color.clone(),
                in_transit_quantity: 0,
            })
            .in_transit_quantity += rl.quantity;
    }

    grouped.into_values().collect()
}

/// Ordered minus allocated per order line, any order status.
///
/// Only exact zeros are suppressed so over-allocation shows up as a
/// negative pending quantity.
pub fn total_pending_view(input: &ViewInput<'_>, scope: &Scope) -> Vec<TotalPendingRow> {
    input
        .scoped_lines(scope)
        .into_iter()
        .filter_map(|line| {
            let order = input.order(&line.order_number)?;
            let allocated = allocated_to(
                input.allocations,
                &line.order_number,
                &line.product_number,
                &line.color,
            );
            let pending = line.quantity - allocated;
            (pending != 0).then(|| TotalPendingRow {
                order_number: line.order_number.clone(),
                order_date: order.order_date,
                product_number: line.product_number.clone(),
                color: line.color.clone(),
                ordered_quantity: line.quantity,
                allocated_quantity: allocated,
                pending_quantity: pending,
            })
        })
        .collect()
}
