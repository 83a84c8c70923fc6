//! Order fulfillment ledger
//!
//! A [`Ledger`] is an in-memory snapshot of orders, shipments, allocations
//! and stock. Completing a receive batch runs the FIFO allocator and order
//! closure against it and returns the exact set of changes made, so a
//! store can load a snapshot inside a transaction, apply the engine, and
//! persist only the deltas.

mod allocator;
mod closure;
mod normalize;
mod projector;

pub use allocator::*;
pub use closure::*;
pub use normalize::*;
pub use projector::*;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    allocated_to, Allocation, Order, OrderLine, OrderStatus, ReceiveBatch, ReceiveLine, Scope,
    StockDelta, StockOnHand,
};

/// Ledger consistency errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Receive batch {0} not found")]
    BatchNotFound(String),

    #[error("Receive batch {0} is already completed")]
    BatchAlreadyCompleted(String),
}

/// Surplus from a receive line that had no open order to attach to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DroppedSurplus {
    pub product_number: String,
    pub color: String,
    pub quantity: i64,
}

/// Everything that changed when a batch was completed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchCompletion {
    pub receive_number: String,
    pub shop_id: Uuid,
    pub series_name: String,
    pub arrival_date: NaiveDate,
    /// New allocation rows, in insertion order
    pub allocations: Vec<Allocation>,
    /// Subset of `allocations` created by the over-delivery fallback
    pub overflow: Vec<Allocation>,
    pub dropped: Vec<DroppedSurplus>,
    /// Orders newly marked completed and closed
    pub closed_orders: Vec<String>,
    pub stock_increments: Vec<StockDelta>,
}

impl BatchCompletion {
    pub fn allocated_quantity(&self) -> i64 {
        self.allocations.iter().map(|a| a.quantity).sum()
    }
}

/// Snapshot of ledger facts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    pub orders: Vec<Order>,
    pub order_lines: Vec<OrderLine>,
    pub batches: Vec<ReceiveBatch>,
    pub receive_lines: Vec<ReceiveLine>,
    pub allocations: Vec<Allocation>,
    pub stock: Vec<StockOnHand>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order(&self, order_number: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.order_number == order_number)
    }

    pub fn batch(&self, receive_number: &str) -> Option<&ReceiveBatch> {
        self.batches.iter().find(|b| b.receive_number == receive_number)
    }

    pub fn stock_quantity(
        &self,
        shop_id: Uuid,
        series_name: &str,
        product_number: &str,
        color: &str,
    ) -> i64 {
        self.stock
            .iter()
            .find(|s| s.is_for(shop_id, series_name, product_number, color))
            .map(|s| s.stock_quantity)
            .unwrap_or(0)
    }

    /// Ordered minus allocated for one order line
    pub fn line_pending(&self, line: &OrderLine) -> i64 {
        line.quantity
            - allocated_to(
                &self.allocations,
                &line.order_number,
                &line.product_number,
                &line.color,
            )
    }

    /// Outstanding demand for a product/color within a scope
    pub fn demand_for(&self, scope: &Scope, product_number: &str, color: &str) -> Vec<OrderDemand> {
        self.order_lines
            .iter()
            .filter(|l| {
                scope.contains(l.shop_id, &l.series_name)
                    && l.product_number == product_number
                    && crate::colors_match(&l.color, color)
            })
            .map(|l| OrderDemand {
                order_number: l.order_number.clone(),
                ordered: l.quantity,
                allocated: allocated_to(
                    &self.allocations,
                    &l.order_number,
                    &l.product_number,
                    &l.color,
                ),
            })
            .collect()
    }

    /// Mark a batch completed: allocate, close orders, add stock.
    ///
    /// Completion is a one-way gate. A batch that is already completed is
    /// rejected before anything is touched, so allocation never runs twice
    /// for the same batch.
    pub fn complete_batch(
        &mut self,
        receive_number: &str,
        arrival_date: NaiveDate,
    ) -> Result<BatchCompletion, LedgerError> {
        let batch = self
            .batch(receive_number)
            .ok_or_else(|| LedgerError::BatchNotFound(receive_number.to_string()))?;
        if batch.is_completed {
            return Err(LedgerError::BatchAlreadyCompleted(receive_number.to_string()));
        }
        let scope = Scope::new(batch.shop_id, batch.series_name.clone());

        let received: Vec<ReceiveLine> = self
            .receive_lines
            .iter()
            .filter(|l| l.receive_number == receive_number)
            .cloned()
            .collect();

        let mut completion = BatchCompletion {
            receive_number: receive_number.to_string(),
            shop_id: scope.shop_id,
            series_name: scope.series_name.clone(),
            arrival_date,
            allocations: Vec::new(),
            overflow: Vec::new(),
            dropped: Vec::new(),
            closed_orders: Vec::new(),
            stock_increments: Vec::new(),
        };

        // Each line sees the allocations made by the lines before it.
        for line in &received {
            let candidates = self.demand_for(&scope, &line.product_number, &line.color);
            let plan = plan_allocation(line.quantity, &candidates);

            let to_row = |order_number: &str, quantity: i64| Allocation {
                order_number: order_number.to_string(),
                receive_number: receive_number.to_string(),
                product_number: line.product_number.clone(),
                color: line.color.clone(),
                quantity,
            };

            let mut rows: Vec<Allocation> = plan
                .grants
                .iter()
                .map(|g| to_row(&g.order_number, g.quantity))
                .collect();
            if let Some(overflow) = &plan.overflow {
                let row = to_row(&overflow.order_number, overflow.quantity);
                completion.overflow.push(row.clone());
                rows.push(row);
            }
            if plan.dropped > 0 {
                completion.dropped.push(DroppedSurplus {
                    product_number: line.product_number.clone(),
                    color: line.color.clone(),
                    quantity: plan.dropped,
                });
            }

            self.allocations.extend(rows.iter().cloned());
            completion.allocations.extend(rows);
        }

        let scoped_lines = self
            .order_lines
            .iter()
            .filter(|l| scope.contains(l.shop_id, &l.series_name));
        for order_number in fully_satisfied_orders(scoped_lines, &self.allocations) {
            if let Some(order) = self.orders.iter_mut().find(|o| o.order_number == order_number) {
                if !order.is_closed || order.status != OrderStatus::Completed {
                    order.status = OrderStatus::Completed;
                    order.is_closed = true;
                    completion.closed_orders.push(order_number);
                }
            }
        }

        for line in &received {
            let delta = StockDelta {
                shop_id: scope.shop_id,
                series_name: scope.series_name.clone(),
                product_number: line.product_number.clone(),
                color: line.color.clone(),
                delta: line.quantity,
            };
            self.apply_stock_delta(&delta);
            completion.stock_increments.push(delta);
        }

        for line in self
            .receive_lines
            .iter_mut()
            .filter(|l| l.receive_number == receive_number)
        {
            line.actual_arrival_date = Some(arrival_date);
        }
        if let Some(batch) = self
            .batches
            .iter_mut()
            .find(|b| b.receive_number == receive_number)
        {
            batch.is_completed = true;
        }

        Ok(completion)
    }

    /// Add (or subtract) stock, creating the row on first use
    pub fn apply_stock_delta(&mut self, delta: &StockDelta) {
        match self.stock.iter_mut().find(|s| {
            s.is_for(
                delta.shop_id,
                &delta.series_name,
                &delta.product_number,
                &delta.color,
            )
        }) {
            Some(row) => row.stock_quantity += delta.delta,
            None => self.stock.push(StockOnHand {
                shop_id: delta.shop_id,
                series_name: delta.series_name.clone(),
                product_number: delta.product_number.clone(),
                color: delta.color.clone(),
                stock_quantity: delta.delta,
            }),
        }
    }

    /// Reset negative pending lines to zero and recompute affected statuses
    pub fn normalize_negative_pending(&mut self) -> NormalizationReport {
        let report = normalize_negative_pending(&mut self.order_lines, &self.allocations);
        for change in &report.status_changes {
            if let Some(order) = self
                .orders
                .iter_mut()
                .find(|o| o.order_number == change.order_number)
            {
                order.status = change.status;
                order.is_closed = change.is_closed;
            }
        }
        report
    }

    fn view_input(&self) -> ViewInput<'_> {
        ViewInput {
            orders: &self.orders,
            order_lines: &self.order_lines,
            batches: &self.batches,
            receive_lines: &self.receive_lines,
            allocations: &self.allocations,
        }
    }

    pub fn manufacturing_view(&self, scope: &Scope) -> Vec<ManufacturingRow> {
        manufacturing_view(&self.view_input(), scope)
    }

    pub fn in_transit_view(&self, scope: &Scope) -> Vec<InTransitRow> {
        in_transit_view(&self.view_input(), scope)
    }

    pub fn total_pending_view(&self, scope: &Scope) -> Vec<TotalPendingRow> {
        total_pending_view(&self.view_input(), scope)
    }
}
