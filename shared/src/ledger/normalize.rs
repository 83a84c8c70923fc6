//! Operator-invoked repair for negative pending quantities

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{allocated_to, compare_order_numbers, Allocation, OrderLine, OrderStatus};

/// A line whose stored quantity was raised so its pending is zero
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineAdjustment {
    pub order_number: String,
    pub product_number: String,
    pub color: String,
    pub previous_quantity: i64,
    pub new_quantity: i64,
}

/// New status for an order touched by normalization
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusChange {
    pub order_number: String,
    pub status: OrderStatus,
    pub is_closed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizationReport {
    pub adjusted_lines: Vec<LineAdjustment>,
    pub status_changes: Vec<StatusChange>,
}

impl NormalizationReport {
    pub fn is_empty(&self) -> bool {
        self.adjusted_lines.is_empty()
    }

    pub fn affected_orders(&self) -> Vec<&str> {
        self.status_changes.iter().map(|c| c.order_number.as_str()).collect()
    }
}

/// Status from per-line pending quantities.
///
/// All zero means completed, all positive means nothing arrived yet,
/// anything else is partial.
pub fn status_from_pending(pending: &[i64]) -> OrderStatus {
    if pending.iter().all(|p| *p == 0) {
        OrderStatus::Completed
    } else if pending.iter().all(|p| *p > 0) {
        OrderStatus::Pending
    } else {
        OrderStatus::Partial
    }
}

/// Reset every line with pending < 0 to pending 0 and recompute the status
/// of each affected order from all of its lines. Mutates `lines` in place.
pub fn normalize_negative_pending(
    lines: &mut [OrderLine],
    allocations: &[Allocation],
) -> NormalizationReport {
    let mut report = NormalizationReport::default();
    let mut affected = BTreeSet::new();

    for line in lines.iter_mut() {
        let allocated = allocated_to(
            allocations,
            &line.order_number,
            &line.product_number,
            &line.color,
        );
        if line.quantity - allocated < 0 {
            report.adjusted_lines.push(LineAdjustment {
                order_number: line.order_number.clone(),
                product_number: line.product_number.clone(),
                color: line.color.clone(),
                previous_quantity: line.quantity,
                new_quantity: allocated,
            });
            line.quantity = allocated;
            affected.insert(line.order_number.clone());
        }
    }

    let mut affected: Vec<String> = affected.into_iter().collect();
    affected.sort_by(|a, b| compare_order_numbers(a, b));

    for order_number in affected {
        let pending: Vec<i64> = lines
            .iter()
            .filter(|l| l.order_number == order_number)
            .map(|l| {
                l.quantity - allocated_to(allocations, &l.order_number, &l.product_number, &l.color)
            })
            .collect();
        let status = status_from_pending(&pending);
        report.status_changes.push(StatusChange {
            order_number,
            status,
            is_closed: status == OrderStatus::Completed,
        });
    }

    report
}
