//! FIFO allocation of one receive line against outstanding order lines

use serde::{Deserialize, Serialize};

use crate::compare_order_numbers;

/// Outstanding demand on one order line when a receive line is allocated
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderDemand {
    pub order_number: String,
    pub ordered: i64,
    pub allocated: i64,
}

impl OrderDemand {
    pub fn pending(&self) -> i64 {
        self.ordered - self.allocated
    }
}

/// Quantity granted to one order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Grant {
    pub order_number: String,
    pub quantity: i64,
}

/// Result of allocating one receive line
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AllocationPlan {
    /// Regular grants, oldest order first, each within that order's pending
    pub grants: Vec<Grant>,
    /// Surplus pushed onto the last candidate after all demand was met
    pub overflow: Option<Grant>,
    /// Surplus with no candidate order to attach to
    pub dropped: i64,
}

impl AllocationPlan {
    /// Every grant including the overflow, in insertion order
    pub fn all_grants(&self) -> impl Iterator<Item = &Grant> {
        self.grants.iter().chain(self.overflow.iter())
    }

    pub fn total_granted(&self) -> i64 {
        self.all_grants().map(|g| g.quantity).sum()
    }
}

/// Candidates with pending > 0, oldest order first
pub fn open_candidates(candidates: &[OrderDemand]) -> Vec<&OrderDemand> {
    let mut open: Vec<&OrderDemand> = candidates.iter().filter(|c| c.pending() > 0).collect();
    open.sort_by(|a, b| compare_order_numbers(&a.order_number, &b.order_number));
    open
}

/// Allocate `quantity` received units across `candidates`.
///
/// Walks open candidates oldest first, granting `min(pending, remaining)`
/// until the quantity runs out. Whatever is left after every candidate is
/// satisfied goes to the last open candidate as a separate grant. With no
/// open candidates at all the surplus is reported as dropped.
pub fn plan_allocation(quantity: i64, candidates: &[OrderDemand]) -> AllocationPlan {
    let mut plan = AllocationPlan::default();
    if quantity <= 0 {
        return plan;
    }

    let open = open_candidates(candidates);
    let mut remaining = quantity;

    for candidate in &open {
        if remaining == 0 {
            break;
        }
        let grant = candidate.pending().min(remaining);
        if grant > 0 {
            plan.grants.push(Grant {
                order_number: candidate.order_number.clone(),
                quantity: grant,
            });
            remaining -= grant;
        }
    }

    if remaining > 0 {
        match open.last() {
            Some(last) => {
                plan.overflow = Some(Grant {
                    order_number: last.order_number.clone(),
                    quantity: remaining,
                });
            }
            None => plan.dropped = remaining,
        }
    }

    plan
}
