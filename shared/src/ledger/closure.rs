//! Order closure after allocation

use std::collections::BTreeMap;

use crate::{allocated_to, compare_order_numbers, Allocation, OrderLine};

/// Orders in scope whose total ordered minus total allocated is <= 0.
///
/// Only orders with at least one line are considered. Allocation rows that
/// do not match any line of the order are ignored. Result is oldest first.
pub fn fully_satisfied_orders<'a>(
    lines: impl IntoIterator<Item = &'a OrderLine>,
    allocations: &[Allocation],
) -> Vec<String> {
    let mut outstanding: BTreeMap<&str, i64> = BTreeMap::new();
    for line in lines {
        let allocated = allocated_to(
            allocations,
            &line.order_number,
            &line.product_number,
            &line.color,
        );
        *outstanding.entry(line.order_number.as_str()).or_insert(0) += line.quantity - allocated;
    }

    let mut satisfied: Vec<String> = outstanding
        .into_iter()
        .filter(|(_, remaining)| *remaining <= 0)
        .map(|(order_number, _)| order_number.to_string())
        .collect();
    satisfied.sort_by(|a, b| compare_order_numbers(a, b));
    satisfied
}
