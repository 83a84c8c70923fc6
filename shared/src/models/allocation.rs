//! Allocation records

use serde::{Deserialize, Serialize};

/// "This many units of this receive batch satisfied this order line."
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Allocation {
    pub order_number: String,
    pub receive_number: String,
    pub product_number: String,
    pub color: String,
    pub quantity: i64,
}

impl Allocation {
    pub fn applies_to(&self, order_number: &str, product_number: &str, color: &str) -> bool {
        self.order_number == order_number
            && self.product_number == product_number
            && crate::colors_match(&self.color, color)
    }
}

/// Sum of allocations recorded against one order line
pub fn allocated_to<'a>(
    allocations: impl IntoIterator<Item = &'a Allocation>,
    order_number: &str,
    product_number: &str,
    color: &str,
) -> i64 {
    allocations
        .into_iter()
        .filter(|a| a.applies_to(order_number, product_number, color))
        .map(|a| a.quantity)
        .sum()
}
