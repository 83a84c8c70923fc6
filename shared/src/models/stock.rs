//! Stock on hand

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Running balance per shop/series/product/color.
///
/// Incremented by completed receive lines, decremented by sales. Derived
/// data: it can be rebuilt from the receive and sales history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockOnHand {
    pub shop_id: Uuid,
    pub series_name: String,
    pub product_number: String,
    pub color: String,
    pub stock_quantity: i64,
}

impl StockOnHand {
    pub fn is_for(&self, shop_id: Uuid, series_name: &str, product_number: &str, color: &str) -> bool {
        self.shop_id == shop_id
            && self.series_name == series_name
            && self.product_number == product_number
            && crate::colors_match(&self.color, color)
    }
}

/// Additive change to one stock row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockDelta {
    pub shop_id: Uuid,
    pub series_name: String,
    pub product_number: String,
    pub color: String,
    pub delta: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Insufficient stock: requested {requested}, available {available}")]
pub struct InsufficientStock {
    pub requested: i64,
    pub available: i64,
}

/// Balance after selling `additional` more units.
///
/// Negative `additional` (a sale reduced or removed) always succeeds.
pub fn apply_sale(available: i64, additional: i64) -> Result<i64, InsufficientStock> {
    if additional > available {
        return Err(InsufficientStock {
            requested: additional,
            available,
        });
    }
    Ok(available - additional)
}
