//! Common types used across the platform

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A (shop, series) pair. Orders, receives, stock and sales all live inside one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Scope {
    pub shop_id: Uuid,
    pub series_name: String,
}

impl Scope {
    pub fn new(shop_id: Uuid, series_name: impl Into<String>) -> Self {
        Self {
            shop_id,
            series_name: series_name.into(),
        }
    }

    pub fn contains(&self, shop_id: Uuid, series_name: &str) -> bool {
        self.shop_id == shop_id && self.series_name == series_name
    }
}

/// Colors are free text entered by hand, so joins ignore case.
pub fn colors_match(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Key used when grouping by product and color.
pub fn product_color_key(product_number: &str, color: &str) -> (String, String) {
    (product_number.to_string(), color.to_lowercase())
}

/// Optional shop/series filter where "all" means no filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopeFilter {
    pub shop_id: Option<Uuid>,
    pub series_name: Option<String>,
}

impl ScopeFilter {
    /// Build a filter from path segments, treating "all" (any case) as a wildcard.
    pub fn from_segments(shop: &str, series: &str) -> Result<Self, &'static str> {
        let shop_id = if shop.eq_ignore_ascii_case("all") {
            None
        } else {
            Some(Uuid::parse_str(shop).map_err(|_| "Invalid shop id")?)
        };
        let series_name = if series.eq_ignore_ascii_case("all") {
            None
        } else {
            Some(series.to_string())
        };
        Ok(Self {
            shop_id,
            series_name,
        })
    }
}
