//! HTTP handlers for the Product Tracker API

mod catalog;
mod health;
mod metrics;
mod orders;
mod pending;
mod receiving;
mod stock;
mod weekly_sales;

pub use catalog::*;
pub use health::*;
pub use metrics::*;
pub use orders::*;
pub use pending::*;
pub use receiving::*;
pub use stock::*;
pub use weekly_sales::*;

use serde::Deserialize;
use shared::ScopeFilter;
use uuid::Uuid;

/// `?shop_id=&series_name=` query filter shared by list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ScopeQuery {
    pub shop_id: Option<Uuid>,
    pub series_name: Option<String>,
}

impl From<ScopeQuery> for ScopeFilter {
    fn from(query: ScopeQuery) -> Self {
        ScopeFilter {
            shop_id: query.shop_id,
            series_name: query.series_name.filter(|s| !s.trim().is_empty()),
        }
    }
}
