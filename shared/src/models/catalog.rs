//! Shop and series records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A shop that places orders and receives shipments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shop {
    pub id: Uuid,
    pub shop_number: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A named product line scoped to a shop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Series {
    pub id: Uuid,
    /// `None` for generic series shared by every shop
    pub shop_id: Option<Uuid>,
    pub series_name: String,
    /// Colors every product in the series comes in (e.g. "Golden", "Silver")
    pub colors: Vec<String>,
    pub unit: Option<String>,
    pub is_generic: bool,
    pub created_at: DateTime<Utc>,
}

impl Series {
    /// Whether the series is usable by the given shop
    pub fn available_to(&self, shop_id: Uuid) -> bool {
        self.is_generic || self.shop_id == Some(shop_id)
    }

    pub fn has_color(&self, color: &str) -> bool {
        self.colors.iter().any(|c| crate::colors_match(c, color))
    }
}
