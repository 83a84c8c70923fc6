//! Weekly sales models

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One sheet of sales per shop/series/week
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklySalesSheet {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub series_name: String,
    /// ISO week, "YYYY-WW"
    pub week_id: String,
    pub is_closed: bool,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// A sale line on a weekly sheet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklySalesItem {
    pub id: Uuid,
    pub sheet_id: Uuid,
    pub product_number: String,
    pub color: String,
    pub quantity: i64,
    pub unit_price: Decimal,
}

/// ISO-8601 week id (weeks start Monday) for a date, e.g. "2024-01"
pub fn week_id(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-{:02}", week.year(), week.week())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_id() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(week_id(d(2024, 1, 1)), "2024-01");
        assert_eq!(week_id(d(2024, 12, 30)), "2025-01");
        assert_eq!(week_id(d(2021, 1, 3)), "2020-53");
        assert_eq!(week_id(d(2024, 6, 16)), "2024-24");
    }
}
