//! WebAssembly module for the Product Tracker
//!
//! Runs the fulfillment engine in the browser so the receiving screen can
//! preview what completing a batch would allocate before submitting it.

use chrono::NaiveDate;
use serde::Serialize;
use shared::{
    compare_order_numbers, plan_allocation, validate_receive_number, week_id, Ledger,
    OrderDemand, Scope,
};
use uuid::Uuid;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

#[derive(Serialize)]
struct PendingViews {
    manufacturing: Vec<shared::ManufacturingRow>,
    in_transit: Vec<shared::InTransitRow>,
    total_pending: Vec<shared::TotalPendingRow>,
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization failed: {}", e))
}

fn parse_date(date: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| format!("Invalid date '{}'", date))
}

fn allocation_plan_json(quantity: i64, candidates_json: &str) -> Result<String, String> {
    let candidates: Vec<OrderDemand> = serde_json::from_str(candidates_json)
        .map_err(|e| format!("Invalid candidates JSON: {}", e))?;
    to_json(&plan_allocation(quantity, &candidates))
}

fn batch_completion_json(
    ledger_json: &str,
    receive_number: &str,
    arrival_date: &str,
) -> Result<(String, i64), String> {
    let mut ledger: Ledger =
        serde_json::from_str(ledger_json).map_err(|e| format!("Invalid ledger JSON: {}", e))?;
    let completion = ledger
        .complete_batch(receive_number, parse_date(arrival_date)?)
        .map_err(|e| e.to_string())?;
    let dropped = completion.dropped.iter().map(|d| d.quantity).sum();
    Ok((to_json(&completion)?, dropped))
}

fn pending_views_json(ledger_json: &str, shop_id: &str, series_name: &str) -> Result<String, String> {
    let ledger: Ledger =
        serde_json::from_str(ledger_json).map_err(|e| format!("Invalid ledger JSON: {}", e))?;
    let shop_id = Uuid::parse_str(shop_id).map_err(|_| "Invalid shop id".to_string())?;
    let scope = Scope::new(shop_id, series_name);

    to_json(&PendingViews {
        manufacturing: ledger.manufacturing_view(&scope),
        in_transit: ledger.in_transit_view(&scope),
        total_pending: ledger.total_pending_view(&scope),
    })
}

/// Preview how `quantity` units would be split across order demand.
///
/// `candidates_json` is an array of `{order_number, ordered, allocated}`.
#[wasm_bindgen]
pub fn preview_allocation(quantity: i64, candidates_json: &str) -> Result<String, JsValue> {
    allocation_plan_json(quantity, candidates_json).map_err(|e| JsValue::from_str(&e))
}

/// Run batch completion against a ledger snapshot and return the changes
#[wasm_bindgen]
pub fn preview_batch_completion(
    ledger_json: &str,
    receive_number: &str,
    arrival_date: Option<String>,
) -> Result<String, JsValue> {
    let arrival_date = arrival_date.unwrap_or_else(today);
    let (json, dropped) = batch_completion_json(ledger_json, receive_number, &arrival_date)
        .map_err(|e| JsValue::from_str(&e))?;
    if dropped > 0 {
        web_sys::console::warn_1(&JsValue::from_str(&format!(
            "{}: {} units have no matching order line",
            receive_number, dropped
        )));
    }
    Ok(json)
}

/// Manufacturing, in-transit and total pending views for one shop/series
#[wasm_bindgen]
pub fn pending_views(ledger_json: &str, shop_id: &str, series_name: &str) -> Result<String, JsValue> {
    pending_views_json(ledger_json, shop_id, series_name).map_err(|e| JsValue::from_str(&e))
}

/// ISO week id ("YYYY-WW") for a `YYYY-MM-DD` date
#[wasm_bindgen]
pub fn week_id_for(date: &str) -> Result<String, JsValue> {
    parse_date(date)
        .map(week_id)
        .map_err(|e| JsValue::from_str(&e))
}

/// Oldest-first comparison of order numbers, for sorting in JavaScript
#[wasm_bindgen]
pub fn compare_orders(a: &str, b: &str) -> i32 {
    compare_order_numbers(a, b) as i32
}

/// Numeric suffix of an order number, if it has one
#[wasm_bindgen]
pub fn order_sequence_of(order_number: &str) -> Option<f64> {
    order_sequence(order_number).map(|n| n as f64)
}

#[wasm_bindgen]
pub fn is_valid_receive_number(receive_number: &str) -> bool {
    validate_receive_number(receive_number).is_ok()
}

fn receive_number_after(prefix: &str, last: Option<&str>) -> Result<String, String> {
    next_receive_number(prefix, last).map_err(|e| e.to_string())
}

/// Next receive number, or an error when `last` cannot be continued
#[wasm_bindgen]
pub fn suggest_receive_number(prefix: &str, last: Option<String>) -> Result<String, JsValue> {
    receive_number_after(prefix, last.as_deref()).map_err(|e| JsValue::from_str(&e))
}

/// Local date from the browser clock
fn today() -> String {
    let now = js_sys::Date::new_0();
    format!(
        "{:04}-{:02}-{:02}",
        now.get_full_year(),
        now.get_month() + 1,
        now.get_date()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOP: &str = "00000000-0000-0000-0000-000000005107";

    fn ledger_json() -> String {
        let shop = Uuid::parse_str(SHOP).unwrap();
        let ledger = Ledger {
            orders: vec![Order {
                order_number: "VVI-1".to_string(),
                shop_id: shop,
                series_name: "Classic".to_string(),
                order_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                status: OrderStatus::Pending,
                is_closed: false,
            }],
            order_lines: vec![OrderLine {
                order_number: "VVI-1".to_string(),
                shop_id: shop,
                series_name: "Classic".to_string(),
                product_number: "P1".to_string(),
                color: "Golden".to_string(),
                quantity: 5,
            }],
            batches: vec![ReceiveBatch {
                receive_number: "RCV-0001".to_string(),
                shop_id: shop,
                series_name: "Classic".to_string(),
                dispatch_date: NaiveDate::from_ymd_opt(2024, 2, 1),
                estimated_arrival_date: None,
                mode_of_transport: None,
                notes: None,
                is_completed: false,
            }],
            receive_lines: vec![ReceiveLine {
                receive_number: "RCV-0001".to_string(),
                order_number: None,
                product_number: "P1".to_string(),
                color: "golden".to_string(),
                quantity: 3,
                actual_arrival_date: None,
            }],
            ..Ledger::default()
        };
        serde_json::to_string(&ledger).unwrap()
    }

    #[test]
    fn test_allocation_plan() {
        let candidates = r#"[
            {"order_number": "VVI-2", "ordered": 5, "allocated": 0},
            {"order_number": "VVI-1", "ordered": 5, "allocated": 0}
        ]"#;
        let plan: serde_json::Value =
            serde_json::from_str(&allocation_plan_json(7, candidates).unwrap()).unwrap();

        assert_eq!(plan["grants"][0]["order_number"], "VVI-1");
        assert_eq!(plan["grants"][0]["quantity"], 5);
        assert_eq!(plan["grants"][1]["quantity"], 2);
        assert_eq!(plan["dropped"], 0);
    }

    #[test]
    fn test_allocation_plan_rejects_bad_json() {
        assert!(allocation_plan_json(1, "not json").is_err());
    }

    #[test]
    fn test_batch_completion() {
        let (json, dropped) = batch_completion_json(&ledger_json(), "RCV-0001", "2024-03-01").unwrap();
        let completion: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(dropped, 0);
        assert_eq!(completion["allocations"][0]["quantity"], 3);
        assert_eq!(completion["closed_orders"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_batch_completion_bad_date() {
        assert!(batch_completion_json(&ledger_json(), "RCV-0001", "01/03/2024").is_err());
    }

    #[test]
    fn test_pending_views() {
        let views: serde_json::Value =
            serde_json::from_str(&pending_views_json(&ledger_json(), SHOP, "Classic").unwrap())
                .unwrap();

        assert_eq!(views["manufacturing"][0]["manufacturing_quantity"], 2);
        assert_eq!(views["in_transit"][0]["in_transit_quantity"], 3);
        assert_eq!(views["total_pending"][0]["pending_quantity"], 5);
    }

    #[test]
    fn test_compare_orders() {
        assert_eq!(compare_orders("VVI-2", "VVI-10"), -1);
        assert_eq!(compare_orders("VVI-10", "VVI-10"), 0);
        assert_eq!(order_sequence_of("VVI-42"), Some(42.0));
        assert_eq!(order_sequence_of("DRAFT"), None);
    }

    #[test]
    fn test_receive_numbers() {
        assert!(is_valid_receive_number("RCV-0001"));
        assert!(!is_valid_receive_number("RCV"));
        assert_eq!(receive_number_after("RCV", Some("RCV-0009")).unwrap(), "RCV-0010");
        assert_eq!(receive_number_after("RCV", None).unwrap(), "RCV-0001");
        assert!(receive_number_after("RCV", Some("RCV-999999999999999999")).is_err());
    }
}
