//! Stock movement tests for sales and receiving

mod common;

use common::*;
use proptest::prelude::*;
use shared::{apply_sale, InsufficientStock, StockDelta};

fn delta(product: &str, color: &str, delta: i64) -> StockDelta {
    StockDelta {
        shop_id: shop(),
        series_name: SERIES.to_string(),
        product_number: product.to_string(),
        color: color.to_string(),
        delta,
    }
}

#[test]
fn sale_beyond_stock_is_rejected() {
    assert_eq!(
        apply_sale(2, 3),
        Err(InsufficientStock {
            requested: 3,
            available: 2
        })
    );
}

#[test]
fn received_then_sold_then_returned() {
    let mut ledger = LedgerBuilder::new()
        .batch("RCV-0001", None, &[("P1", "Golden", 6)])
        .build();
    ledger.complete_batch("RCV-0001", date(2024, 3, 1)).unwrap();

    let available = ledger.stock_quantity(shop(), SERIES, "P1", "Golden");
    assert_eq!(apply_sale(available, 4), Ok(2));
    ledger.apply_stock_delta(&delta("P1", "golden", -4));
    assert_eq!(ledger.stock_quantity(shop(), SERIES, "P1", "Golden"), 2);

    ledger.apply_stock_delta(&delta("P1", "Golden", 4));
    assert_eq!(ledger.stock_quantity(shop(), SERIES, "P1", "Golden"), 6);
    assert_eq!(ledger.stock.len(), 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Accepted sales never drive stock below zero
    #[test]
    fn prop_sales_never_go_negative(
        start in 0i64..50,
        sales in prop::collection::vec(-10i64..20, 0..20)
    ) {
        let mut available = start;
        for sale in sales {
            if let Ok(next) = apply_sale(available, sale) {
                available = next;
            }
            prop_assert!(available >= 0);
        }
    }
}
