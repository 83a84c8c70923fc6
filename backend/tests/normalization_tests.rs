//! Negative pending normalization tests

mod common;

use common::*;
use shared::{status_from_pending, OrderStatus};

#[test]
fn over_delivery_then_normalize_clears_negative_pending() {
    let mut ledger = LedgerBuilder::new()
        .order("VVI-1", &[("P1", "Golden", 5)])
        .batch("RCV-0001", None, &[("P1", "Golden", 10)])
        .build();
    ledger.complete_batch("RCV-0001", date(2024, 3, 1)).unwrap();
    assert_eq!(ledger.total_pending_view(&scope())[0].pending_quantity, -5);

    let report = ledger.normalize_negative_pending();

    assert_eq!(report.adjusted_lines.len(), 1);
    assert_eq!(report.adjusted_lines[0].previous_quantity, 5);
    assert_eq!(report.adjusted_lines[0].new_quantity, 10);
    assert!(ledger.total_pending_view(&scope()).is_empty());
    assert_eq!(status(&ledger, "VVI-1"), OrderStatus::Completed);
    assert!(ledger.order("VVI-1").unwrap().is_closed);
}

#[test]
fn mixed_lines_become_partial() {
    let mut ledger = LedgerBuilder::new()
        .order("VVI-1", &[("P1", "Golden", 2), ("P1", "Silver", 4)])
        .batch("RCV-0001", None, &[("P1", "Golden", 1)])
        .build();
    ledger.complete_batch("RCV-0001", date(2024, 3, 1)).unwrap();
    // A manual edit shrinks the Golden line below what already arrived.
    ledger.order_lines[0].quantity = 0;

    let report = ledger.normalize_negative_pending();

    assert_eq!(report.affected_orders(), vec!["VVI-1"]);
    assert_eq!(status(&ledger, "VVI-1"), OrderStatus::Partial);
    assert!(!ledger.order("VVI-1").unwrap().is_closed);
}

#[test]
fn negative_line_without_allocations_resets_to_zero() {
    let mut ledger = LedgerBuilder::new()
        .order("VVI-1", &[("P1", "Golden", -3)])
        .build();

    let report = ledger.normalize_negative_pending();

    assert_eq!(report.adjusted_lines[0].new_quantity, 0);
    assert_eq!(ledger.order_lines[0].quantity, 0);
    assert_eq!(status(&ledger, "VVI-1"), OrderStatus::Completed);
}

#[test]
fn healthy_ledger_is_left_alone() {
    let mut ledger = LedgerBuilder::new()
        .order("VVI-1", &[("P1", "Golden", 5)])
        .build();

    let report = ledger.normalize_negative_pending();

    assert!(report.is_empty());
    assert_eq!(status(&ledger, "VVI-1"), OrderStatus::Pending);
}

#[test]
fn status_from_line_pending() {
    assert_eq!(status_from_pending(&[0, 0]), OrderStatus::Completed);
    assert_eq!(status_from_pending(&[3, 1]), OrderStatus::Pending);
    assert_eq!(status_from_pending(&[0, 1]), OrderStatus::Partial);
}
