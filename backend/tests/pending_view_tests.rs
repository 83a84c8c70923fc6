//! Pending view tests
//!
//! Manufacturing, in-transit and total pending read different signals and
//! are expected to disagree while goods are on the way.

mod common;

use common::*;
use shared::OrderStatus;

#[test]
fn views_diverge_while_goods_are_in_transit() {
    let ledger = LedgerBuilder::new()
        .order("VVI-1", &[("P1", "Golden", 10)])
        .batch("RCV-0001", Some(date(2024, 2, 1)), &[("P1", "Golden", 10)])
        .build();

    assert!(ledger.manufacturing_view(&scope()).is_empty());

    let in_transit = ledger.in_transit_view(&scope());
    assert_eq!(in_transit.len(), 1);
    assert_eq!(in_transit[0].in_transit_quantity, 10);

    let total = ledger.total_pending_view(&scope());
    assert_eq!(total.len(), 1);
    assert_eq!(total[0].pending_quantity, 10);
    assert_eq!(total[0].allocated_quantity, 0);
}

#[test]
fn completion_moves_goods_out_of_transit() {
    let mut ledger = LedgerBuilder::new()
        .order("VVI-1", &[("P1", "Golden", 10)])
        .batch("RCV-0001", Some(date(2024, 2, 1)), &[("P1", "Golden", 10)])
        .build();

    ledger.complete_batch("RCV-0001", date(2024, 3, 1)).unwrap();

    assert!(ledger.in_transit_view(&scope()).is_empty());
    assert!(ledger.total_pending_view(&scope()).is_empty());
    assert!(ledger.manufacturing_view(&scope()).is_empty());
}

mod manufacturing {
    use super::*;

    #[test]
    fn undispatched_batches_do_not_count() {
        let ledger = LedgerBuilder::new()
            .order("VVI-1", &[("P1", "Golden", 10)])
            .batch("RCV-0001", None, &[("P1", "Golden", 4)])
            .build();

        let rows = ledger.manufacturing_view(&scope());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].shipped_quantity, 0);
        assert_eq!(rows[0].manufacturing_quantity, 10);
    }

    #[test]
    fn untagged_shipments_spread_oldest_first() {
        let ledger = LedgerBuilder::new()
            .order("VVI-1", &[("P1", "Golden", 5)])
            .order("VVI-2", &[("P1", "Golden", 5)])
            .batch("RCV-0001", Some(date(2024, 2, 1)), &[("P1", "golden", 7)])
            .build();

        let rows = ledger.manufacturing_view(&scope());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].order_number, "VVI-2");
        assert_eq!(rows[0].shipped_quantity, 2);
        assert_eq!(rows[0].manufacturing_quantity, 3);
    }

    #[test]
    fn tagged_shipment_counts_against_its_order() {
        let ledger = LedgerBuilder::new()
            .order("VVI-1", &[("P1", "Golden", 5)])
            .order("VVI-2", &[("P1", "Golden", 5)])
            .batch("RCV-0001", Some(date(2024, 2, 1)), &[])
            .tagged_line("RCV-0001", "VVI-2", "P1", "Golden", 5)
            .build();

        let rows = ledger.manufacturing_view(&scope());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].order_number, "VVI-1");
        assert_eq!(rows[0].manufacturing_quantity, 5);
    }

    #[test]
    fn only_pending_orders_are_listed() {
        let mut ledger = LedgerBuilder::new()
            .order("VVI-1", &[("P1", "Golden", 5)])
            .order("VVI-2", &[("P1", "Silver", 5)])
            .build();
        ledger.orders[0].status = OrderStatus::Partial;

        let rows = ledger.manufacturing_view(&scope());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].order_number, "VVI-2");
    }
}

mod in_transit {
    use super::*;

    #[test]
    fn grouped_per_batch_and_sorted_by_dispatch() {
        let ledger = LedgerBuilder::new()
            .batch(
                "RCV-0002",
                Some(date(2024, 2, 10)),
                &[("P1", "Golden", 2), ("P1", "GOLDEN", 3)],
            )
            .batch("RCV-0001", Some(date(2024, 2, 20)), &[("P2", "Silver", 1)])
            .batch("RCV-0003", None, &[("P3", "Rose", 9)])
            .build();

        let rows = ledger.in_transit_view(&scope());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].receive_number, "RCV-0002");
        assert_eq!(rows[0].in_transit_quantity, 5);
        assert_eq!(rows[0].transport_mode.as_deref(), Some("Sea"));
        assert_eq!(rows[1].receive_number, "RCV-0001");
        assert_eq!(rows[1].eta_date, Some(date(2024, 3, 21)));
    }

    #[test]
    fn independent_of_orders() {
        let ledger = LedgerBuilder::new()
            .batch("RCV-0001", Some(date(2024, 2, 1)), &[("P9", "Golden", 4)])
            .build();

        assert_eq!(ledger.in_transit_view(&scope())[0].in_transit_quantity, 4);
    }
}

mod total_pending {
    use super::*;

    #[test]
    fn includes_every_order_status() {
        let mut ledger = LedgerBuilder::new()
            .order("VVI-1", &[("P1", "Golden", 5)])
            .build();
        ledger.orders[0].status = OrderStatus::Partial;

        let rows = ledger.total_pending_view(&scope());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].order_date, date(2024, 1, 1));
    }

    #[test]
    fn sorted_by_order_age() {
        let ledger = LedgerBuilder::new()
            .order("VVI-12", &[("P1", "Golden", 1)])
            .order("VVI-3", &[("P1", "Golden", 1)])
            .build();

        let rows = ledger.total_pending_view(&scope());
        let numbers: Vec<&str> = rows.iter().map(|r| r.order_number.as_str()).collect();
        assert_eq!(numbers, vec!["VVI-3", "VVI-12"]);
    }
}
