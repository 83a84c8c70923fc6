//! FIFO allocation and order closure tests
//!
//! Completing a receive batch allocates each line to open orders oldest
//! first, closes orders whose lines are all satisfied, and adds the
//! received quantity to stock.

mod common;

use common::*;
use proptest::prelude::*;
use shared::{plan_allocation, LedgerError, OrderDemand, OrderStatus};

// ============================================================================
// Batch completion
// ============================================================================

mod completion {
    use super::*;

    #[test]
    fn oldest_order_is_served_first() {
        let mut ledger = LedgerBuilder::new()
            .order("VVI-1", &[("P1", "Golden", 5)])
            .order("VVI-2", &[("P1", "Golden", 5)])
            .batch("RCV-0001", Some(date(2024, 2, 1)), &[("P1", "Golden", 7)])
            .build();

        let completion = ledger.complete_batch("RCV-0001", date(2024, 3, 1)).unwrap();

        assert_eq!(completion.allocations.len(), 2);
        assert_eq!(completion.allocations[0].order_number, "VVI-1");
        assert_eq!(completion.allocations[0].quantity, 5);
        assert_eq!(completion.allocations[1].order_number, "VVI-2");
        assert_eq!(completion.allocations[1].quantity, 2);

        assert_eq!(status(&ledger, "VVI-1"), OrderStatus::Completed);
        assert!(ledger.order("VVI-1").unwrap().is_closed);
        assert_eq!(status(&ledger, "VVI-2"), OrderStatus::Pending);
        assert_eq!(completion.closed_orders, vec!["VVI-1".to_string()]);
    }

    #[test]
    fn numeric_suffix_decides_age_not_string_order() {
        let mut ledger = LedgerBuilder::new()
            .order("VVI-10", &[("P1", "Golden", 4)])
            .order("VVI-9", &[("P1", "Golden", 4)])
            .batch("RCV-0001", None, &[("P1", "Golden", 4)])
            .build();

        let completion = ledger.complete_batch("RCV-0001", date(2024, 3, 1)).unwrap();

        assert_eq!(completion.allocations.len(), 1);
        assert_eq!(completion.allocations[0].order_number, "VVI-9");
    }

    #[test]
    fn exact_delivery_closes_order() {
        let mut ledger = LedgerBuilder::new()
            .order("VVI-1", &[("P1", "Golden", 3), ("P1", "Silver", 2)])
            .batch(
                "RCV-0001",
                Some(date(2024, 2, 1)),
                &[("P1", "Golden", 3), ("P1", "Silver", 2)],
            )
            .build();

        let completion = ledger.complete_batch("RCV-0001", date(2024, 3, 1)).unwrap();

        assert_eq!(completion.closed_orders, vec!["VVI-1".to_string()]);
        assert_eq!(status(&ledger, "VVI-1"), OrderStatus::Completed);
        assert!(ledger.total_pending_view(&scope()).is_empty());
    }

    #[test]
    fn partial_delivery_leaves_status_alone() {
        let mut ledger = LedgerBuilder::new()
            .order("VVI-1", &[("P1", "Golden", 3), ("P1", "Silver", 2)])
            .batch("RCV-0001", None, &[("P1", "Golden", 3)])
            .build();

        let completion = ledger.complete_batch("RCV-0001", date(2024, 3, 1)).unwrap();

        assert!(completion.closed_orders.is_empty());
        assert_eq!(status(&ledger, "VVI-1"), OrderStatus::Pending);
        assert!(!ledger.order("VVI-1").unwrap().is_closed);
    }

    #[test]
    fn colors_match_without_case() {
        let mut ledger = LedgerBuilder::new()
            .order("VVI-1", &[("P1", "Golden", 4)])
            .batch("RCV-0001", None, &[("P1", "GOLDEN", 4)])
            .build();

        ledger.complete_batch("RCV-0001", date(2024, 3, 1)).unwrap();

        assert_eq!(allocated(&ledger, "VVI-1", "P1", "Golden"), 4);
        assert_eq!(status(&ledger, "VVI-1"), OrderStatus::Completed);
    }

    #[test]
    fn over_delivery_lands_on_last_open_order() {
        let mut ledger = LedgerBuilder::new()
            .order("VVI-1", &[("P1", "Golden", 5)])
            .batch("RCV-0001", None, &[("P1", "Golden", 10)])
            .build();

        let completion = ledger.complete_batch("RCV-0001", date(2024, 3, 1)).unwrap();

        assert_eq!(completion.allocations.len(), 2);
        assert_eq!(completion.allocated_quantity(), 10);
        assert_eq!(completion.overflow.len(), 1);
        assert_eq!(completion.overflow[0].order_number, "VVI-1");
        assert_eq!(completion.overflow[0].quantity, 5);

        let pending = ledger.total_pending_view(&scope());
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].pending_quantity, -5);
    }

    #[test]
    fn surplus_without_any_open_order_is_dropped() {
        let mut ledger = LedgerBuilder::new()
            .order("VVI-1", &[("P1", "Golden", 5)])
            .batch("RCV-0001", None, &[("P2", "Golden", 6)])
            .build();

        let completion = ledger.complete_batch("RCV-0001", date(2024, 3, 1)).unwrap();

        assert!(completion.allocations.is_empty());
        assert_eq!(completion.dropped.len(), 1);
        assert_eq!(completion.dropped[0].product_number, "P2");
        assert_eq!(completion.dropped[0].quantity, 6);
        // Stock still receives the goods.
        assert_eq!(ledger.stock_quantity(shop(), SERIES, "P2", "Golden"), 6);
    }

    #[test]
    fn second_completion_is_rejected_without_new_rows() {
        let mut ledger = LedgerBuilder::new()
            .order("VVI-1", &[("P1", "Golden", 5)])
            .batch("RCV-0001", None, &[("P1", "Golden", 3)])
            .build();

        ledger.complete_batch("RCV-0001", date(2024, 3, 1)).unwrap();
        let rows_after_first = ledger.allocations.len();
        let stock_after_first = ledger.stock_quantity(shop(), SERIES, "P1", "Golden");

        let err = ledger
            .complete_batch("RCV-0001", date(2024, 3, 2))
            .unwrap_err();

        assert_eq!(err, LedgerError::BatchAlreadyCompleted("RCV-0001".to_string()));
        assert_eq!(ledger.allocations.len(), rows_after_first);
        assert_eq!(
            ledger.stock_quantity(shop(), SERIES, "P1", "Golden"),
            stock_after_first
        );
    }

    #[test]
    fn unknown_batch_is_not_found() {
        let mut ledger = LedgerBuilder::new().build();
        let err = ledger
            .complete_batch("RCV-9999", date(2024, 3, 1))
            .unwrap_err();
        assert_eq!(err, LedgerError::BatchNotFound("RCV-9999".to_string()));
    }

    #[test]
    fn completion_records_arrival_and_stock() {
        let mut ledger = LedgerBuilder::new()
            .order("VVI-1", &[("P1", "Golden", 5)])
            .batch("RCV-0001", None, &[("P1", "Golden", 2), ("P1", "Golden", 1)])
            .build();

        let completion = ledger.complete_batch("RCV-0001", date(2024, 3, 1)).unwrap();

        assert!(ledger.batch("RCV-0001").unwrap().is_completed);
        assert!(ledger
            .receive_lines
            .iter()
            .all(|l| l.actual_arrival_date == Some(date(2024, 3, 1))));
        assert_eq!(completion.stock_increments.len(), 2);
        assert_eq!(ledger.stock_quantity(shop(), SERIES, "P1", "golden"), 3);
        assert_eq!(allocated(&ledger, "VVI-1", "P1", "Golden"), 3);
    }

    #[test]
    fn later_lines_see_earlier_allocations_in_same_batch() {
        let mut ledger = LedgerBuilder::new()
            .order("VVI-1", &[("P1", "Golden", 4)])
            .order("VVI-2", &[("P1", "Golden", 4)])
            .batch("RCV-0001", None, &[("P1", "Golden", 3), ("P1", "Golden", 3)])
            .build();

        ledger.complete_batch("RCV-0001", date(2024, 3, 1)).unwrap();

        assert_eq!(allocated(&ledger, "VVI-1", "P1", "Golden"), 4);
        assert_eq!(allocated(&ledger, "VVI-2", "P1", "Golden"), 2);
    }

    #[test]
    fn other_scopes_are_untouched() {
        let mut ledger = LedgerBuilder::new()
            .order("VVI-1", &[("P1", "Golden", 5)])
            .batch("RCV-0001", None, &[("P1", "Golden", 5)])
            .build();
        ledger.order_lines[0].series_name = "Modern".to_string();
        ledger.orders[0].series_name = "Modern".to_string();

        let completion = ledger.complete_batch("RCV-0001", date(2024, 3, 1)).unwrap();

        assert!(completion.allocations.is_empty());
        assert_eq!(completion.dropped[0].quantity, 5);
    }
}

// ============================================================================
// Property tests
// ============================================================================

mod allocation_properties {
    use super::*;

    fn demand_strategy() -> impl Strategy<Value = Vec<OrderDemand>> {
        prop::collection::vec((0i64..20, 0i64..20), 0..8).prop_map(|pairs| {
            pairs
                .into_iter()
                .enumerate()
                .map(|(i, (ordered, allocated))| OrderDemand {
                    order_number: format!("VVI-{}", i + 1),
                    ordered,
                    allocated,
                })
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Every received unit is either granted or reported as dropped
        #[test]
        fn prop_quantity_is_conserved(
            quantity in 0i64..100,
            candidates in demand_strategy()
        ) {
            let plan = plan_allocation(quantity, &candidates);
            prop_assert_eq!(plan.total_granted() + plan.dropped, quantity);
        }

        /// Regular grants never exceed pending and follow order age
        #[test]
        fn prop_grants_respect_pending_and_fifo(
            quantity in 1i64..100,
            candidates in demand_strategy()
        ) {
            let plan = plan_allocation(quantity, &candidates);

            let mut last_sequence = 0;
            for grant in &plan.grants {
                let demand = candidates
                    .iter()
                    .find(|c| c.order_number == grant.order_number)
                    .unwrap();
                prop_assert!(grant.quantity > 0);
                prop_assert!(grant.quantity <= demand.pending());

                let sequence = shared::order_sequence(&grant.order_number).unwrap();
                prop_assert!(sequence > last_sequence);
                last_sequence = sequence;
            }
        }

        /// Overflow only appears once every open order is fully served
        #[test]
        fn prop_overflow_only_after_all_demand_met(
            quantity in 1i64..100,
            candidates in demand_strategy()
        ) {
            let plan = plan_allocation(quantity, &candidates);
            let open_pending: i64 = candidates
                .iter()
                .map(|c| c.pending())
                .filter(|p| *p > 0)
                .sum();

            match &plan.overflow {
                Some(overflow) => {
                    prop_assert_eq!(overflow.quantity, quantity - open_pending);
                    prop_assert_eq!(plan.dropped, 0);
                }
                None => prop_assert!(quantity <= open_pending || plan.dropped > 0),
            }
            if open_pending > 0 {
                prop_assert_eq!(plan.dropped, 0);
            }
        }

        /// After completion an order is closed exactly when nothing is outstanding
        #[test]
        fn prop_closure_matches_outstanding(
            ordered in prop::collection::vec(1i64..10, 1..5),
            received in 0i64..40
        ) {
            let mut builder = LedgerBuilder::new();
            for (i, quantity) in ordered.iter().enumerate() {
                builder = builder.order(&format!("VVI-{}", i + 1), &[("P1", "Golden", *quantity)]);
            }
            let mut ledger = builder
                .batch("RCV-0001", None, &[("P1", "Golden", received)])
                .build();

            ledger.complete_batch("RCV-0001", date(2024, 3, 1)).unwrap();

            for (i, quantity) in ordered.iter().enumerate() {
                let order_number = format!("VVI-{}", i + 1);
                let outstanding = quantity - allocated(&ledger, &order_number, "P1", "Golden");
                let order = ledger.order(&order_number).unwrap();
                prop_assert_eq!(order.is_closed, outstanding <= 0);
                prop_assert_eq!(order.status == OrderStatus::Completed, outstanding <= 0);
            }
        }
    }
}
