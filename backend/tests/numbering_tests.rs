//! Order, receive and week numbering tests

use chrono::NaiveDate;
use proptest::prelude::*;
use shared::{
    compare_order_numbers, next_order_number, next_receive_number, validate_receive_number,
    validate_week_id, week_id,
};
use std::cmp::Ordering;

mod order_numbers {
    use super::*;

    #[test]
    fn next_follows_highest_suffix() {
        let existing = ["VVI-1", "VVI-10", "VVI-9"];
        assert_eq!(next_order_number("VVI", existing), "VVI-11");
    }

    #[test]
    fn first_order_is_one() {
        assert_eq!(next_order_number("VVI", std::iter::empty()), "VVI-1");
    }

    #[test]
    fn unparseable_numbers_sort_last() {
        assert_eq!(compare_order_numbers("VVI-2", "LEGACY"), Ordering::Less);
        assert_eq!(compare_order_numbers("LEGACY", "VVI-2"), Ordering::Greater);
    }

    proptest! {
        #[test]
        fn prop_suffix_order_is_numeric(a in 1i64..100_000, b in 1i64..100_000) {
            let x = format!("VVI-{}", a);
            let y = format!("VVI-{}", b);
            prop_assert_eq!(compare_order_numbers(&x, &y), a.cmp(&b));
        }
    }
}

mod receive_numbers {
    use super::*;

    /// Same ordering the server uses to pick the last receive number
    fn latest_first(a: &str, b: &str) -> Ordering {
        b.len().cmp(&a.len()).then_with(|| b.cmp(a))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_next_sorts_ahead_of_last(n in 0u64..999_999_999_999_999_999) {
            let last = format!("RCV-{:04}", n);
            prop_assume!(validate_receive_number(&last).is_ok());

            let next = next_receive_number("RCV", Some(&last)).unwrap();
            prop_assert!(validate_receive_number(&next).is_ok());
            prop_assert_eq!(latest_first(&next, &last), Ordering::Less);
        }
    }
}

mod weeks {
    use super::*;

    #[test]
    fn iso_week_ids() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(week_id(d(2024, 3, 4)), "2024-10");
        assert_eq!(week_id(d(2026, 1, 1)), "2026-01");
        assert!(validate_week_id(&week_id(d(2020, 12, 31))).is_ok());
        assert!(validate_week_id("2024-54").is_err());
    }
}
