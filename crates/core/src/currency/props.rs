//! Property-based tests for currency operations.
//!
//! - Base round trips stay within rounding tolerance
//! - Reconciled splits always sum to the rounded total
//! - Even splits are identical legs

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use tally_shared::SplitPolicy;

use super::allocation::AllocationUtil;
use super::rates::RateTable;

/// Strategy to generate positive decimal amounts (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate positive exchange rates (0.0001 to 10000.0000).
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

/// Strategy to generate party counts (1 to 50).
fn party_count() -> impl Strategy<Value = usize> {
    1usize..50
}

fn table_with(rate: Decimal) -> RateTable {
    RateTable::new(
        "USD",
        [("USD".to_string(), Decimal::ONE), ("XTS".to_string(), rate)],
    )
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Converting out of the base and back returns the amount within tolerance.
    #[test]
    fn prop_base_round_trip(
        amount in positive_amount(),
        rate in positive_rate(),
    ) {
        let table = table_with(rate);
        let there = table.convert("USD", "XTS", amount).unwrap();
        let back = table.convert("XTS", "USD", there).unwrap();
        let tolerance = Decimal::new(1, 8);
        prop_assert!(
            (back - amount).abs() <= tolerance,
            "{} -> {} -> {} drifted", amount, there, back
        );
    }

    /// Converting into the base and back returns the amount within tolerance.
    #[test]
    fn prop_reverse_round_trip(
        amount in positive_amount(),
        rate in positive_rate(),
    ) {
        let table = table_with(rate);
        let there = table.convert("XTS", "USD", amount).unwrap();
        let back = table.convert("USD", "XTS", there).unwrap();
        let tolerance = Decimal::new(1, 8);
        prop_assert!((back - amount).abs() <= tolerance);
    }

    /// Reconciled legs sum exactly to the rounded total and differ by at most one unit.
    #[test]
    fn prop_reconciled_split_sum_invariant(
        total in positive_amount(),
        count in party_count(),
    ) {
        let legs = AllocationUtil::split(total, count, SplitPolicy::Reconciled).unwrap();
        prop_assert_eq!(legs.len(), count);

        let sum: Decimal = legs.iter().copied().sum();
        let expected = total.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        prop_assert_eq!(sum, expected);

        let max = legs.iter().copied().max().unwrap();
        let min = legs.iter().copied().min().unwrap();
        prop_assert!(max - min <= Decimal::ONE);
        prop_assert!(legs.iter().all(|leg| leg.fract().is_zero()));
    }

    /// Even legs are all the same share of the total.
    #[test]
    fn prop_even_split_identical_legs(
        total in positive_amount(),
        count in party_count(),
    ) {
        let legs = AllocationUtil::split(total, count, SplitPolicy::Even).unwrap();
        prop_assert_eq!(legs.len(), count);
        prop_assert!(legs.iter().all(|leg| *leg == legs[0]));
    }
}
