//! Splitting a request total between its related parties.
//!
//! Two policies exist:
//! 1. `Even` divides the total by N and leaves each leg unrounded. Every leg
//!    is later rounded on its own, so the legs may drift from the total.
//! 2. `Reconciled` uses the Largest Remainder Method on whole units: round the
//!    total, give every leg the floor of the share, then hand the leftover
//!    units to the first legs. The legs always sum to the rounded total.

use rust_decimal::prelude::*;
use tally_shared::SplitPolicy;

use crate::error::LedgerError;

/// Allocation utility for distributing amounts.
pub struct AllocationUtil;

impl AllocationUtil {
    /// Splits `total` into `count` legs according to `policy`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `count` is zero.
    pub fn split(
        total: Decimal,
        count: usize,
        policy: SplitPolicy,
    ) -> Result<Vec<Decimal>, LedgerError> {
        if count == 0 {
            return Err(LedgerError::InvalidArgument(
                "cannot split an amount between zero parties".into(),
            ));
        }
        match policy {
            SplitPolicy::Even => Ok(Self::divide_even(total, count)),
            SplitPolicy::Reconciled => Ok(Self::allocate_equal(total, count)),
        }
    }

    /// `total / count` for every leg, unrounded.
    #[must_use]
    pub fn divide_even(total: Decimal, count: usize) -> Vec<Decimal> {
        if count == 0 {
            return vec![];
        }
        let share = total / Decimal::from(count);
        vec![share; count]
    }

    /// Allocates `total` equally in whole units, summing exactly to the
    /// rounded total.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use tally_core::currency::AllocationUtil;
    ///
    /// // 100 / 3 = [34, 33, 33]
    /// let result = AllocationUtil::allocate_equal(dec!(100), 3);
    /// assert_eq!(result, vec![dec!(34), dec!(33), dec!(33)]);
    /// ```
    #[must_use]
    pub fn allocate_equal(total: Decimal, count: usize) -> Vec<Decimal> {
        if count == 0 {
            return vec![];
        }

        let total_rounded = total.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        if count == 1 {
            return vec![total_rounded];
        }

        let count_dec = Decimal::from(count);

        // Round down to get the base allocation
        let base = (total_rounded / count_dec).trunc();

        // Leftover whole units, always fewer than `count`
        let remainder = total_rounded - base * count_dec;
        let extra_count = remainder.to_usize().unwrap_or(0);

        // First N legs get one extra unit
        (0..count)
            .map(|i| if i < extra_count { base + Decimal::ONE } else { base })
            .collect()
    }
}
