// captable-engine — Canonical rounding for money and share values
// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 captable-engine contributors

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places for money values.
pub const MONEY_DP: u32 = 4;
/// Decimal places for share counts.
pub const SHARE_DP: u32 = 6;

/// Round a money value to [`MONEY_DP`] places, half-up.
///
/// Every computed money value must pass through here (or
/// [`round_money_to`]) before inclusion in a result, so repeated
/// computations over identical inputs are byte-identical.
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    round_money_to(value, MONEY_DP)
}

/// Round a money value to an explicit number of places, half-up.
#[inline]
pub fn round_money_to(value: Decimal, places: u32) -> Decimal {
    value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a share count to [`SHARE_DP`] places, half-up.
#[inline]
pub fn round_shares(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(SHARE_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a money value toward zero at [`MONEY_DP`] places.
///
/// Used for pro-rata splits, where half-up rounding of every share
/// could pay out fractionally more than the amount being split.
#[inline]
pub fn floor_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::ToZero)
}

/// Percentage of `part` in `whole`, rounded to [`MONEY_DP`] places.
///
/// Returns zero when `whole` is zero; never fails and never produces a
/// non-finite value.
#[inline]
pub fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    round_money(part / whole * Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn money_rounds_half_up() {
        assert_eq!(round_money(dec!(1.23455)), dec!(1.2346));
        assert_eq!(round_money(dec!(1.23454)), dec!(1.2345));
        assert_eq!(round_money(dec!(-1.23455)), dec!(-1.2346));
    }

    #[test]
    fn shares_round_to_six_places() {
        assert_eq!(round_shares(dec!(0.1234565)), dec!(0.123457));
        assert_eq!(round_shares(dec!(0.1234564)), dec!(0.123456));
    }

    #[test]
    fn explicit_places() {
        assert_eq!(round_money_to(dec!(1.005), 2), dec!(1.01));
        assert_eq!(round_money_to(dec!(1.005), 0), dec!(1));
    }

    #[test]
    fn floor_money_truncates() {
        assert_eq!(floor_money(dec!(1.23459)), dec!(1.2345));
        assert_eq!(floor_money(dec!(-1.23459)), dec!(-1.2345));
    }

    #[test]
    fn percentage_of_zero_whole_is_zero() {
        assert_eq!(percentage(dec!(50), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn percentage_basic() {
        assert_eq!(percentage(dec!(1), dec!(4)), dec!(25));
        assert_eq!(percentage(dec!(1), dec!(3)), dec!(33.3333));
    }

    #[test]
    fn rounding_preserves_already_rounded() {
        let v = dec!(1234.5678);
        assert_eq!(round_money(v), v);
    }

    proptest! {
        #[test]
        fn money_rounding_idempotent(units in -1_000_000_000i64..1_000_000_000i64, scale in 0u32..10) {
            let x = Decimal::new(units, scale);
            prop_assert_eq!(round_money(round_money(x)), round_money(x));
        }

        #[test]
        fn share_rounding_idempotent(units in -1_000_000_000i64..1_000_000_000i64, scale in 0u32..10) {
            let x = Decimal::new(units, scale);
            prop_assert_eq!(round_shares(round_shares(x)), round_shares(x));
        }

        #[test]
        fn percentage_never_exceeds_100_for_part_of_whole(
            part in 0i64..1_000_000,
            extra in 0i64..1_000_000,
        ) {
            let p = Decimal::from(part);
            let w = Decimal::from(part + extra);
            let pct = percentage(p, w);
            prop_assert!(pct >= Decimal::ZERO);
            prop_assert!(pct <= Decimal::ONE_HUNDRED);
        }
    }
}
