// captable-engine — Priced round modeling with option pool top-up
// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 captable-engine contributors

use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::rounding::{round_money, round_shares};

// ── Types ──────────────────────────────────────────────────────────────

/// When the option pool top-up is carved out relative to pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TopUpTiming {
    /// Pool created before pricing; dilutes existing holders only.
    Pre,
    /// Pool created after the investment; dilutes everyone pro-rata.
    Post,
}

/// Option pool top-up policy for a modeled round.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PoolTopUp {
    /// Target pool share of the relevant base, as a fraction in (0, 1).
    pub target_percentage: Decimal,
    pub timing: TopUpTiming,
}

/// Inputs for modeling a priced round.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RoundPricingParams {
    /// New money invested.
    pub investment: Decimal,
    /// Pre-money valuation of the company.
    pub pre_money_valuation: Decimal,
    /// Issued shares before the round.
    pub issued_shares: Decimal,
    /// Outstanding option shares before the round.
    pub outstanding_options: Decimal,
    /// Unallocated pool shares before the round.
    pub unallocated_pool: Decimal,
    pub pool_top_up: Option<PoolTopUp>,
}

/// Outcome of modeling a priced round.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RoundPricingResult {
    pub price_per_share: Decimal,
    /// Shares issued to the new investor.
    pub shares_issued: Decimal,
    /// New pool shares carved out by the top-up (zero without a policy).
    pub pool_shares_created: Decimal,
    pub total_shares_post_round: Decimal,
    pub post_money_valuation: Decimal,
    /// Percentage of the post-round total held by new shares (investor
    /// plus top-up pool).
    pub dilution_percent: Decimal,
}

// ── Pricing ────────────────────────────────────────────────────────────

/// Price a new round against the current fully diluted capitalization.
pub fn price_round(params: &RoundPricingParams) -> EngineResult<RoundPricingResult> {
    if params.investment <= Decimal::ZERO {
        return Err(EngineError::InvalidInstrument(
            "investment must be positive",
        ));
    }
    if params.pre_money_valuation <= Decimal::ZERO {
        return Err(EngineError::InvalidInstrument(
            "pre-money valuation must be positive",
        ));
    }
    if let Some(top_up) = &params.pool_top_up {
        if top_up.target_percentage <= Decimal::ZERO || top_up.target_percentage >= Decimal::ONE {
            return Err(EngineError::InvalidInstrument(
                "pool target percentage must be in (0, 1)",
            ));
        }
    }

    let mut pre_round_fd =
        params.issued_shares + params.outstanding_options + params.unallocated_pool;
    if pre_round_fd <= Decimal::ZERO {
        return Err(EngineError::InvalidCapTableState(
            "no pre-round fully diluted shares to price against",
        ));
    }

    // Pre-money top-up enlarges the pricing base so the new pool dilutes
    // existing holders, not the incoming investor.
    let mut pool_created = Decimal::ZERO;
    if let Some(top_up) = &params.pool_top_up {
        if top_up.timing == TopUpTiming::Pre {
            pool_created = top_up_shares(pre_round_fd, params.unallocated_pool, top_up)?;
            pre_round_fd += pool_created;
        }
    }

    let price_per_share = round_money(
        params
            .pre_money_valuation
            .checked_div(pre_round_fd)
            .ok_or(EngineError::PrecisionOverflow("price per share"))?,
    );
    if price_per_share <= Decimal::ZERO {
        return Err(EngineError::InvalidCapTableState(
            "price per share collapsed to zero",
        ));
    }

    let shares_issued = round_shares(
        params
            .investment
            .checked_div(price_per_share)
            .ok_or(EngineError::PrecisionOverflow("shares issued"))?,
    );

    // Post-money top-up is sized against the post-round total, diluting
    // old holders and the new investor alike.
    if let Some(top_up) = &params.pool_top_up {
        if top_up.timing == TopUpTiming::Post {
            let post_base = pre_round_fd + shares_issued;
            pool_created = top_up_shares(post_base, params.unallocated_pool, top_up)?;
        }
    }

    let total_post = pre_round_fd
        + shares_issued
        + if matches!(
            params.pool_top_up,
            Some(PoolTopUp {
                timing: TopUpTiming::Post,
                ..
            })
        ) {
            pool_created
        } else {
            Decimal::ZERO
        };

    let post_money_valuation = round_money(
        total_post
            .checked_mul(price_per_share)
            .ok_or(EngineError::PrecisionOverflow("post-money valuation"))?,
    );
    let dilution_percent = round_money(
        (shares_issued + pool_created)
            .checked_div(total_post)
            .ok_or(EngineError::PrecisionOverflow("dilution"))?
            * Decimal::ONE_HUNDRED,
    );

    log::debug!(
        "priced round: pps={} issued={} pool_created={} post_total={}",
        price_per_share,
        shares_issued,
        pool_created,
        total_post
    );

    Ok(RoundPricingResult {
        price_per_share,
        shares_issued,
        pool_shares_created: pool_created,
        total_shares_post_round: total_post,
        post_money_valuation,
        dilution_percent,
    })
}

/// Shares needed to lift the pool to the target fraction of `base`.
///
/// `target = base × pct / (1 − pct)`; never negative when the pool is
/// already at or above target.
fn top_up_shares(base: Decimal, current_pool: Decimal, top_up: &PoolTopUp) -> EngineResult<Decimal> {
    let target = base
        .checked_mul(top_up.target_percentage)
        .and_then(|v| v.checked_div(Decimal::ONE - top_up.target_percentage))
        .ok_or(EngineError::PrecisionOverflow("pool top-up"))?;
    let created = (target - current_pool).max(Decimal::ZERO);
    Ok(round_shares(created))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_params() -> RoundPricingParams {
        // $2M on $8M pre-money; 8M issued, 500k options, 500k pool.
        RoundPricingParams {
            investment: dec!(2000000),
            pre_money_valuation: dec!(8000000),
            issued_shares: dec!(8000000),
            outstanding_options: dec!(500000),
            unallocated_pool: dec!(500000),
            pool_top_up: None,
        }
    }

    #[test]
    fn prices_against_fully_diluted_base() {
        let result = price_round(&base_params()).unwrap();
        // preRoundFD = 9,000,000; 8M / 9M = 0.8889 money-rounded.
        assert_eq!(result.price_per_share, dec!(0.8889));
        // 2M / 0.8889 = 2,249,971.875352 shares (6 dp).
        assert_eq!(result.shares_issued, dec!(2249971.875352));
        assert_eq!(result.pool_shares_created, Decimal::ZERO);
        assert_eq!(result.total_shares_post_round, dec!(11249971.875352));
        // Post-money lands within a rounding hair of $10M.
        assert_eq!(result.post_money_valuation, dec!(10000100.0000));
        // New shares are ~20% of the post-round total.
        assert_eq!(result.dilution_percent, dec!(19.9998));
    }

    #[test]
    fn pre_money_top_up_dilutes_existing_holders_only() {
        let mut params = base_params();
        params.pool_top_up = Some(PoolTopUp {
            target_percentage: dec!(0.10),
            timing: TopUpTiming::Pre,
        });
        let result = price_round(&params).unwrap();

        // target = 9M * 0.1/0.9 = 1,000,000; created = 1M - 500k = 500k.
        assert_eq!(result.pool_shares_created, dec!(500000));
        // Pricing base grows to 9.5M before the investor buys in.
        assert_eq!(result.price_per_share, dec!(0.8421)); // 8M / 9.5M
        let expected_issued = round_shares(dec!(2000000) / dec!(0.8421));
        assert_eq!(result.shares_issued, expected_issued);
        assert_eq!(
            result.total_shares_post_round,
            dec!(9500000) + expected_issued
        );
    }

    #[test]
    fn pre_top_up_leaves_price_lower_than_no_top_up() {
        // Creating pool pre-money must lower the share price.
        let no_top_up = price_round(&base_params()).unwrap();
        let mut params = base_params();
        params.pool_top_up = Some(PoolTopUp {
            target_percentage: dec!(0.15),
            timing: TopUpTiming::Pre,
        });
        let with_top_up = price_round(&params).unwrap();
        assert!(with_top_up.price_per_share < no_top_up.price_per_share);
    }

    #[test]
    fn post_money_top_up_sized_against_post_round_total() {
        let mut params = base_params();
        params.pool_top_up = Some(PoolTopUp {
            target_percentage: dec!(0.10),
            timing: TopUpTiming::Post,
        });
        let result = price_round(&params).unwrap();

        // Price unaffected by a post-money top-up.
        assert_eq!(result.price_per_share, dec!(0.8889));
        let issued = result.shares_issued;
        // target = (9M + issued) * 0.1/0.9 - 500k
        let expected_pool = round_shares(
            (dec!(9000000) + issued) * dec!(0.10) / dec!(0.90) - dec!(500000),
        );
        assert_eq!(result.pool_shares_created, expected_pool);
        assert_eq!(
            result.total_shares_post_round,
            dec!(9000000) + issued + expected_pool
        );
    }

    #[test]
    fn top_up_already_at_target_creates_nothing() {
        let mut params = base_params();
        params.unallocated_pool = dec!(2000000); // well above 10% target
        params.pool_top_up = Some(PoolTopUp {
            target_percentage: dec!(0.10),
            timing: TopUpTiming::Pre,
        });
        let result = price_round(&params).unwrap();
        assert_eq!(result.pool_shares_created, Decimal::ZERO);
    }

    #[test]
    fn zero_pre_round_fd_rejected() {
        let params = RoundPricingParams {
            investment: dec!(1000000),
            pre_money_valuation: dec!(4000000),
            issued_shares: Decimal::ZERO,
            outstanding_options: Decimal::ZERO,
            unallocated_pool: Decimal::ZERO,
            pool_top_up: None,
        };
        assert_eq!(
            price_round(&params).unwrap_err(),
            EngineError::InvalidCapTableState(
                "no pre-round fully diluted shares to price against"
            )
        );
    }

    #[test]
    fn non_positive_investment_rejected() {
        let mut params = base_params();
        params.investment = Decimal::ZERO;
        assert!(matches!(
            price_round(&params).unwrap_err(),
            EngineError::InvalidInstrument(_)
        ));
    }

    #[test]
    fn non_positive_valuation_rejected() {
        let mut params = base_params();
        params.pre_money_valuation = dec!(-1);
        assert!(matches!(
            price_round(&params).unwrap_err(),
            EngineError::InvalidInstrument(_)
        ));
    }

    #[test]
    fn out_of_range_target_percentage_rejected() {
        let mut params = base_params();
        params.pool_top_up = Some(PoolTopUp {
            target_percentage: dec!(1),
            timing: TopUpTiming::Pre,
        });
        assert!(matches!(
            price_round(&params).unwrap_err(),
            EngineError::InvalidInstrument(_)
        ));
    }

    #[test]
    fn dilution_reflects_investor_and_pool_shares() {
        let mut params = base_params();
        params.pool_top_up = Some(PoolTopUp {
            target_percentage: dec!(0.10),
            timing: TopUpTiming::Pre,
        });
        let result = price_round(&params).unwrap();
        let expected = round_money(
            (result.shares_issued + result.pool_shares_created)
                / result.total_shares_post_round
                * Decimal::ONE_HUNDRED,
        );
        assert_eq!(result.dilution_percent, expected);
    }

    #[test]
    fn pricing_is_deterministic() {
        let params = base_params();
        assert_eq!(price_round(&params).unwrap(), price_round(&params).unwrap());
    }
}
