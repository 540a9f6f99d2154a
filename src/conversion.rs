// captable-engine — SAFE and convertible note conversion
// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 captable-engine contributors

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::records::{ConvertibleInstrument, ConvertibleTerms};
use crate::rounding::{round_money, round_shares};

// ── Types ──────────────────────────────────────────────────────────────

/// The priced round that triggers a conversion, supplied by the caller.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TriggerRound {
    /// Price per share of the new round.
    pub price_per_share: Decimal,
    /// Fully diluted share count immediately before the round.
    pub pre_round_fully_diluted: Decimal,
}

/// Which term produced the conversion price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PriceBasis {
    /// No cap or discount applied; converted at the round price.
    RoundPrice,
    /// Discounted round price won the comparison.
    Discount,
    /// Cap-derived price won the comparison.
    Cap,
    /// Post-money SAFE target-ownership pricing.
    PostMoneyTarget,
}

/// Outcome of converting one instrument into the triggering round.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConversionOutcome {
    /// Whole shares issued to the holder.
    pub shares_issued: Decimal,
    /// Effective price per share applied.
    pub conversion_price: Decimal,
    /// Amount that converted: principal, plus interest for notes.
    pub converted_amount: Decimal,
    /// Interest accrued (zero for SAFEs).
    pub accrued_interest: Decimal,
    pub price_basis: PriceBasis,
}

// ── Conversion ─────────────────────────────────────────────────────────

/// Convert a SAFE or note into shares of the triggering round.
///
/// Pure and idempotent: identical inputs always produce identical share
/// counts.  Notes accrue simple interest on an Actual/365 basis over the
/// exact calendar days between issue and conversion.
pub fn convert(
    instrument: &ConvertibleInstrument,
    round: &TriggerRound,
    conversion_date: NaiveDate,
) -> EngineResult<ConversionOutcome> {
    instrument.validate()?;
    if conversion_date < instrument.issue_date {
        return Err(EngineError::InvalidConversionDate {
            issue: instrument.issue_date,
            conversion: conversion_date,
        });
    }
    if round.price_per_share <= Decimal::ZERO {
        return Err(EngineError::InvalidCapTableState(
            "round price must be positive",
        ));
    }

    match &instrument.terms {
        ConvertibleTerms::Safe {
            discount_rate,
            valuation_cap,
            post_money,
        } => {
            if *post_money {
                // Cap presence is enforced by validate().
                let cap = valuation_cap.ok_or(EngineError::InvalidInstrument(
                    "post-money SAFE requires a valuation cap",
                ))?;
                convert_post_money_safe(instrument.principal, cap, round)
            } else {
                priced_conversion(
                    instrument.principal,
                    instrument.principal,
                    Decimal::ZERO,
                    *discount_rate,
                    *valuation_cap,
                    round,
                )
            }
        }
        ConvertibleTerms::Note {
            interest_rate,
            discount_rate,
            valuation_cap,
            ..
        } => {
            let interest = accrued_interest(
                instrument.principal,
                *interest_rate,
                instrument.issue_date,
                conversion_date,
            )?;
            let total = round_money(instrument.principal + interest);
            priced_conversion(
                instrument.principal,
                total,
                interest,
                *discount_rate,
                *valuation_cap,
                round,
            )
        }
    }
}

/// Simple interest on an Actual/365 day count.
///
/// Uses the exact calendar day difference, not a 30-day-month
/// approximation.
pub fn accrued_interest(
    principal: Decimal,
    annual_rate: Decimal,
    issue_date: NaiveDate,
    as_of: NaiveDate,
) -> EngineResult<Decimal> {
    if as_of < issue_date {
        return Err(EngineError::InvalidConversionDate {
            issue: issue_date,
            conversion: as_of,
        });
    }
    let days = (as_of - issue_date).num_days();
    let interest = principal
        .checked_mul(annual_rate)
        .and_then(|v| v.checked_mul(Decimal::from(days)))
        .and_then(|v| v.checked_div(Decimal::from(365_u32)))
        .ok_or(EngineError::PrecisionOverflow("accrued interest"))?;
    Ok(round_money(interest))
}

/// Cap/discount price comparison shared by pre-money SAFEs and notes.
///
/// The conversion price is the lower of the discounted round price and
/// the cap-derived price; whichever is defined wins alone, and with
/// neither the instrument converts at the round price.
fn priced_conversion(
    principal: Decimal,
    converting_amount: Decimal,
    interest: Decimal,
    discount_rate: Option<Decimal>,
    valuation_cap: Option<Decimal>,
    round: &TriggerRound,
) -> EngineResult<ConversionOutcome> {
    debug_assert!(principal > Decimal::ZERO);

    let discount_price = match discount_rate {
        Some(d) if d > Decimal::ZERO => Some(round_money(
            round.price_per_share * (Decimal::ONE - d),
        )),
        _ => None,
    };

    let cap_price = match valuation_cap {
        Some(cap) => {
            if round.pre_round_fully_diluted <= Decimal::ZERO {
                return Err(EngineError::InvalidCapTableState(
                    "cap pricing requires positive pre-round fully diluted shares",
                ));
            }
            let price = cap
                .checked_div(round.pre_round_fully_diluted)
                .ok_or(EngineError::PrecisionOverflow("cap price"))?;
            Some(round_money(price))
        }
        None => None,
    };

    let (price, basis) = match (discount_price, cap_price) {
        (Some(d), Some(c)) => {
            if c <= d {
                (c, PriceBasis::Cap)
            } else {
                (d, PriceBasis::Discount)
            }
        }
        (Some(d), None) => (d, PriceBasis::Discount),
        (None, Some(c)) => (c, PriceBasis::Cap),
        (None, None) => (round_money(round.price_per_share), PriceBasis::RoundPrice),
    };

    if price <= Decimal::ZERO {
        return Err(EngineError::InvalidCapTableState(
            "conversion price collapsed to zero",
        ));
    }

    let shares = converting_amount
        .checked_div(price)
        .ok_or(EngineError::PrecisionOverflow("conversion shares"))?
        .floor();

    Ok(ConversionOutcome {
        shares_issued: round_shares(shares),
        conversion_price: price,
        converted_amount: converting_amount,
        accrued_interest: interest,
        price_basis: basis,
    })
}

/// Post-money SAFE: solve for the share count that gives the investor
/// `principal / cap` ownership after conversion, rather than pricing
/// against the round directly.
fn convert_post_money_safe(
    principal: Decimal,
    cap: Decimal,
    round: &TriggerRound,
) -> EngineResult<ConversionOutcome> {
    if round.pre_round_fully_diluted <= Decimal::ZERO {
        return Err(EngineError::InvalidCapTableState(
            "post-money conversion requires positive pre-round fully diluted shares",
        ));
    }
    let target = principal
        .checked_div(cap)
        .ok_or(EngineError::PrecisionOverflow("target ownership"))?;
    if target >= Decimal::ONE {
        return Err(EngineError::InvalidInstrument(
            "post-money principal meets or exceeds the valuation cap",
        ));
    }

    // shares / (preRoundFD + shares) == target
    let shares = target
        .checked_mul(round.pre_round_fully_diluted)
        .and_then(|v| v.checked_div(Decimal::ONE - target))
        .ok_or(EngineError::PrecisionOverflow("post-money shares"))?
        .floor();
    if shares <= Decimal::ZERO {
        return Err(EngineError::InvalidCapTableState(
            "post-money conversion yields no shares",
        ));
    }
    let price = round_money(
        principal
            .checked_div(shares)
            .ok_or(EngineError::PrecisionOverflow("post-money price"))?,
    );

    Ok(ConversionOutcome {
        shares_issued: round_shares(shares),
        conversion_price: price,
        converted_amount: principal,
        accrued_interest: Decimal::ZERO,
        price_basis: PriceBasis::PostMoneyTarget,
    })
}
