// captable-engine — Vesting and award position calculator
// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 captable-engine contributors

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::records::EquityAward;

// ── Types ──────────────────────────────────────────────────────────────

/// How RSUs count toward a fully diluted total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RsuInclusion {
    /// RSUs are excluded entirely.
    None,
    /// Count granted − canceled (RSUs have no exercise step).
    Granted,
    /// Count only the vested portion.
    Vested,
}

/// Point-in-time position for one award.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AwardPosition {
    pub granted: Decimal,
    /// granted − exercised − canceled − expired; ignores vesting.
    pub outstanding: Decimal,
    pub vested: Decimal,
    pub unvested: Decimal,
}

// ── Calendar arithmetic ────────────────────────────────────────────────

/// Whole calendar months between two dates, day-of-month aware.
///
/// `months_between(jan 15, mar 14)` is 1, not 2: the second month has
/// not fully elapsed.  Negative when `end` precedes `start`.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i64 {
    let mut months =
        i64::from(end.year() - start.year()) * 12 + i64::from(end.month()) - i64::from(start.month());
    if end.day() < start.day() {
        months -= 1;
    }
    months
}

// ── Vesting ────────────────────────────────────────────────────────────

/// Vested quantity of an award as of a date.
///
/// Linear monthly vesting gated by the cliff: before the cliff nothing
/// is vested; at or after the cliff the purely linear formula applies
/// with no lump at the cliff boundary.  A zero total duration vests the
/// full grant immediately.
pub fn vested_shares(award: &EquityAward, as_of: NaiveDate) -> EngineResult<Decimal> {
    award.validate()?;

    let elapsed = months_between(award.vesting_start, as_of);
    if elapsed < i64::from(award.cliff_months) {
        return Ok(Decimal::ZERO);
    }
    if award.total_months == 0 || elapsed >= i64::from(award.total_months) {
        return Ok(award.granted);
    }

    let vested = award
        .granted
        .checked_mul(Decimal::from(elapsed))
        .and_then(|v| v.checked_div(Decimal::from(award.total_months)))
        .ok_or(EngineError::PrecisionOverflow("vested shares"))?;
    Ok(vested.floor())
}

/// Full position for an award as of a date.
pub fn award_position(award: &EquityAward, as_of: NaiveDate) -> EngineResult<AwardPosition> {
    let vested = vested_shares(award, as_of)?;
    Ok(AwardPosition {
        granted: award.granted,
        outstanding: award.outstanding(),
        vested,
        unvested: award.granted - vested,
    })
}

/// RSU quantity countable under the given inclusion mode.
pub fn rsu_countable(
    award: &EquityAward,
    mode: RsuInclusion,
    as_of: NaiveDate,
) -> EngineResult<Decimal> {
    match mode {
        RsuInclusion::None => Ok(Decimal::ZERO),
        RsuInclusion::Granted => Ok(award.granted - award.canceled),
        RsuInclusion::Vested => vested_shares(award, as_of),
    }
}
