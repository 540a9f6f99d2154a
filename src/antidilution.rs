// captable-engine — Anti-dilution price adjustment
// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 captable-engine contributors

use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::rounding::round_money;

// ── Types ──────────────────────────────────────────────────────────────

/// Contractual anti-dilution protection on a preferred class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ProtectionKind {
    /// Adjusted price equals the new round price, unconditionally.
    FullRatchet,
    /// Broad-based weighted average of old and new prices.
    BroadBased,
}

/// Inputs for a down-round price adjustment.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AntiDilutionParams {
    /// Price the protected class originally paid.
    pub original_price: Decimal,
    /// Price of the new (lower) round.
    pub new_price: Decimal,
    /// Common-equivalent shares outstanding at adjustment time.
    pub outstanding_shares: Decimal,
    /// Shares issued in the new round.
    pub new_shares_issued: Decimal,
    /// Outstanding option shares, counted into the base per the flag.
    pub outstanding_options: Decimal,
    /// Unallocated pool shares, counted into the base per the flag.
    pub unallocated_pool: Decimal,
    pub include_options: bool,
    pub include_pool: bool,
    pub protection: ProtectionKind,
}

/// Adjusted conversion price and the weighted-average components.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AntiDilutionResult {
    pub adjusted_price: Decimal,
    /// Denominator base actually used (zero for full ratchet).
    pub base_shares: Decimal,
    /// Shares the new money would have bought at the original price
    /// (zero for full ratchet).
    pub equivalent_shares: Decimal,
}

// ── Adjustment ─────────────────────────────────────────────────────────

/// Compute the adjusted conversion price after a down round.
pub fn adjust_price(params: &AntiDilutionParams) -> EngineResult<AntiDilutionResult> {
    if params.original_price <= Decimal::ZERO || params.new_price <= Decimal::ZERO {
        return Err(EngineError::InvalidInstrument("prices must be positive"));
    }

    match params.protection {
        ProtectionKind::FullRatchet => Ok(AntiDilutionResult {
            adjusted_price: round_money(params.new_price),
            base_shares: Decimal::ZERO,
            equivalent_shares: Decimal::ZERO,
        }),
        ProtectionKind::BroadBased => {
            let mut base = params.outstanding_shares;
            if params.include_options {
                base += params.outstanding_options;
            }
            if params.include_pool {
                base += params.unallocated_pool;
            }
            if base <= Decimal::ZERO {
                return Err(EngineError::InvalidCapTableState(
                    "weighted-average base has no shares",
                ));
            }

            // Shares the new money would have bought at the old price.
            let equivalent = params
                .new_shares_issued
                .checked_mul(params.new_price)
                .and_then(|v| v.checked_div(params.original_price))
                .ok_or(EngineError::PrecisionOverflow("equivalent shares"))?;

            let adjusted = params
                .original_price
                .checked_mul(base + equivalent)
                .and_then(|v| v.checked_div(base + params.new_shares_issued))
                .ok_or(EngineError::PrecisionOverflow("adjusted price"))?;

            Ok(AntiDilutionResult {
                adjusted_price: round_money(adjusted),
                base_shares: base,
                equivalent_shares: equivalent,
            })
        }
    }
}
