/*
    captable-engine
    Copyright (C) 2026 captable-engine contributors
*/

//! Cap-table aggregator.
//!
//! Combines the ledger, awards, convertibles, and the option plan into a
//! single ownership snapshot under a requested view.  The aggregator is
//! stateless: every call computes a fresh [`CapTableResult`] from the
//! snapshot it is handed and touches nothing outside its own frame.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::conversion::{convert, TriggerRound};
use crate::error::{EngineError, EngineResult};
use crate::records::{
    AwardKind, ConvertibleInstrument, EquityAward, OptionPlan, ShareLedgerEntry, Stakeholder,
};
use crate::rounding::percentage;
use crate::vesting::{rsu_countable, RsuInclusion};

// ── Views and options ──────────────────────────────────────────────────

/// Which layer of potential ownership the snapshot includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CapTableView {
    /// Ledger shares only.
    AsIssued,
    /// Ledger shares plus converted instruments.
    AsConverted,
    /// Everything: awards, RSUs per mode, and the unallocated pool.
    FullyDiluted,
}

/// Knobs for the fully diluted view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FullyDilutedOptions {
    /// Add the unallocated pool to the fully diluted total.
    pub include_unallocated_pool: bool,
    pub include_rsus: RsuInclusion,
    pub include_warrants: bool,
}

impl Default for FullyDilutedOptions {
    fn default() -> Self {
        Self {
            include_unallocated_pool: true,
            include_rsus: RsuInclusion::Granted,
            include_warrants: true,
        }
    }
}

/// Borrowed, read-only view of one company's equity records.
///
/// The caller guarantees internal consistency (one point in time); the
/// engine never mutates or retains any of it.
#[derive(Debug, Clone, Copy)]
pub struct CapTableSnapshot<'a> {
    pub ledger: &'a [ShareLedgerEntry],
    pub awards: &'a [EquityAward],
    pub convertibles: &'a [ConvertibleInstrument],
    pub option_plan: Option<&'a OptionPlan>,
    pub stakeholders: &'a HashMap<u64, Stakeholder>,
}

// ── Output ─────────────────────────────────────────────────────────────

/// One holder's line in the snapshot.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CapTableEntry {
    pub holder_id: u64,
    pub holder_name: String,
    pub shares: Decimal,
    pub ownership_percent: Decimal,
}

/// A computed ownership snapshot.  Created fresh per call, never
/// persisted by the engine.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CapTableResult {
    /// Per-holder entries, sorted by descending ownership.
    pub entries: Vec<CapTableEntry>,
    /// Sum of per-holder shares.
    pub total_shares: Decimal,
    /// Consideration paid into the ledger plus converted amounts.
    pub total_value: Decimal,
    /// Defined only for the fully diluted view; includes the pool.
    pub fully_diluted_shares: Option<Decimal>,
    pub as_of: NaiveDate,
}

// ── Aggregator ─────────────────────────────────────────────────────────

fn accumulate(
    holdings: &mut BTreeMap<u64, Decimal>,
    holder_id: u64,
    shares: Decimal,
) -> EngineResult<()> {
    let slot = holdings.entry(holder_id).or_default();
    *slot = slot
        .checked_add(shares)
        .ok_or(EngineError::PrecisionOverflow("holder share total"))?;
    Ok(())
}

/// The cap-table compute engine.
pub struct CapTableEngine {
    options: FullyDilutedOptions,
}

impl CapTableEngine {
    pub fn new(options: FullyDilutedOptions) -> Self {
        Self { options }
    }

    #[inline]
    pub fn options(&self) -> &FullyDilutedOptions {
        &self.options
    }

    /// Compute an ownership snapshot as of a date under the given view.
    ///
    /// `round` supplies conversion pricing for the as-converted layers;
    /// it is required only when a convertible's conversion date falls on
    /// or before `as_of`.
    pub fn compute(
        &self,
        snapshot: &CapTableSnapshot<'_>,
        view: CapTableView,
        as_of: NaiveDate,
        round: Option<&TriggerRound>,
    ) -> EngineResult<CapTableResult> {
        // BTreeMap keeps holder iteration deterministic.
        let mut holdings: BTreeMap<u64, Decimal> = BTreeMap::new();
        let mut total_value = Decimal::ZERO;

        for entry in snapshot.ledger {
            entry.validate()?;
            if entry.issue_date <= as_of {
                accumulate(&mut holdings, entry.holder_id, entry.quantity)?;
                total_value = total_value
                    .checked_add(entry.consideration)
                    .ok_or(EngineError::PrecisionOverflow("total consideration"))?;
            }
        }

        if view != CapTableView::AsIssued {
            for inst in snapshot.convertibles {
                let due = match inst.conversion_date {
                    Some(d) => d <= as_of,
                    None => false,
                };
                if !due {
                    continue;
                }
                let round = round.ok_or(EngineError::InvalidCapTableState(
                    "converted instrument present but no round context supplied",
                ))?;
                // Safe to unwrap the date: `due` required it above.
                let date = inst.conversion_date.unwrap_or(as_of);
                let outcome = convert(inst, round, date)?;
                accumulate(&mut holdings, inst.holder_id, outcome.shares_issued)?;
                total_value = total_value
                    .checked_add(outcome.converted_amount)
                    .ok_or(EngineError::PrecisionOverflow("total consideration"))?;
            }
        }

        let mut pool = Decimal::ZERO;
        if view == CapTableView::FullyDiluted {
            for award in snapshot.awards {
                award.validate()?;
                let countable = match award.kind {
                    AwardKind::StockOption => award.outstanding(),
                    AwardKind::Warrant => {
                        if self.options.include_warrants {
                            award.outstanding()
                        } else {
                            Decimal::ZERO
                        }
                    }
                    AwardKind::Rsu => rsu_countable(award, self.options.include_rsus, as_of)?,
                };
                if !countable.is_zero() {
                    accumulate(&mut holdings, award.holder_id, countable)?;
                }
            }

            if self.options.include_unallocated_pool {
                if let Some(plan) = snapshot.option_plan {
                    plan.validate()?;
                    // Pool capacity is a total-only addition; it is never
                    // attributed to an individual holder.
                    pool = plan.available();
                }
            }
        }

        let mut total_shares = Decimal::ZERO;
        for shares in holdings.values() {
            total_shares = total_shares
                .checked_add(*shares)
                .ok_or(EngineError::PrecisionOverflow("total share count"))?;
        }
        let fully_diluted_shares = match view {
            CapTableView::FullyDiluted => Some(
                total_shares
                    .checked_add(pool)
                    .ok_or(EngineError::PrecisionOverflow("fully diluted total"))?,
            ),
            _ => None,
        };
        let denominator = fully_diluted_shares.unwrap_or(total_shares);

        let mut entries: Vec<CapTableEntry> = holdings
            .into_iter()
            .filter(|(_, shares)| !shares.is_zero())
            .map(|(holder_id, shares)| CapTableEntry {
                holder_id,
                holder_name: snapshot
                    .stakeholders
                    .get(&holder_id)
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| format!("holder-{holder_id}")),
                shares,
                ownership_percent: percentage(shares, denominator),
            })
            .collect();
        entries.sort_by(|a, b| {
            b.ownership_percent
                .cmp(&a.ownership_percent)
                .then(a.holder_id.cmp(&b.holder_id))
        });

        log::debug!(
            "cap table {:?} as of {}: {} holders, {} shares, pool {}",
            view,
            as_of,
            entries.len(),
            total_shares,
            pool
        );

        Ok(CapTableResult {
            entries,
            total_shares,
            total_value,
            fully_diluted_shares,
            as_of,
        })
    }
}
