/*
    captable-engine
    Copyright (C) 2026 captable-engine contributors
*/

//! Immutable value records consumed by the engine.
//!
//! The engine never owns or mutates these beyond the scope of a single
//! computation call; the surrounding data-access layer loads them and is
//! responsible for snapshot consistency.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

// ── Share ledger ───────────────────────────────────────────────────────

/// One share issuance or transfer leg.
///
/// A transfer is expressed as paired entries, never a negative quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareLedgerEntry {
    /// Stakeholder receiving the shares.
    pub holder_id: u64,
    /// Security class of the shares.
    pub class_id: u64,
    /// Number of shares (never negative).
    pub quantity: Decimal,
    /// Date the shares were issued.
    pub issue_date: NaiveDate,
    /// Consideration paid for the shares.
    pub consideration: Decimal,
}

impl ShareLedgerEntry {
    pub fn validate(&self) -> EngineResult<()> {
        if self.quantity.is_sign_negative() {
            return Err(EngineError::InvalidInstrument(
                "ledger quantity must not be negative",
            ));
        }
        Ok(())
    }
}

// ── Equity awards ──────────────────────────────────────────────────────

/// Kind of equity award.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AwardKind {
    StockOption,
    Rsu,
    Warrant,
}

/// An option, RSU, or warrant grant with its vesting schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityAward {
    pub holder_id: u64,
    pub kind: AwardKind,
    /// Quantity granted.
    pub granted: Decimal,
    /// Quantity exercised to date.
    pub exercised: Decimal,
    /// Quantity canceled (e.g. forfeited on termination).
    pub canceled: Decimal,
    /// Quantity expired unexercised.
    pub expired: Decimal,
    pub grant_date: NaiveDate,
    /// Date vesting begins (may differ from the grant date).
    pub vesting_start: NaiveDate,
    /// Cliff duration in whole months.
    pub cliff_months: u32,
    /// Total vesting duration in whole months.
    pub total_months: u32,
    /// Exercise price per share; zero for RSUs.
    pub strike_price: Decimal,
}

impl EquityAward {
    /// Outstanding (exercisable) quantity, independent of vesting.
    ///
    /// Vesting gates exercise eligibility at the application layer, not
    /// the outstanding count used by the aggregator.
    #[inline]
    pub fn outstanding(&self) -> Decimal {
        self.granted - self.exercised - self.canceled - self.expired
    }

    pub fn validate(&self) -> EngineResult<()> {
        for q in [self.granted, self.exercised, self.canceled, self.expired] {
            if q.is_sign_negative() {
                return Err(EngineError::InvalidInstrument(
                    "award quantities must not be negative",
                ));
            }
        }
        if self.exercised + self.canceled + self.expired > self.granted {
            return Err(EngineError::InvalidInstrument(
                "exercised + canceled + expired exceeds granted",
            ));
        }
        Ok(())
    }
}

// ── Convertible instruments ────────────────────────────────────────────

/// Kind-specific convertible terms.
///
/// SAFE and note fields are structurally separated so an instrument
/// cannot carry note-only fields (interest, maturity) under a SAFE kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConvertibleTerms {
    Safe {
        /// Discount off the round price, as a fraction in [0, 1).
        discount_rate: Option<Decimal>,
        /// Valuation cap for conversion pricing.
        valuation_cap: Option<Decimal>,
        /// Post-money SAFE: priced by target ownership, not cap/discount.
        post_money: bool,
    },
    Note {
        /// Simple annual interest rate, Actual/365 day count.
        interest_rate: Decimal,
        /// Maturity date of the note.
        maturity_date: NaiveDate,
        discount_rate: Option<Decimal>,
        valuation_cap: Option<Decimal>,
    },
}

/// A SAFE or convertible note held against a future priced round.
///
/// Pre-conversion it carries no share count; the conversion calculators
/// derive one from a triggering round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertibleInstrument {
    pub holder_id: u64,
    /// Framework label, e.g. "YC SAFE 2018" or "Series Seed Note".
    pub framework: String,
    /// Principal invested (must be positive).
    pub principal: Decimal,
    pub issue_date: NaiveDate,
    /// Date the instrument converted, if it has.
    pub conversion_date: Option<NaiveDate>,
    pub terms: ConvertibleTerms,
}

impl ConvertibleInstrument {
    pub fn validate(&self) -> EngineResult<()> {
        if self.principal <= Decimal::ZERO {
            return Err(EngineError::InvalidInstrument(
                "principal must be positive",
            ));
        }
        let (discount, cap) = match &self.terms {
            ConvertibleTerms::Safe {
                discount_rate,
                valuation_cap,
                post_money,
            } => {
                if *post_money && valuation_cap.is_none() {
                    return Err(EngineError::InvalidInstrument(
                        "post-money SAFE requires a valuation cap",
                    ));
                }
                (*discount_rate, *valuation_cap)
            }
            ConvertibleTerms::Note {
                interest_rate,
                discount_rate,
                valuation_cap,
                ..
            } => {
                if interest_rate.is_sign_negative() {
                    return Err(EngineError::InvalidInstrument(
                        "interest rate must not be negative",
                    ));
                }
                (*discount_rate, *valuation_cap)
            }
        };
        if let Some(d) = discount {
            if d < Decimal::ZERO || d >= Decimal::ONE {
                return Err(EngineError::InvalidInstrument(
                    "discount rate must be in [0, 1)",
                ));
            }
        }
        if let Some(c) = cap {
            if c <= Decimal::ZERO {
                return Err(EngineError::InvalidInstrument(
                    "valuation cap must be positive",
                ));
            }
        }
        Ok(())
    }
}

// ── Security classes and the option pool ───────────────────────────────

/// A class of stock with its liquidation and voting terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityClass {
    pub class_id: u64,
    pub name: String,
    /// Liquidation preference multiple (1x, 2x, ...).
    pub preference_multiple: Decimal,
    /// Whether the class participates after its preference is paid.
    pub participating: bool,
    /// Votes per share.
    pub voting_multiplier: Decimal,
    /// Payout priority; higher tiers are paid first.
    pub seniority: u32,
}

/// The employee option pool.
///
/// Available capacity is derived, never stored, so allocated and
/// available totals cannot drift apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionPlan {
    /// Total shares authorized under the plan.
    pub authorized: Decimal,
    /// Shares already allocated to individual awards.
    pub allocated: Decimal,
}

impl OptionPlan {
    /// Unallocated pool capacity: `authorized − allocated`.
    ///
    /// Pool capacity belongs to no stakeholder and must never appear as
    /// a per-holder entry in a snapshot.
    #[inline]
    pub fn available(&self) -> Decimal {
        self.authorized - self.allocated
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.authorized.is_sign_negative() || self.allocated.is_sign_negative() {
            return Err(EngineError::InvalidInstrument(
                "plan totals must not be negative",
            ));
        }
        if self.allocated > self.authorized {
            return Err(EngineError::InvalidInstrument(
                "allocated shares exceed authorized",
            ));
        }
        Ok(())
    }
}

/// Stakeholder identity used to label snapshot entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stakeholder {
    pub stakeholder_id: u64,
    pub name: String,
}
