/*
    captable-engine
    Copyright (C) 2026 captable-engine contributors
*/

//! # captable-engine
//!
//! Equity computation engine for cap-table management: turns a company's
//! raw equity records (share ledger, awards, convertibles, security
//! classes, option plan) into ownership snapshots, conversion outcomes,
//! round pricing, vesting positions, and liquidation payouts.
//!
//! The engine is purely functional: every component is a stateless
//! computation over immutable, caller-supplied records.  It performs no
//! I/O, persists nothing, and is safe to invoke concurrently for any
//! number of companies or as-of dates.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`records`] | Immutable equity value records |
//! | [`rounding`] | Canonical money/share rounding and safe percentages |
//! | [`vesting`] | Vesting and award position calculator |
//! | [`conversion`] | SAFE and convertible-note conversion |
//! | [`pricing`] | Priced-round modeling with option pool top-up |
//! | [`antidilution`] | Full-ratchet and broad-based price adjustment |
//! | [`captable`] | Cap-table aggregation under as-issued / as-converted / fully diluted views |
//! | [`waterfall`] | Liquidation waterfall by seniority tier |
//!
//! # Quick Start
//!
//! ```rust
//! use std::collections::HashMap;
//! use captable_engine::captable::{CapTableEngine, CapTableSnapshot, CapTableView, FullyDilutedOptions};
//! use captable_engine::records::ShareLedgerEntry;
//! use chrono::NaiveDate;
//! use rust_decimal::Decimal;
//!
//! let ledger = vec![ShareLedgerEntry {
//!     holder_id: 1,
//!     class_id: 1,
//!     quantity: Decimal::from(8_000_000),
//!     issue_date: NaiveDate::from_ymd_opt(2022, 1, 15).unwrap(),
//!     consideration: Decimal::from(8_000),
//! }];
//! let stakeholders = HashMap::new();
//! let snapshot = CapTableSnapshot {
//!     ledger: &ledger,
//!     awards: &[],
//!     convertibles: &[],
//!     option_plan: None,
//!     stakeholders: &stakeholders,
//! };
//!
//! let engine = CapTableEngine::new(FullyDilutedOptions::default());
//! let result = engine
//!     .compute(
//!         &snapshot,
//!         CapTableView::AsIssued,
//!         NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!         None,
//!     )
//!     .unwrap();
//! assert_eq!(result.total_shares, Decimal::from(8_000_000));
//! assert_eq!(result.entries[0].ownership_percent, Decimal::ONE_HUNDRED);
//! ```

pub mod antidilution;
pub mod captable;
pub mod conversion;
pub mod error;
/// Priced-round modeling with option pool top-up.
pub mod pricing;
pub mod records;
/// Canonical rounding for money and share values.
pub mod rounding;
pub mod vesting;
/// Liquidation waterfall by seniority tier.
pub mod waterfall;

pub use antidilution::{adjust_price, AntiDilutionParams, AntiDilutionResult, ProtectionKind};
pub use captable::{
    CapTableEngine, CapTableEntry, CapTableResult, CapTableSnapshot, CapTableView,
    FullyDilutedOptions,
};
pub use conversion::{accrued_interest, convert, ConversionOutcome, PriceBasis, TriggerRound};
pub use error::{EngineError, EngineResult};
pub use pricing::{price_round, PoolTopUp, RoundPricingParams, RoundPricingResult, TopUpTiming};
pub use records::{
    AwardKind, ConvertibleInstrument, ConvertibleTerms, EquityAward, OptionPlan, SecurityClass,
    ShareLedgerEntry, Stakeholder,
};
pub use rounding::{floor_money, percentage, round_money, round_money_to, round_shares};
pub use vesting::{
    award_position, months_between, rsu_countable, vested_shares, AwardPosition, RsuInclusion,
};
pub use waterfall::{ClassPayout, LiquidationWaterfall, WaterfallClass, WaterfallResult};
