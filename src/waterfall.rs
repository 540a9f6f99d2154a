// captable-engine — Liquidation waterfall by seniority tier
// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 captable-engine contributors

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::rounding::{floor_money, round_money};

// ── Types ──────────────────────────────────────────────────────────────

/// One security class presented to the waterfall.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WaterfallClass {
    pub class_id: u64,
    pub name: String,
    /// Shares outstanding in this class.
    pub shares: Decimal,
    /// Liquidation preference multiple (0 for common).
    pub preference_multiple: Decimal,
    /// Shares in the post-preference pro-rata distribution.
    pub participating: bool,
    /// Payout priority; higher tiers are paid first.
    pub seniority: u32,
}

/// Per-class payout result.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClassPayout {
    pub class_id: u64,
    pub name: String,
    /// Preference amount actually received.
    pub preference_paid: Decimal,
    /// Participation amount received after preferences.
    pub participation_paid: Decimal,
    /// preference + participation.
    pub total: Decimal,
    /// Value if the class converted and took straight pro-rata instead.
    pub as_converted_value: Decimal,
    /// The greater of the waterfall total and the as-converted value;
    /// holders elect whichever pays more.
    pub optimal_value: Decimal,
    /// True when conversion beats the waterfall payout.
    pub converts: bool,
}

/// Result of running proceeds through the waterfall.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WaterfallResult {
    pub total_proceeds: Decimal,
    pub total_distributed: Decimal,
    /// Proceeds left over: no participating class to absorb them, plus
    /// any pro-rata rounding residue.
    pub undistributed: Decimal,
    /// One payout per input class, in input order.
    pub payouts: Vec<ClassPayout>,
}

// ── Waterfall ──────────────────────────────────────────────────────────

/// Distributes liquidation proceeds across security classes.
///
/// Preferences are paid in descending seniority order; classes sharing
/// a tier split an underfunded tier pro-rata by preference claim.  After
/// all preferences, remaining proceeds go pro-rata by share count to
/// participating classes.
pub struct LiquidationWaterfall {
    price_per_share: Decimal,
}

impl WaterfallClass {
    /// Build a waterfall input from a security class and its share count.
    pub fn from_security_class(class: &crate::records::SecurityClass, shares: Decimal) -> Self {
        Self {
            class_id: class.class_id,
            name: class.name.clone(),
            shares,
            preference_multiple: class.preference_multiple,
            participating: class.participating,
            seniority: class.seniority,
        }
    }
}

impl LiquidationWaterfall {
    pub fn new(price_per_share: Decimal) -> Self {
        Self { price_per_share }
    }

    /// Run proceeds through the waterfall.
    pub fn distribute(
        &self,
        proceeds: Decimal,
        classes: &[WaterfallClass],
    ) -> EngineResult<WaterfallResult> {
        if proceeds.is_sign_negative() {
            return Err(EngineError::InvalidInstrument(
                "liquidation proceeds must not be negative",
            ));
        }
        if self.price_per_share.is_sign_negative() {
            return Err(EngineError::InvalidInstrument(
                "price per share must not be negative",
            ));
        }

        let mut preference_paid = vec![Decimal::ZERO; classes.len()];
        let mut participation_paid = vec![Decimal::ZERO; classes.len()];

        // Group class indices by seniority; reverse iteration pays the
        // most senior tier first.
        let mut tiers: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for (i, class) in classes.iter().enumerate() {
            tiers.entry(class.seniority).or_default().push(i);
        }

        let mut remaining = proceeds;
        for members in tiers.values().rev() {
            if remaining <= Decimal::ZERO {
                break;
            }
            let claims: Vec<Decimal> = members
                .iter()
                .map(|&i| {
                    classes[i]
                        .shares
                        .checked_mul(classes[i].preference_multiple)
                        .and_then(|v| v.checked_mul(self.price_per_share))
                        .map(round_money)
                        .ok_or(EngineError::PrecisionOverflow("preference claim"))
                })
                .collect::<EngineResult<_>>()?;
            let mut tier_claim = Decimal::ZERO;
            for &claim in &claims {
                tier_claim = tier_claim
                    .checked_add(claim)
                    .ok_or(EngineError::PrecisionOverflow("tier claim total"))?;
            }
            if tier_claim.is_zero() {
                continue;
            }

            if remaining >= tier_claim {
                for (&i, &claim) in members.iter().zip(claims.iter()) {
                    preference_paid[i] = claim;
                }
                remaining -= tier_claim;
            } else {
                // Underfunded tier: pari-passu split by preference claim.
                // Splits truncate so the tier never pays more than it has.
                for (&i, &claim) in members.iter().zip(claims.iter()) {
                    preference_paid[i] = remaining
                        .checked_mul(claim)
                        .and_then(|v| v.checked_div(tier_claim))
                        .map(floor_money)
                        .ok_or(EngineError::PrecisionOverflow("pari-passu split"))?;
                }
                remaining = Decimal::ZERO;
            }
        }

        // Participation: remaining proceeds pro-rata by share count.
        let mut participating_shares = Decimal::ZERO;
        let mut total_shares = Decimal::ZERO;
        for class in classes {
            total_shares = total_shares
                .checked_add(class.shares)
                .ok_or(EngineError::PrecisionOverflow("total share count"))?;
            if class.participating {
                participating_shares += class.shares;
            }
        }
        if remaining > Decimal::ZERO && participating_shares > Decimal::ZERO {
            for (i, class) in classes.iter().enumerate() {
                if class.participating {
                    let paid = remaining
                        .checked_mul(class.shares)
                        .and_then(|v| v.checked_div(participating_shares))
                        .map(floor_money)
                        .ok_or(EngineError::PrecisionOverflow("participation split"))?;
                    participation_paid[i] = paid;
                }
            }
        }

        let mut payouts = Vec::with_capacity(classes.len());
        for (i, class) in classes.iter().enumerate() {
            let total = preference_paid[i] + participation_paid[i];
            let as_converted = if total_shares.is_zero() {
                Decimal::ZERO
            } else {
                proceeds
                    .checked_mul(class.shares)
                    .and_then(|v| v.checked_div(total_shares))
                    .map(round_money)
                    .ok_or(EngineError::PrecisionOverflow("as-converted value"))?
            };
            payouts.push(ClassPayout {
                class_id: class.class_id,
                name: class.name.clone(),
                preference_paid: preference_paid[i],
                participation_paid: participation_paid[i],
                total,
                as_converted_value: as_converted,
                optimal_value: as_converted.max(total),
                converts: as_converted > total,
            });
        }

        let total_distributed: Decimal = payouts.iter().map(|p| p.total).sum();

        Ok(WaterfallResult {
            total_proceeds: proceeds,
            total_distributed,
            undistributed: proceeds - total_distributed,
            payouts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn class(
        class_id: u64,
        name: &str,
        shares: Decimal,
        multiple: Decimal,
        participating: bool,
        seniority: u32,
    ) -> WaterfallClass {
        WaterfallClass {
            class_id,
            name: name.into(),
            shares,
            preference_multiple: multiple,
            participating,
            seniority,
        }
    }

    fn seed_stack() -> Vec<WaterfallClass> {
        vec![
            class(1, "Common", dec!(8000000), Decimal::ZERO, true, 0),
            class(2, "Series A", dec!(1000000), dec!(1), false, 2),
        ]
    }

    #[test]
    fn preference_paid_before_common() {
        let wf = LiquidationWaterfall::new(dec!(1.00));
        let result = wf.distribute(dec!(10000000), &seed_stack()).unwrap();

        let a = &result.payouts[1];
        assert_eq!(a.preference_paid, dec!(1000000)); // 1M * 1x * $1.00
        assert_eq!(a.participation_paid, Decimal::ZERO); // non-participating

        let common = &result.payouts[0];
        assert_eq!(common.preference_paid, Decimal::ZERO);
        assert_eq!(common.participation_paid, dec!(9000000));

        assert_eq!(result.total_distributed, dec!(10000000));
        assert_eq!(result.undistributed, Decimal::ZERO);
    }

    #[test]
    fn senior_class_takes_scarce_proceeds_first() {
        let wf = LiquidationWaterfall::new(dec!(1.00));
        let result = wf.distribute(dec!(500000), &seed_stack()).unwrap();

        // Series A's $1M preference is underfunded; it takes everything.
        assert_eq!(result.payouts[1].preference_paid, dec!(500000));
        assert_eq!(result.payouts[0].total, Decimal::ZERO);
        assert_eq!(result.undistributed, Decimal::ZERO);
    }

    #[test]
    fn multiple_tiers_pay_in_seniority_order() {
        let classes = vec![
            class(1, "Common", dec!(6000000), Decimal::ZERO, true, 0),
            class(2, "Series A", dec!(2000000), dec!(1), false, 1),
            class(3, "Series B", dec!(1000000), dec!(2), false, 2),
        ];
        let wf = LiquidationWaterfall::new(dec!(1.00));

        // $2.5M: B's 2x pref ($2M) fills first, A gets the remaining $500k
        // of its $2M claim, common gets nothing.
        let result = wf.distribute(dec!(2500000), &classes).unwrap();
        assert_eq!(result.payouts[2].preference_paid, dec!(2000000));
        assert_eq!(result.payouts[1].preference_paid, dec!(500000));
        assert_eq!(result.payouts[0].total, Decimal::ZERO);
    }

    #[test]
    fn pari_passu_tier_splits_pro_rata() {
        let classes = vec![
            class(1, "Series A-1", dec!(3000000), dec!(1), false, 1),
            class(2, "Series A-2", dec!(1000000), dec!(1), false, 1),
        ];
        let wf = LiquidationWaterfall::new(dec!(1.00));

        // Claims are $3M and $1M; only $2M available -> 3:1 split.
        let result = wf.distribute(dec!(2000000), &classes).unwrap();
        assert_eq!(result.payouts[0].preference_paid, dec!(1500000));
        assert_eq!(result.payouts[1].preference_paid, dec!(500000));
    }

    #[test]
    fn participating_preferred_double_dips() {
        let classes = vec![
            class(1, "Common", dec!(9000000), Decimal::ZERO, true, 0),
            class(2, "Series A", dec!(1000000), dec!(1), true, 1),
        ];
        let wf = LiquidationWaterfall::new(dec!(1.00));
        let result = wf.distribute(dec!(11000000), &classes).unwrap();

        let a = &result.payouts[1];
        assert_eq!(a.preference_paid, dec!(1000000));
        // Remaining $10M pro-rata over 10M participating shares.
        assert_eq!(a.participation_paid, dec!(1000000));
        assert_eq!(a.total, dec!(2000000));
        assert_eq!(result.payouts[0].participation_paid, dec!(9000000));
    }

    #[test]
    fn optimal_value_takes_conversion_when_better() {
        let wf = LiquidationWaterfall::new(dec!(1.00));
        let result = wf.distribute(dec!(100000000), &seed_stack()).unwrap();

        // $100M exit: Series A's 1x pref ($1M) is far below its 1/9
        // as-converted share (~$11.1M).
        let a = &result.payouts[1];
        assert!(a.converts);
        assert_eq!(a.as_converted_value, dec!(11111111.1111));
        assert_eq!(a.optimal_value, a.as_converted_value);

        // Small exit: preference beats conversion.
        let result = wf.distribute(dec!(3000000), &seed_stack()).unwrap();
        let a = &result.payouts[1];
        assert!(!a.converts);
        assert_eq!(a.optimal_value, a.total);
    }

    #[test]
    fn zero_proceeds_distributes_nothing() {
        let wf = LiquidationWaterfall::new(dec!(1.00));
        let result = wf.distribute(Decimal::ZERO, &seed_stack()).unwrap();
        assert_eq!(result.total_distributed, Decimal::ZERO);
        assert_eq!(result.undistributed, Decimal::ZERO);
        assert!(result.payouts.iter().all(|p| p.total.is_zero()));
    }

    #[test]
    fn negative_proceeds_rejected() {
        let wf = LiquidationWaterfall::new(dec!(1.00));
        assert!(matches!(
            wf.distribute(dec!(-1), &seed_stack()).unwrap_err(),
            EngineError::InvalidInstrument(_)
        ));
    }

    #[test]
    fn no_classes_leaves_proceeds_undistributed() {
        let wf = LiquidationWaterfall::new(dec!(1.00));
        let result = wf.distribute(dec!(5000000), &[]).unwrap();
        assert!(result.payouts.is_empty());
        assert_eq!(result.undistributed, dec!(5000000));
    }

    #[test]
    fn no_participating_class_leaves_residue() {
        let classes = vec![class(1, "Series A", dec!(1000000), dec!(1), false, 1)];
        let wf = LiquidationWaterfall::new(dec!(1.00));
        let result = wf.distribute(dec!(4000000), &classes).unwrap();
        assert_eq!(result.payouts[0].total, dec!(1000000));
        assert_eq!(result.undistributed, dec!(3000000));
    }

    #[test]
    fn payouts_preserve_input_order() {
        let classes = vec![
            class(9, "Common", dec!(1000), Decimal::ZERO, true, 0),
            class(3, "Series B", dec!(500), dec!(1), false, 2),
            class(5, "Series A", dec!(700), dec!(1), false, 1),
        ];
        let wf = LiquidationWaterfall::new(dec!(1.00));
        let result = wf.distribute(dec!(10000), &classes).unwrap();
        let ids: Vec<u64> = result.payouts.iter().map(|p| p.class_id).collect();
        assert_eq!(ids, vec![9, 3, 5]);
    }

    #[test]
    fn built_from_security_class() {
        let sc = crate::records::SecurityClass {
            class_id: 4,
            name: "Series B".into(),
            preference_multiple: dec!(1.5),
            participating: true,
            voting_multiplier: dec!(1),
            seniority: 3,
        };
        let wc = WaterfallClass::from_security_class(&sc, dec!(2000000));
        assert_eq!(wc.class_id, 4);
        assert_eq!(wc.shares, dec!(2000000));
        assert_eq!(wc.preference_multiple, dec!(1.5));
        assert!(wc.participating);
        assert_eq!(wc.seniority, 3);
    }

    #[test]
    fn overflowing_preference_claim_reports_error() {
        // shares * multiple * price exceeds Decimal range; the claim
        // must surface as an error, not a panic.
        let classes = vec![class(1, "Series A", Decimal::MAX, dec!(2), false, 1)];
        let wf = LiquidationWaterfall::new(dec!(1.00));
        assert_eq!(
            wf.distribute(dec!(1000000), &classes).unwrap_err(),
            EngineError::PrecisionOverflow("preference claim")
        );
    }

    #[test]
    fn overflowing_share_total_reports_error() {
        let classes = vec![
            class(1, "Common", Decimal::MAX, Decimal::ZERO, true, 0),
            class(2, "Also Common", Decimal::MAX, Decimal::ZERO, true, 0),
        ];
        let wf = LiquidationWaterfall::new(dec!(1.00));
        assert_eq!(
            wf.distribute(dec!(1000), &classes).unwrap_err(),
            EngineError::PrecisionOverflow("total share count")
        );
    }

    #[test]
    fn distribution_never_exceeds_proceeds() {
        let classes = vec![
            class(1, "Common", dec!(7000001), Decimal::ZERO, true, 0),
            class(2, "Series A", dec!(1999999), dec!(1.5), true, 1),
            class(3, "Series B", dec!(1000003), dec!(2), false, 2),
        ];
        let wf = LiquidationWaterfall::new(dec!(0.7301));
        for proceeds in [dec!(1), dec!(999999.1234), dec!(7500000), dec!(123456789)] {
            let result = wf.distribute(proceeds, &classes).unwrap();
            assert!(result.total_distributed <= proceeds);
            assert!(result.undistributed >= Decimal::ZERO);
        }
    }
}
