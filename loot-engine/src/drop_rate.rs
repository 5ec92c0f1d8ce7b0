//! Category drop rolls.
//!
//! Each candidate item is rolled against a 0–100 threshold derived from its
//! category and the party's rare-drop multiplier. The luck roll has to land
//! strictly above the threshold for the item to drop.

use serde::{Deserialize, Serialize};

use crate::category::ItemCategory;
use crate::constants::{
    GEM_DROP_PENALTY_CAP, NORMAL_DROP_PENALTY_PER_MULTIPLIER, THRESHOLD_CEILING, THRESHOLD_FLOOR,
    TICKET_MULTIPLIER, VALUABLE_DROP_PENALTY_PER_MULTIPLIER,
};
use crate::random::RandomSource;

/// Result of a single drop roll, kept with the numbers that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DropRollOutcome {
    pub will_drop: bool,
    pub luck_roll: f64,
    pub base_threshold: f64,
    pub final_threshold: f64,
}

/// Adjusts a category's base threshold before the roll.
///
/// Skill-driven additive or multiplicative corrections plug in here.
pub trait ThresholdCorrection {
    fn correct(&self, category: ItemCategory, base_threshold: f64) -> f64;
}

/// Leaves the base threshold untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCorrection;

impl ThresholdCorrection for IdentityCorrection {
    fn correct(&self, _category: ItemCategory, base_threshold: f64) -> f64 {
        base_threshold
    }
}

/// Clamp into `[0, 100]`; NaN maps to the ceiling so it can never drop.
fn clamp_threshold(value: f64) -> f64 {
    if value.is_nan() {
        return THRESHOLD_CEILING;
    }
    value.clamp(THRESHOLD_FLOOR, THRESHOLD_CEILING)
}

/// Threshold a luck roll must exceed for an item of `category` to drop.
#[must_use]
pub fn base_threshold(category: ItemCategory, rare_multiplier: f64, ticket_active: bool) -> f64 {
    let ticket = if ticket_active { TICKET_MULTIPLIER } else { 1.0 };
    let raw = match category {
        ItemCategory::Normal => {
            THRESHOLD_CEILING - rare_multiplier * NORMAL_DROP_PENALTY_PER_MULTIPLIER
        }
        ItemCategory::Good | ItemCategory::Rare => {
            let adjusted = rare_multiplier * ticket;
            THRESHOLD_CEILING - adjusted * VALUABLE_DROP_PENALTY_PER_MULTIPLIER
        }
        ItemCategory::Gem => {
            let adjusted = rare_multiplier * ticket;
            let penalty = (adjusted * VALUABLE_DROP_PENALTY_PER_MULTIPLIER).min(GEM_DROP_PENALTY_CAP);
            THRESHOLD_CEILING - penalty
        }
    };
    clamp_threshold(raw)
}

/// Rolls drops with a pluggable threshold correction.
#[derive(Debug, Clone, Copy, Default)]
pub struct DropRateCalculator<C = IdentityCorrection> {
    correction: C,
}

impl DropRateCalculator<IdentityCorrection> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            correction: IdentityCorrection,
        }
    }
}

impl<C: ThresholdCorrection> DropRateCalculator<C> {
    #[must_use]
    pub const fn with_correction(correction: C) -> Self {
        Self { correction }
    }

    /// Roll whether an item of `category` drops.
    pub fn roll<R>(
        &self,
        category: ItemCategory,
        rare_multiplier: f64,
        ticket_active: bool,
        party_luck: f64,
        rng: &mut R,
    ) -> DropRollOutcome
    where
        R: RandomSource + ?Sized,
    {
        let base_threshold = base_threshold(category, rare_multiplier, ticket_active);
        let final_threshold = clamp_threshold(self.correction.correct(category, base_threshold));
        let luck_roll = rng.next_luck_random(party_luck);
        let will_drop = final_threshold < luck_roll;
        log::debug!(
            "drop roll | {category} base {base_threshold:.3} final {final_threshold:.3} roll {luck_roll:.3} -> {will_drop}"
        );
        DropRollOutcome {
            will_drop,
            luck_roll,
            base_threshold,
            final_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{GameRandom, ScriptedRandom};

    const EXTREMES: [f64; 9] = [
        0.0,
        1.0,
        9.99,
        10.0,
        1_000.0,
        -50.0,
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::NAN,
    ];

    #[test]
    fn thresholds_stay_in_range_for_extreme_multipliers() {
        for category in ItemCategory::ALL {
            for multiplier in EXTREMES {
                for ticket in [false, true] {
                    let threshold = base_threshold(category, multiplier, ticket);
                    assert!(
                        (0.0..=100.0).contains(&threshold),
                        "{category} x{multiplier} ticket={ticket} gave {threshold}"
                    );
                }
            }
        }
    }

    #[test]
    fn category_formulas() {
        assert!((base_threshold(ItemCategory::Normal, 1.0, false) - 90.0).abs() < 1e-9);
        assert!((base_threshold(ItemCategory::Normal, 1.0, true) - 90.0).abs() < 1e-9);
        assert!((base_threshold(ItemCategory::Good, 1.0, false) - 99.9).abs() < 1e-9);
        assert!((base_threshold(ItemCategory::Rare, 1.0, true) - 99.8).abs() < 1e-9);
        assert!((base_threshold(ItemCategory::Gem, 3.0, true) - 99.4).abs() < 1e-9);
        assert!((base_threshold(ItemCategory::Gem, 30.0, true) - 99.0).abs() < 1e-9);
        assert!(base_threshold(ItemCategory::Normal, 12.0, false).abs() < 1e-9);
    }

    #[test]
    fn equal_roll_is_a_miss() {
        let calculator = DropRateCalculator::new();
        let mut rng = ScriptedRandom::new().with_luck_rolls([90.0, 90.000_001]);
        let miss = calculator.roll(ItemCategory::Normal, 1.0, false, 0.0, &mut rng);
        assert!(!miss.will_drop);
        assert!((miss.final_threshold - 90.0).abs() < 1e-9);
        let hit = calculator.roll(ItemCategory::Normal, 1.0, false, 0.0, &mut rng);
        assert!(hit.will_drop);
    }

    #[test]
    fn will_drop_matches_comparison_for_seeded_rolls() {
        let calculator = DropRateCalculator::new();
        let mut rng = GameRandom::seeded(99);
        for luck in [0.0, 10.0, 50.0, 95.0] {
            for category in ItemCategory::ALL {
                let outcome = calculator.roll(category, 1.3, false, luck, &mut rng);
                assert_eq!(
                    outcome.will_drop,
                    outcome.final_threshold < outcome.luck_roll
                );
                assert!(outcome.luck_roll >= luck);
            }
        }
    }

    struct Halve;

    impl ThresholdCorrection for Halve {
        fn correct(&self, _category: ItemCategory, base_threshold: f64) -> f64 {
            base_threshold / 2.0
        }
    }

    #[test]
    fn correction_hook_adjusts_final_threshold_only() {
        let calculator = DropRateCalculator::with_correction(Halve);
        let mut rng = ScriptedRandom::new().with_luck_rolls([50.0]);
        let outcome = calculator.roll(ItemCategory::Normal, 1.0, false, 0.0, &mut rng);
        assert!((outcome.base_threshold - 90.0).abs() < 1e-9);
        assert!((outcome.final_threshold - 45.0).abs() < 1e-9);
        assert!(outcome.will_drop);
    }
}
