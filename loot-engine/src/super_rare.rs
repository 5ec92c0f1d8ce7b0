//! Super-rare title escalation and the state that throttles it.
//!
//! [`DailySuperRareState`] outlives a battle and is round-tripped through the
//! caller's storage; [`SessionSuperRareState`] lives for one resolution call.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::category::ItemCategory;
use crate::constants::{
    BOSS_MULTIPLIER_COMMON, BOSS_MULTIPLIER_GEM, BOSS_MULTIPLIER_RARE, BOSS_TIER_TITLE_ID,
    SUPER_RARE_FIRST_DENOMINATOR, SUPER_RARE_REPEAT_DENOMINATOR, SUPER_RARE_SESSION_REPEAT_CHANCE,
};
use crate::data::{SuperRareTitle, SuperRareTitleId, TitleDef, TitleId};
use crate::random::RandomSource;
use crate::titles::{select_super_rare_title, should_remove_normal_title_after_super_rare};

/// Calendar day packed as `YYYYMMDD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct DayKey(pub u32);

impl DayKey {
    #[must_use]
    pub const fn from_ymd(year: u32, month: u32, day: u32) -> Self {
        Self(year * 10_000 + month * 100 + day)
    }

    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08}", self.0)
    }
}

/// Whether a super-rare title has fired yet on a given day.
///
/// The engine only ever flips `has_triggered` from `false` to `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct DailySuperRareState {
    date: DayKey,
    has_triggered: bool,
}

impl DailySuperRareState {
    /// Fresh, untriggered state for `date`.
    #[must_use]
    pub const fn new(date: DayKey) -> Self {
        Self {
            date,
            has_triggered: false,
        }
    }

    /// Rebuild state loaded from storage.
    #[must_use]
    pub const fn restore(date: DayKey, has_triggered: bool) -> Self {
        Self {
            date,
            has_triggered,
        }
    }

    /// State to use on `today`: unchanged on the same day, fresh otherwise.
    #[must_use]
    pub const fn rollover(self, today: DayKey) -> Self {
        if self.date.0 == today.0 {
            self
        } else {
            Self::new(today)
        }
    }

    #[must_use]
    pub const fn date(&self) -> DayKey {
        self.date
    }

    #[must_use]
    pub const fn has_triggered(&self) -> bool {
        self.has_triggered
    }

    /// Denominator for today's next super-rare roll.
    #[must_use]
    pub const fn denominator(&self) -> u32 {
        if self.has_triggered {
            SUPER_RARE_REPEAT_DENOMINATOR
        } else {
            SUPER_RARE_FIRST_DENOMINATOR
        }
    }

    const fn mark_triggered(&mut self) {
        self.has_triggered = true;
    }
}

/// Per-battle throttle for repeat super-rare rolls on normal-category items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSuperRareState {
    normal_item_already_triggered: bool,
}

impl SessionSuperRareState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            normal_item_already_triggered: false,
        }
    }

    #[must_use]
    pub const fn normal_item_already_triggered(&self) -> bool {
        self.normal_item_already_triggered
    }
}

/// Result of a super-rare evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuperRareOutcome {
    /// The normal title stands and nothing else is attached.
    NotTriggered,
    Triggered {
        title_id: SuperRareTitleId,
        strip_normal_title: bool,
    },
}

/// Boss-tier enemy bonus for the super-rare threshold.
#[must_use]
pub const fn enemy_multiplier(enemy_title_id: Option<TitleId>, category: ItemCategory) -> u32 {
    match enemy_title_id {
        Some(id) if id >= BOSS_TIER_TITLE_ID => match category {
            ItemCategory::Normal | ItemCategory::Good => BOSS_MULTIPLIER_COMMON,
            ItemCategory::Rare => BOSS_MULTIPLIER_RARE,
            ItemCategory::Gem => BOSS_MULTIPLIER_GEM,
        },
        _ => 1,
    }
}

/// Inputs to a super-rare evaluation besides the state it mutates.
#[derive(Debug, Clone, Copy)]
pub struct SuperRareRequest<'a> {
    pub normal_title: &'a TitleDef,
    pub category: ItemCategory,
    pub enemy_title_id: Option<TitleId>,
    pub super_rare_pool: &'a [SuperRareTitle],
}

/// Try to escalate a freshly assigned normal title into a super-rare one.
///
/// On success the daily state is marked triggered, and for normal-category
/// items so is the session.
pub fn evaluate_super_rare<R>(
    request: &SuperRareRequest<'_>,
    daily: &mut DailySuperRareState,
    session: &mut SessionSuperRareState,
    rng: &mut R,
) -> SuperRareOutcome
where
    R: RandomSource + ?Sized,
{
    let Some(rates) = request.normal_title.super_rare_rates else {
        return SuperRareOutcome::NotTriggered;
    };

    if request.category == ItemCategory::Normal
        && session.normal_item_already_triggered
        && !rng.next_bool(SUPER_RARE_SESSION_REPEAT_CHANCE)
    {
        return SuperRareOutcome::NotTriggered;
    }

    let denominator = daily.denominator();
    let base_rate = match rates.rate_for(request.category) {
        Some(rate) if rate > 0 => rate,
        _ => return SuperRareOutcome::NotTriggered,
    };
    let multiplier = enemy_multiplier(request.enemy_title_id, request.category);
    let threshold = denominator.min(base_rate.saturating_mul(multiplier));
    let roll = rng.next_int(1..=denominator);
    if roll > threshold {
        return SuperRareOutcome::NotTriggered;
    }

    daily.mark_triggered();
    if request.category == ItemCategory::Normal {
        session.normal_item_already_triggered = true;
    }
    let selected = select_super_rare_title(request.super_rare_pool, rng);
    let strip_normal_title = should_remove_normal_title_after_super_rare(rng);
    let Some(title_id) = selected else {
        log::warn!("super-rare roll succeeded but the super-rare roster is empty");
        return SuperRareOutcome::NotTriggered;
    };
    log::info!(
        "super-rare title {title_id} fired on {} item (roll {roll} <= {threshold}/{denominator}, day {})",
        request.category,
        daily.date()
    );
    SuperRareOutcome::Triggered {
        title_id,
        strip_normal_title,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SuperRareRates;
    use crate::random::{GameRandom, ScriptedRandom};

    fn title_with_rates(rates: SuperRareRates) -> TitleDef {
        TitleDef {
            id: 4,
            name: String::from("Gleaming"),
            drop_probability: 10.0,
            allow_with_title_treasure: true,
            rank_multiplier: None,
            super_rare_rates: Some(rates),
        }
    }

    fn roster() -> Vec<SuperRareTitle> {
        vec![
            SuperRareTitle {
                id: 101,
                name: String::from("Worldbreaker"),
            },
            SuperRareTitle {
                id: 102,
                name: String::from("Starborn"),
            },
        ]
    }

    fn gem_rates(gem: u32) -> SuperRareRates {
        SuperRareRates {
            gem: Some(gem),
            ..SuperRareRates::default()
        }
    }

    #[test]
    fn day_key_packs_and_rolls_over() {
        let today = DayKey::from_ymd(2026, 10, 19);
        assert_eq!(today.value(), 20_261_019);
        assert_eq!(today.to_string(), "20261019");
        let state = DailySuperRareState::restore(today, true);
        assert_eq!(state.rollover(today), state);
        let tomorrow = state.rollover(DayKey::from_ymd(2026, 10, 20));
        assert!(!tomorrow.has_triggered());
        assert_eq!(tomorrow.date(), DayKey(20_261_020));
    }

    #[test]
    fn enemy_multiplier_tiers() {
        assert_eq!(enemy_multiplier(Some(6), ItemCategory::Rare), 20);
        assert_eq!(enemy_multiplier(Some(6), ItemCategory::Normal), 50);
        assert_eq!(enemy_multiplier(Some(9), ItemCategory::Good), 50);
        assert_eq!(enemy_multiplier(Some(6), ItemCategory::Gem), 1);
        assert_eq!(enemy_multiplier(Some(5), ItemCategory::Rare), 1);
        assert_eq!(enemy_multiplier(None, ItemCategory::Normal), 1);
    }

    #[test]
    fn threshold_is_inclusive_and_marks_state() {
        let title = title_with_rates(gem_rates(1_000_000));
        let pool = roster();
        let request = SuperRareRequest {
            normal_title: &title,
            category: ItemCategory::Gem,
            enemy_title_id: None,
            super_rare_pool: &pool,
        };
        let mut daily = DailySuperRareState::new(DayKey::from_ymd(2026, 1, 1));
        let mut session = SessionSuperRareState::new();

        let mut miss = ScriptedRandom::new().with_ints([1_000_001]);
        let outcome = evaluate_super_rare(&request, &mut daily, &mut session, &mut miss);
        assert_eq!(outcome, SuperRareOutcome::NotTriggered);
        assert!(!daily.has_triggered());

        let mut hit = ScriptedRandom::new()
            .with_ints([1_000_000, 1])
            .with_bools([false]);
        let outcome = evaluate_super_rare(&request, &mut daily, &mut session, &mut hit);
        assert_eq!(
            outcome,
            SuperRareOutcome::Triggered {
                title_id: 102,
                strip_normal_title: false,
            }
        );
        assert!(daily.has_triggered());
        assert!(!session.normal_item_already_triggered());
        assert_eq!(daily.denominator(), 22_727_200);
    }

    #[test]
    fn missing_or_zero_rate_stops_before_rolling() {
        let pool = roster();
        let mut daily = DailySuperRareState::default();
        let mut session = SessionSuperRareState::new();
        for rates in [gem_rates(0), SuperRareRates::default()] {
            let title = title_with_rates(rates);
            let request = SuperRareRequest {
                normal_title: &title,
                category: ItemCategory::Gem,
                enemy_title_id: Some(8),
                super_rare_pool: &pool,
            };
            let mut rng = ScriptedRandom::new();
            let outcome = evaluate_super_rare(&request, &mut daily, &mut session, &mut rng);
            assert_eq!(outcome, SuperRareOutcome::NotTriggered);
            assert_eq!(rng.misses(), 0);
        }
    }

    #[test]
    fn repeat_normal_trigger_needs_session_gate() {
        let title = title_with_rates(SuperRareRates {
            normal: Some(u32::MAX),
            ..SuperRareRates::default()
        });
        let pool = roster();
        let request = SuperRareRequest {
            normal_title: &title,
            category: ItemCategory::Normal,
            enemy_title_id: None,
            super_rare_pool: &pool,
        };
        let mut daily = DailySuperRareState::default();
        let mut session = SessionSuperRareState::new();

        let mut rng = ScriptedRandom::new()
            .with_ints([1, 0])
            .with_bools([true]);
        let first = evaluate_super_rare(&request, &mut daily, &mut session, &mut rng);
        assert!(matches!(
            first,
            SuperRareOutcome::Triggered {
                title_id: 101,
                strip_normal_title: true
            }
        ));
        assert!(session.normal_item_already_triggered());

        let mut gate_closed = ScriptedRandom::new().with_bools([false]);
        let second = evaluate_super_rare(&request, &mut daily, &mut session, &mut gate_closed);
        assert_eq!(second, SuperRareOutcome::NotTriggered);
        assert!(gate_closed.is_exhausted());
        assert_eq!(gate_closed.misses(), 0);
    }

    #[test]
    fn empty_roster_still_marks_state_and_draws_strip() {
        let title = title_with_rates(SuperRareRates {
            normal: Some(u32::MAX),
            ..SuperRareRates::default()
        });
        let request = SuperRareRequest {
            normal_title: &title,
            category: ItemCategory::Normal,
            enemy_title_id: None,
            super_rare_pool: &[],
        };
        let mut daily = DailySuperRareState::default();
        let mut session = SessionSuperRareState::new();
        let mut rng = ScriptedRandom::new().with_ints([1]).with_bools([false]);
        let outcome = evaluate_super_rare(&request, &mut daily, &mut session, &mut rng);
        assert_eq!(outcome, SuperRareOutcome::NotTriggered);
        assert!(daily.has_triggered());
        assert!(session.normal_item_already_triggered());
        assert!(rng.is_exhausted());
        assert_eq!(rng.misses(), 0);
    }

    #[test]
    fn gem_success_rate_matches_rate_over_denominator() {
        let title = title_with_rates(gem_rates(1_000_000));
        let pool = roster();
        let request = SuperRareRequest {
            normal_title: &title,
            category: ItemCategory::Gem,
            enemy_title_id: None,
            super_rare_pool: &pool,
        };
        let mut rng = GameRandom::seeded(77);
        let samples = 20_000_u32;
        let mut hits = 0_u32;
        for _ in 0..samples {
            let mut daily = DailySuperRareState::default();
            let mut session = SessionSuperRareState::new();
            if matches!(
                evaluate_super_rare(&request, &mut daily, &mut session, &mut rng),
                SuperRareOutcome::Triggered { .. }
            ) {
                hits += 1;
            }
        }
        let observed = f64::from(hits) / f64::from(samples);
        let expected = 1_000_000.0 / 2_840_900.0;
        assert!(
            (observed - expected).abs() < 0.015,
            "observed {observed:.4} expected {expected:.4}"
        );
    }
}
