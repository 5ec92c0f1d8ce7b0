//! Party bonus aggregation.
//!
//! A battle's party is reduced once into a [`PartyBonuses`] snapshot that
//! every later roll reads. Aggregation never fails: a skill compiler error
//! falls back to neutral scales.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::convert::Infallible;

use crate::constants::{GOLD_LUCK_COEFFICIENT, RARE_DROP_STAT_COEFFICIENT, TITLE_LUCK_COEFFICIENT};
use crate::data::SkillId;
use crate::numbers::{round_f64_to_i32, round_f64_to_u64, u64_to_f64, usize_to_f64};

/// Reference to a learned skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkillRef {
    pub id: SkillId,
}

/// A party member's drop-relevant attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PartyMember {
    #[serde(default)]
    pub luck: u32,
    #[serde(default)]
    pub spirit: u32,
    #[serde(default)]
    pub skills: Vec<SkillRef>,
}

/// Multiplicative reward factors compiled from party skills.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardScales {
    pub gold: f64,
    pub item_drop: f64,
    pub title: f64,
}

impl RewardScales {
    pub const NEUTRAL: Self = Self {
        gold: 1.0,
        item_drop: 1.0,
        title: 1.0,
    };
}

impl Default for RewardScales {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Compiles a deduplicated skill list into reward scales.
pub trait SkillCompiler {
    type Error: std::error::Error;

    /// Compile skills into gold, item-drop and title scales.
    ///
    /// # Errors
    ///
    /// Returns an error if a skill cannot be resolved; callers treat this as neutral.
    fn compile(&self, skills: &[SkillRef]) -> Result<RewardScales, Self::Error>;
}

/// Compiler that ignores skills entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralSkills;

impl SkillCompiler for NeutralSkills {
    type Error = Infallible;

    fn compile(&self, _skills: &[SkillRef]) -> Result<RewardScales, Self::Error> {
        Ok(RewardScales::NEUTRAL)
    }
}

/// Immutable per-battle drop and title modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartyBonuses {
    gold_multiplier: f64,
    rare_drop_multiplier: f64,
    title_grant_rate_multiplier: f64,
    average_luck: f64,
    fortune: i32,
}

impl PartyBonuses {
    pub const NEUTRAL: Self = Self {
        gold_multiplier: 1.0,
        rare_drop_multiplier: 1.0,
        title_grant_rate_multiplier: 1.0,
        average_luck: 0.0,
        fortune: 0,
    };

    /// Build bonuses from explicit values. Negative or non-finite multipliers become 0.
    #[must_use]
    pub fn new(
        gold_multiplier: f64,
        rare_drop_multiplier: f64,
        title_grant_rate_multiplier: f64,
        average_luck: f64,
    ) -> Self {
        let sanitize = |value: f64| if value.is_finite() { value.max(0.0) } else { 0.0 };
        let average_luck = sanitize(average_luck);
        Self {
            gold_multiplier: sanitize(gold_multiplier),
            rare_drop_multiplier: sanitize(rare_drop_multiplier),
            title_grant_rate_multiplier: sanitize(title_grant_rate_multiplier),
            average_luck,
            fortune: round_f64_to_i32(average_luck),
        }
    }

    /// Aggregate a party into bonuses, compiling its deduplicated skills.
    pub fn from_party<C>(members: &[PartyMember], compiler: &C) -> Self
    where
        C: SkillCompiler + ?Sized,
    {
        if members.is_empty() {
            return Self::NEUTRAL;
        }

        let luck_sum: f64 = members.iter().map(|m| f64::from(m.luck)).sum();
        let spirit_sum: f64 = members.iter().map(|m| f64::from(m.spirit)).sum();
        let average_luck = luck_sum / usize_to_f64(members.len());

        let gold_base = 1.0 + luck_sum * GOLD_LUCK_COEFFICIENT;
        let rare_base = 1.0 + (luck_sum + spirit_sum) * RARE_DROP_STAT_COEFFICIENT;
        let title_base = 1.0 + average_luck * TITLE_LUCK_COEFFICIENT;

        let skills = dedup_skills(members);
        let scales = match compiler.compile(&skills) {
            Ok(scales) => scales,
            Err(err) => {
                log::warn!("party skill compilation failed, using neutral scales: {err}");
                RewardScales::NEUTRAL
            }
        };

        Self::new(
            gold_base * scales.gold,
            rare_base * scales.item_drop,
            title_base * scales.title,
            average_luck,
        )
    }

    #[must_use]
    pub const fn gold_multiplier(&self) -> f64 {
        self.gold_multiplier
    }

    #[must_use]
    pub const fn rare_drop_multiplier(&self) -> f64 {
        self.rare_drop_multiplier
    }

    #[must_use]
    pub const fn title_grant_rate_multiplier(&self) -> f64 {
        self.title_grant_rate_multiplier
    }

    #[must_use]
    pub const fn average_luck(&self) -> f64 {
        self.average_luck
    }

    /// Average luck rounded to the nearest integer.
    #[must_use]
    pub const fn fortune(&self) -> i32 {
        self.fortune
    }

    /// Apply the gold multiplier to a base gold reward.
    #[must_use]
    pub fn scaled_gold(&self, base: u64) -> u64 {
        round_f64_to_u64(u64_to_f64(base) * self.gold_multiplier)
    }
}

impl Default for PartyBonuses {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Party-wide skills in first-seen order, without repeats.
#[must_use]
pub fn dedup_skills(members: &[PartyMember]) -> Vec<SkillRef> {
    let mut seen = HashSet::new();
    members
        .iter()
        .flat_map(|member| member.skills.iter().copied())
        .filter(|skill| seen.insert(skill.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SkillCompileError;
    use std::cell::RefCell;

    fn member(luck: u32, spirit: u32, skills: &[SkillId]) -> PartyMember {
        PartyMember {
            luck,
            spirit,
            skills: skills.iter().map(|id| SkillRef { id: *id }).collect(),
        }
    }

    struct RecordingCompiler {
        seen: RefCell<Vec<SkillRef>>,
        scales: RewardScales,
    }

    impl SkillCompiler for RecordingCompiler {
        type Error = Infallible;

        fn compile(&self, skills: &[SkillRef]) -> Result<RewardScales, Self::Error> {
            self.seen.borrow_mut().extend_from_slice(skills);
            Ok(self.scales)
        }
    }

    struct FailingCompiler;

    impl SkillCompiler for FailingCompiler {
        type Error = SkillCompileError;

        fn compile(&self, skills: &[SkillRef]) -> Result<RewardScales, Self::Error> {
            Err(SkillCompileError::UnknownSkill {
                skill_id: skills.first().map_or(0, |skill| skill.id),
            })
        }
    }

    #[test]
    fn empty_party_is_neutral() {
        let bonuses = PartyBonuses::from_party(&[], &NeutralSkills);
        assert_eq!(bonuses, PartyBonuses::NEUTRAL);
        assert_eq!(bonuses.fortune(), 0);
        assert!(bonuses.average_luck().abs() < f64::EPSILON);
    }

    #[test]
    fn base_multipliers_follow_party_stats() {
        let party = [member(10, 4, &[]), member(20, 6, &[])];
        let bonuses = PartyBonuses::from_party(&party, &NeutralSkills);
        assert!((bonuses.gold_multiplier() - 1.03).abs() < 1e-12);
        assert!((bonuses.rare_drop_multiplier() - 1.02).abs() < 1e-12);
        assert!((bonuses.title_grant_rate_multiplier() - 1.03).abs() < 1e-12);
        assert!((bonuses.average_luck() - 15.0).abs() < f64::EPSILON);
        assert_eq!(bonuses.fortune(), 15);
    }

    #[test]
    fn fortune_rounds_average_luck() {
        let party = [member(3, 0, &[]), member(4, 0, &[])];
        let bonuses = PartyBonuses::from_party(&party, &NeutralSkills);
        assert!((bonuses.average_luck() - 3.5).abs() < f64::EPSILON);
        assert_eq!(bonuses.fortune(), 4);
    }

    #[test]
    fn skills_dedupe_first_seen_and_scale_bases() {
        let compiler = RecordingCompiler {
            seen: RefCell::new(Vec::new()),
            scales: RewardScales {
                gold: 2.0,
                item_drop: 1.5,
                title: 3.0,
            },
        };
        let party = [member(0, 0, &[5, 2, 5]), member(0, 0, &[2, 9])];
        let bonuses = PartyBonuses::from_party(&party, &compiler);

        let ids: Vec<SkillId> = compiler.seen.borrow().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![5, 2, 9]);
        assert!((bonuses.gold_multiplier() - 2.0).abs() < f64::EPSILON);
        assert!((bonuses.rare_drop_multiplier() - 1.5).abs() < f64::EPSILON);
        assert!((bonuses.title_grant_rate_multiplier() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn compiler_failure_falls_back_to_neutral_scales() {
        let party = [member(100, 0, &[1])];
        let bonuses = PartyBonuses::from_party(&party, &FailingCompiler);
        assert!((bonuses.gold_multiplier() - 1.1).abs() < 1e-12);
        assert!((bonuses.rare_drop_multiplier() - 1.05).abs() < 1e-12);
        assert!((bonuses.title_grant_rate_multiplier() - 1.2).abs() < 1e-12);
    }

    #[test]
    fn scaled_gold_rounds_and_sanitizes() {
        let bonuses = PartyBonuses::new(1.25, 1.0, 1.0, 0.0);
        assert_eq!(bonuses.scaled_gold(10), 13);
        let broken = PartyBonuses::new(f64::NAN, -2.0, 1.0, -5.0);
        assert_eq!(broken.scaled_gold(100), 0);
        assert!(broken.rare_drop_multiplier().abs() < f64::EPSILON);
        assert_eq!(broken.fortune(), 0);
    }
}
