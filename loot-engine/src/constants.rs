//! Centralized balance and tuning constants for drop resolution.
//!
//! These values define the deterministic math for loot and title rolls.
//! Keeping them together ensures that drop rates can only be adjusted via
//! code changes reviewed in version control, rather than through external
//! JSON assets. Data-driven tables (race weights, sell limits) live in
//! [`crate::config::LootConfig`] instead.

// Party bonus aggregation --------------------------------------------------
pub(crate) const GOLD_LUCK_COEFFICIENT: f64 = 0.001;
pub(crate) const RARE_DROP_STAT_COEFFICIENT: f64 = 0.0005;
pub(crate) const TITLE_LUCK_COEFFICIENT: f64 = 0.002;

// Drop thresholds ----------------------------------------------------------
pub(crate) const THRESHOLD_CEILING: f64 = 100.0;
pub(crate) const THRESHOLD_FLOOR: f64 = 0.0;
pub(crate) const NORMAL_DROP_PENALTY_PER_MULTIPLIER: f64 = 10.0;
pub(crate) const VALUABLE_DROP_PENALTY_PER_MULTIPLIER: f64 = 0.1;
pub(crate) const GEM_DROP_PENALTY_CAP: f64 = 1.0;
pub(crate) const TICKET_MULTIPLIER: f64 = 2.0;

// Item categorization ------------------------------------------------------
pub(crate) const RARE_PRICE_FLOOR: u32 = 10_000;
pub(crate) const GOOD_PRICE_FLOOR: u32 = 2_000;

// Title assignment ---------------------------------------------------------
pub(crate) const NORMAL_TITLE_RATE_FACTOR: f64 = 30.0;
pub(crate) const LOW_RANK_TITLE_CEILING: u32 = 2;
pub(crate) const TITLE_STRIP_CHANCE: f64 = 0.12;

// Super-rare escalation ----------------------------------------------------
pub(crate) const SUPER_RARE_FIRST_DENOMINATOR: u32 = 2_840_900;
pub(crate) const SUPER_RARE_REPEAT_DENOMINATOR: u32 = 22_727_200;
pub(crate) const SUPER_RARE_SESSION_REPEAT_CHANCE: f64 = 0.35;
pub const BOSS_TIER_TITLE_ID: u32 = 6;
pub(crate) const BOSS_MULTIPLIER_COMMON: u32 = 50;
pub(crate) const BOSS_MULTIPLIER_RARE: u32 = 20;
pub(crate) const BOSS_MULTIPLIER_GEM: u32 = 1;

// Drop results -------------------------------------------------------------
pub(crate) const DROP_QUANTITY: u32 = 1;
