//! Error types raised by drop resolution and data loading.

use thiserror::Error;

use crate::data::{ItemId, RaceId, SkillId};

/// Defect-class failures that abort a drop resolution call.
///
/// Probability outcomes (no drop, no title, no super-rare) are never errors;
/// these variants indicate a master-data or configuration mismatch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LootError {
    #[error("item {item_id} is referenced by a drop but missing from master data")]
    MissingItem { item_id: ItemId },
    #[error("equipment weights for race {race_id} sum to zero")]
    DegenerateRaceWeights { race_id: RaceId },
}

/// Errors raised while loading master data.
#[derive(Debug, Error)]
pub enum MasterDataError {
    #[error("master data JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate {table} id {id}")]
    DuplicateId { table: &'static str, id: u32 },
}

/// Errors raised when loot tuning configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum LootConfigError {
    #[error("sell value limits must not be empty")]
    EmptySellLimits,
    #[error("sell value limit steps must ascend by level (level {level} follows {previous})")]
    SellLimitLevelOrder { previous: u32, level: u32 },
    #[error("sell value limit steps must not decrease (level {level}: {limit} < {previous})")]
    SellLimitDecreasing {
        level: u32,
        limit: u32,
        previous: u32,
    },
    #[error("equipment weights for race {race_id} sum to zero")]
    ZeroRaceWeights { race_id: RaceId },
}

/// Failure compiling party skills into reward scales.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SkillCompileError {
    #[error("skill {skill_id} is not defined in master data")]
    UnknownSkill { skill_id: SkillId },
    #[error("skill {skill_id} declares a negative or non-finite reward scale")]
    InvalidScale { skill_id: SkillId },
}
