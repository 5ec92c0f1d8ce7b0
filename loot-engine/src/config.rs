//! Data-driven loot tuning: race equipment weights and sell-value limits.

use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

use crate::data::{ItemKind, RaceId};
use crate::error::LootConfigError;

const DEFAULT_LOOT_CONFIG: &str = include_str!("../assets/data/loot_config.json");

pub const RACE_HUMANOID: RaceId = 1;
pub const RACE_MONSTER: RaceId = 2;
pub const RACE_UNDEAD: RaceId = 3;
pub const RACE_DRAGONKIN: RaceId = 4;
pub const RACE_DIVINE_DEMONIC: RaceId = 5;

/// Highest enemy level (inclusive) a sell-value cap applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellLimitStep {
    pub max_level: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindWeight {
    pub kind: ItemKind,
    pub weight: u32,
}

pub type KindWeights = SmallVec<[KindWeight; 5]>;

/// Equipment kinds an enemy race tends to carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceWeights {
    pub race: RaceId,
    pub weights: KindWeights,
}

impl RaceWeights {
    #[must_use]
    pub fn total_weight(&self) -> u32 {
        self.weights
            .iter()
            .fold(0_u32, |acc, entry| acc.saturating_add(entry.weight))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootConfig {
    #[serde(default = "LootConfig::default_sell_limits")]
    pub sell_limits: Vec<SellLimitStep>,
    /// Cap applied above the last step.
    #[serde(default = "LootConfig::default_top_sell_limit")]
    pub top_sell_limit: u32,
    #[serde(default = "LootConfig::default_race_weights")]
    pub race_weights: Vec<RaceWeights>,
}

impl Default for LootConfig {
    fn default() -> Self {
        serde_json::from_str(DEFAULT_LOOT_CONFIG).unwrap_or_else(|_| Self::builtin())
    }
}

impl LootConfig {
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::default()
    }

    /// Parse a configuration override.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn builtin() -> Self {
        Self {
            sell_limits: Self::default_sell_limits(),
            top_sell_limit: Self::default_top_sell_limit(),
            race_weights: Self::default_race_weights(),
        }
    }

    fn default_sell_limits() -> Vec<SellLimitStep> {
        vec![
            SellLimitStep {
                max_level: 20,
                limit: 250,
            },
            SellLimitStep {
                max_level: 50,
                limit: 6_250,
            },
            SellLimitStep {
                max_level: 100,
                limit: 120_000,
            },
            SellLimitStep {
                max_level: 150,
                limit: 360_000,
            },
        ]
    }

    const fn default_top_sell_limit() -> u32 {
        720_000
    }

    fn default_race_weights() -> Vec<RaceWeights> {
        let w = |kind, weight| KindWeight { kind, weight };
        vec![
            RaceWeights {
                race: RACE_HUMANOID,
                weights: smallvec![
                    w(ItemKind::Sword, 30),
                    w(ItemKind::Dagger, 20),
                    w(ItemKind::Armor, 25),
                    w(ItemKind::Shield, 15),
                    w(ItemKind::Accessory, 10),
                ],
            },
            RaceWeights {
                race: RACE_MONSTER,
                weights: smallvec![
                    w(ItemKind::Axe, 30),
                    w(ItemKind::Gauntlet, 25),
                    w(ItemKind::Armor, 25),
                    w(ItemKind::Accessory, 20),
                ],
            },
            RaceWeights {
                race: RACE_UNDEAD,
                weights: smallvec![
                    w(ItemKind::Staff, 25),
                    w(ItemKind::Robe, 30),
                    w(ItemKind::Dagger, 20),
                    w(ItemKind::Accessory, 25),
                ],
            },
            RaceWeights {
                race: RACE_DRAGONKIN,
                weights: smallvec![
                    w(ItemKind::Sword, 25),
                    w(ItemKind::Spear, 25),
                    w(ItemKind::Armor, 20),
                    w(ItemKind::Shield, 20),
                    w(ItemKind::Helm, 10),
                ],
            },
            RaceWeights {
                race: RACE_DIVINE_DEMONIC,
                weights: smallvec![
                    w(ItemKind::Wand, 25),
                    w(ItemKind::Staff, 20),
                    w(ItemKind::Robe, 20),
                    w(ItemKind::Katana, 15),
                    w(ItemKind::Accessory, 20),
                ],
            },
        ]
    }

    /// Highest sell value a generated drop may have for an enemy of `level`.
    #[must_use]
    pub fn sell_value_limit(&self, level: u32) -> u32 {
        self.sell_limits
            .iter()
            .find(|step| level <= step.max_level)
            .map_or(self.top_sell_limit, |step| step.limit)
    }

    /// Weight table for `race`, if one is configured.
    #[must_use]
    pub fn race_weights(&self, race: RaceId) -> Option<&RaceWeights> {
        self.race_weights.iter().find(|entry| entry.race == race)
    }

    /// Replace (or add) the weight table for a race.
    #[must_use]
    pub fn with_race_weights(mut self, race: RaceId, weights: KindWeights) -> Self {
        match self.race_weights.iter_mut().find(|entry| entry.race == race) {
            Some(entry) => entry.weights = weights,
            None => self.race_weights.push(RaceWeights { race, weights }),
        }
        self
    }

    /// Check structural invariants of the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when sell-limit steps are empty or not monotonic, or a
    /// race weight table sums to zero.
    pub fn validate(&self) -> Result<(), LootConfigError> {
        let Some(first) = self.sell_limits.first() else {
            return Err(LootConfigError::EmptySellLimits);
        };
        let mut previous = *first;
        for step in self.sell_limits.iter().skip(1) {
            if step.max_level <= previous.max_level {
                return Err(LootConfigError::SellLimitLevelOrder {
                    previous: previous.max_level,
                    level: step.max_level,
                });
            }
            if step.limit < previous.limit {
                return Err(LootConfigError::SellLimitDecreasing {
                    level: step.max_level,
                    limit: step.limit,
                    previous: previous.limit,
                });
            }
            previous = *step;
        }
        if self.top_sell_limit < previous.limit {
            return Err(LootConfigError::SellLimitDecreasing {
                level: previous.max_level.saturating_add(1),
                limit: self.top_sell_limit,
                previous: previous.limit,
            });
        }
        for entry in &self.race_weights {
            if entry.total_weight() == 0 {
                return Err(LootConfigError::ZeroRaceWeights {
                    race_id: entry.race,
                });
            }
        }
        Ok(())
    }
}
