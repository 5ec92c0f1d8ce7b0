//! Drop categories derived from item definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{GOOD_PRICE_FLOOR, RARE_PRICE_FLOOR};
use crate::data::{ItemDef, ItemKind};

/// Drop category, ordered by rarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Normal,
    Good,
    Rare,
    Gem,
}

impl ItemCategory {
    pub const ALL: [Self; 4] = [Self::Normal, Self::Good, Self::Rare, Self::Gem];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Good => "good",
            Self::Rare => "rare",
            Self::Gem => "gem",
        }
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify an item into its drop category.
///
/// Kind tags take precedence; otherwise the higher of sell value and base
/// price decides.
#[must_use]
pub fn categorize(item: &ItemDef) -> ItemCategory {
    match item.kind {
        ItemKind::Gem | ItemKind::AntagonistRaceMaterial => return ItemCategory::Gem,
        ItemKind::RaceRestrictedEquipment | ItemKind::Spellbook => return ItemCategory::Rare,
        _ => {}
    }
    let value = item.sell_value.max(item.base_price);
    if value >= RARE_PRICE_FLOOR {
        ItemCategory::Rare
    } else if value >= GOOD_PRICE_FLOOR {
        ItemCategory::Good
    } else {
        ItemCategory::Normal
    }
}
