//! Read-only master data consumed by drop resolution.
//!
//! Items, enemies, titles, super-rare titles and skills are owned by the
//! surrounding game; the engine only looks them up through [`MasterDataCache`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::category::ItemCategory;
use crate::error::{MasterDataError, SkillCompileError};
use crate::party::{RewardScales, SkillCompiler, SkillRef};

const DEFAULT_MASTER_DATA: &str = include_str!("../assets/data/master.json");

pub type ItemId = u32;
pub type EnemyId = u32;
pub type TitleId = u32;
pub type SuperRareTitleId = u32;
pub type SkillId = u32;
pub type RaceId = u32;

/// Item classification tag as stored in master data.
///
/// Equipment kinds feed the race weight table; the special tags
/// (`Gem`, `AntagonistRaceMaterial`, `RaceRestrictedEquipment`, `Spellbook`)
/// force a drop category regardless of price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Sword,
    Katana,
    Dagger,
    Axe,
    Spear,
    Bow,
    Staff,
    Wand,
    Armor,
    Robe,
    Shield,
    Helm,
    Gauntlet,
    Accessory,
    Consumable,
    Gem,
    AntagonistRaceMaterial,
    RaceRestrictedEquipment,
    Spellbook,
}

/// Shop rarity tier. Only `Common` items are eligible for generated drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RarityTier {
    #[default]
    Common,
    Uncommon,
    Rare,
    Legendary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: ItemId,
    pub name: String,
    pub kind: ItemKind,
    #[serde(default)]
    pub base_price: u32,
    #[serde(default)]
    pub sell_value: u32,
    #[serde(default)]
    pub rarity: RarityTier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyDef {
    pub id: EnemyId,
    pub name: String,
    pub race: RaceId,
    pub level: u32,
    /// Fixed loot table, rolled in order.
    #[serde(default)]
    pub drops: Vec<ItemId>,
    #[serde(default)]
    pub is_boss: bool,
}

/// Per-category base rates for escalating a normal title into a super-rare one.
///
/// Rates are numerators over the day's super-rare denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SuperRareRates {
    #[serde(default)]
    pub normal: Option<u32>,
    #[serde(default)]
    pub good: Option<u32>,
    #[serde(default)]
    pub rare: Option<u32>,
    #[serde(default)]
    pub gem: Option<u32>,
}

impl SuperRareRates {
    #[must_use]
    pub const fn rate_for(&self, category: ItemCategory) -> Option<u32> {
        match category {
            ItemCategory::Normal => self.normal,
            ItemCategory::Good => self.good,
            ItemCategory::Rare => self.rare,
            ItemCategory::Gem => self.gem,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleDef {
    /// Identifier, doubling as the title's rank.
    pub id: TitleId,
    pub name: String,
    #[serde(default)]
    pub drop_probability: f64,
    #[serde(default = "default_allow_with_title_treasure")]
    pub allow_with_title_treasure: bool,
    /// Stat multiplier when the title is worn by an enemy.
    #[serde(default)]
    pub rank_multiplier: Option<f64>,
    #[serde(default)]
    pub super_rare_rates: Option<SuperRareRates>,
}

impl TitleDef {
    #[must_use]
    pub const fn rank(&self) -> TitleId {
        self.id
    }
}

const fn default_allow_with_title_treasure() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperRareTitle {
    pub id: SuperRareTitleId,
    pub name: String,
}

/// Skill reward effects; each scale multiplies the matching party bonus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDef {
    pub id: SkillId,
    pub name: String,
    #[serde(default = "neutral_scale")]
    pub gold_scale: f64,
    #[serde(default = "neutral_scale")]
    pub item_drop_scale: f64,
    #[serde(default = "neutral_scale")]
    pub title_scale: f64,
}

const fn neutral_scale() -> f64 {
    1.0
}

/// Read access to master data needed while resolving drops.
pub trait MasterDataCache {
    fn item(&self, id: ItemId) -> Option<&ItemDef>;

    fn title(&self, id: TitleId) -> Option<&TitleDef>;

    fn items(&self) -> &[ItemDef];

    fn titles(&self) -> &[TitleDef];

    fn super_rare_titles(&self) -> &[SuperRareTitle];
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MasterDataFile {
    #[serde(default)]
    items: Vec<ItemDef>,
    #[serde(default)]
    enemies: Vec<EnemyDef>,
    #[serde(default)]
    titles: Vec<TitleDef>,
    #[serde(default)]
    super_rare_titles: Vec<SuperRareTitle>,
    #[serde(default)]
    skills: Vec<SkillDef>,
}

/// Id-indexed in-memory master data store.
#[derive(Debug, Clone, Default)]
pub struct MasterData {
    file: MasterDataFile,
    item_index: HashMap<ItemId, usize>,
    enemy_index: HashMap<EnemyId, usize>,
    title_index: HashMap<TitleId, usize>,
    skill_index: HashMap<SkillId, usize>,
}

impl MasterData {
    /// Create empty master data (useful for tests)
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load master data from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or any table repeats an id.
    pub fn from_json(json: &str) -> Result<Self, MasterDataError> {
        let file: MasterDataFile = serde_json::from_str(json)?;
        Self::from_file(file)
    }

    /// Build master data from pre-parsed tables.
    ///
    /// # Errors
    ///
    /// Returns an error if any table repeats an id.
    pub fn from_parts(
        items: Vec<ItemDef>,
        enemies: Vec<EnemyDef>,
        titles: Vec<TitleDef>,
        super_rare_titles: Vec<SuperRareTitle>,
        skills: Vec<SkillDef>,
    ) -> Result<Self, MasterDataError> {
        Self::from_file(MasterDataFile {
            items,
            enemies,
            titles,
            super_rare_titles,
            skills,
        })
    }

    /// The sample dataset bundled with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled asset fails to parse.
    pub fn bundled() -> Result<Self, MasterDataError> {
        Self::from_json(DEFAULT_MASTER_DATA)
    }

    fn from_file(file: MasterDataFile) -> Result<Self, MasterDataError> {
        let item_index = build_index("item", file.items.iter().map(|item| item.id))?;
        let enemy_index = build_index("enemy", file.enemies.iter().map(|enemy| enemy.id))?;
        let title_index = build_index("title", file.titles.iter().map(|title| title.id))?;
        let skill_index = build_index("skill", file.skills.iter().map(|skill| skill.id))?;
        build_index(
            "super_rare_title",
            file.super_rare_titles.iter().map(|title| title.id),
        )?;
        Ok(Self {
            file,
            item_index,
            enemy_index,
            title_index,
            skill_index,
        })
    }

    #[must_use]
    pub fn enemy(&self, id: EnemyId) -> Option<&EnemyDef> {
        self.enemy_index
            .get(&id)
            .and_then(|idx| self.file.enemies.get(*idx))
    }

    #[must_use]
    pub fn enemies(&self) -> &[EnemyDef] {
        &self.file.enemies
    }

    #[must_use]
    pub fn skill(&self, id: SkillId) -> Option<&SkillDef> {
        self.skill_index
            .get(&id)
            .and_then(|idx| self.file.skills.get(*idx))
    }

    #[must_use]
    pub fn skills(&self) -> &[SkillDef] {
        &self.file.skills
    }
}

fn build_index(
    table: &'static str,
    ids: impl Iterator<Item = u32>,
) -> Result<HashMap<u32, usize>, MasterDataError> {
    let mut index = HashMap::new();
    for (position, id) in ids.enumerate() {
        if index.insert(id, position).is_some() {
            return Err(MasterDataError::DuplicateId { table, id });
        }
    }
    Ok(index)
}

impl MasterDataCache for MasterData {
    fn item(&self, id: ItemId) -> Option<&ItemDef> {
        self.item_index
            .get(&id)
            .and_then(|idx| self.file.items.get(*idx))
    }

    fn title(&self, id: TitleId) -> Option<&TitleDef> {
        self.title_index
            .get(&id)
            .and_then(|idx| self.file.titles.get(*idx))
    }

    fn items(&self) -> &[ItemDef] {
        &self.file.items
    }

    fn titles(&self) -> &[TitleDef] {
        &self.file.titles
    }

    fn super_rare_titles(&self) -> &[SuperRareTitle] {
        &self.file.super_rare_titles
    }
}

impl SkillCompiler for MasterData {
    type Error = SkillCompileError;

    fn compile(&self, skills: &[SkillRef]) -> Result<RewardScales, Self::Error> {
        let mut scales = RewardScales::NEUTRAL;
        for skill in skills {
            let def = self
                .skill(skill.id)
                .ok_or(SkillCompileError::UnknownSkill { skill_id: skill.id })?;
            let factors = [def.gold_scale, def.item_drop_scale, def.title_scale];
            if factors.iter().any(|factor| !factor.is_finite() || *factor < 0.0) {
                return Err(SkillCompileError::InvalidScale { skill_id: skill.id });
            }
            scales.gold *= def.gold_scale;
            scales.item_drop *= def.item_drop_scale;
            scales.title *= def.title_scale;
        }
        Ok(scales)
    }
}
