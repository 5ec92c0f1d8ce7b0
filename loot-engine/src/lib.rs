//! Loot Engine
//!
//! Platform-agnostic battle drop and title assignment logic.
//! This crate decides which items a defeated group of enemies drops, and which
//! normal or super-rare titles those items carry, without any I/O of its own.

pub mod category;
pub mod config;
pub mod constants;
pub mod data;
pub mod drop_rate;
pub mod drops;
pub mod error;
pub mod normal_items;
pub mod numbers;
pub mod party;
pub mod random;
pub mod super_rare;
pub mod titles;

// Re-export commonly used types
pub use category::{ItemCategory, categorize};
pub use config::{KindWeight, LootConfig, RaceWeights, SellLimitStep};
pub use data::{
    EnemyDef, EnemyId, ItemDef, ItemId, ItemKind, MasterData, MasterDataCache, RaceId, RarityTier,
    SkillDef, SkillId, SuperRareRates, SuperRareTitle, SuperRareTitleId, TitleDef, TitleId,
};
pub use drop_rate::{
    DropRateCalculator, DropRollOutcome, IdentityCorrection, ThresholdCorrection, base_threshold,
};
pub use drops::{DropEngine, DropOutcome, DropRequest, DropResult, resolve_drops};
pub use error::{LootConfigError, LootError, MasterDataError, SkillCompileError};
pub use normal_items::{NormalCandidate, generate_candidates};
pub use party::{
    NeutralSkills, PartyBonuses, PartyMember, RewardScales, SkillCompiler, SkillRef, dedup_skills,
};
pub use random::{GameRandom, RandomSource, ScriptedRandom};
pub use super_rare::{
    DailySuperRareState, DayKey, SessionSuperRareState, SuperRareOutcome, SuperRareRequest,
    evaluate_super_rare,
};
pub use titles::{
    TitleAward, TitleContext, assign_titles, determine_normal_title, judgment_count,
    select_super_rare_title, should_assign_title, should_remove_normal_title_after_super_rare,
};

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load item, enemy, title and skill definitions
    ///
    /// # Errors
    ///
    /// Returns an error if the master data cannot be loaded or parsed.
    fn load_master_data(&self) -> Result<MasterData, Self::Error>;

    /// Load race weights and sell-value limits
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_loot_config(&self) -> Result<LootConfig, Self::Error>;
}

/// Loader for the data sets compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledData;

impl DataLoader for BundledData {
    type Error = MasterDataError;

    fn load_master_data(&self) -> Result<MasterData, Self::Error> {
        MasterData::bundled()
    }

    fn load_loot_config(&self) -> Result<LootConfig, Self::Error> {
        Ok(LootConfig::load_from_static())
    }
}

/// Master data and tuning loaded once and shared by every battle.
#[derive(Debug, Clone)]
pub struct LootTables {
    master: MasterData,
    config: LootConfig,
}

impl LootTables {
    #[must_use]
    pub const fn new(master: MasterData, config: LootConfig) -> Self {
        Self { master, config }
    }

    /// Load tables through a platform loader
    ///
    /// # Errors
    ///
    /// Returns an error if either data set cannot be loaded.
    pub fn load<L: DataLoader>(loader: &L) -> Result<Self, L::Error> {
        Ok(Self::new(
            loader.load_master_data()?,
            loader.load_loot_config()?,
        ))
    }

    #[must_use]
    pub const fn master(&self) -> &MasterData {
        &self.master
    }

    #[must_use]
    pub const fn config(&self) -> &LootConfig {
        &self.config
    }

    /// Resolve one battle, compiling party skills from the master skill table.
    ///
    /// # Errors
    ///
    /// See [`DropEngine::resolve`].
    pub fn resolve<R>(
        &self,
        request: &DropRequest<'_>,
        daily_state: DailySuperRareState,
        rng: &mut R,
    ) -> Result<DropOutcome, LootError>
    where
        R: RandomSource + ?Sized,
    {
        resolve_drops(
            &self.master,
            &self.master,
            &self.config,
            request,
            daily_state,
            rng,
        )
    }
}
