//! Battle drop resolution.
//!
//! [`DropEngine::resolve`] sequences party aggregation, fixed-table drops,
//! generated common-tier drops and title assignment for one battle. The
//! order of random draws is part of the contract: fixed drops enemy by enemy
//! in drop-list order, then generated drops in the same enemy order.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::hash::{BuildHasher, Hash, Hasher};
use twox_hash::XxHash64;

use crate::category::{ItemCategory, categorize};
use crate::config::LootConfig;
use crate::constants::DROP_QUANTITY;
use crate::data::{
    EnemyDef, EnemyId, ItemDef, ItemId, MasterDataCache, RarityTier, SuperRareTitleId, TitleId,
};
use crate::drop_rate::{DropRateCalculator, IdentityCorrection, ThresholdCorrection};
use crate::error::LootError;
use crate::normal_items::generate_candidates;
use crate::party::{PartyBonuses, PartyMember, SkillCompiler};
use crate::random::RandomSource;
use crate::super_rare::{DailySuperRareState, SessionSuperRareState};
use crate::titles::{TitleContext, assign_titles};

/// One dropped item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DropResult {
    pub item_id: ItemId,
    pub quantity: u32,
    pub source_enemy_id: Option<EnemyId>,
    pub normal_title_id: Option<TitleId>,
    pub super_rare_title_id: Option<SuperRareTitleId>,
}

/// Everything a resolution call hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DropOutcome {
    pub results: Vec<DropResult>,
    /// Persist this in place of the state passed in.
    pub daily_state: DailySuperRareState,
    pub newly_dropped: BTreeSet<ItemId>,
}

impl DropOutcome {
    #[must_use]
    pub const fn empty(daily_state: DailySuperRareState) -> Self {
        Self {
            results: Vec::new(),
            daily_state,
            newly_dropped: BTreeSet::new(),
        }
    }

    /// Stable xxHash64 digest, equal for outcomes that compare equal.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = XxHash64::with_seed(0);
        self.hash(&mut hasher);
        hasher.finish()
    }

    /// Add this battle's drops to a run-wide dropped-id set.
    pub fn remember_in<H: BuildHasher>(&self, dropped: &mut HashSet<ItemId, H>) {
        dropped.extend(self.newly_dropped.iter().copied());
    }

    #[must_use]
    pub fn titled_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.normal_title_id.is_some() || r.super_rare_title_id.is_some())
            .count()
    }
}

/// Per-battle inputs to [`DropEngine::resolve`].
#[derive(Debug, Clone, Copy)]
pub struct DropRequest<'a> {
    pub enemies: &'a [EnemyDef],
    pub party: &'a [PartyMember],
    /// Item ids the caller already handed out, e.g. earlier on the same floor.
    pub already_dropped: &'a HashSet<ItemId>,
    pub ticket_active: bool,
    pub title_treasure_active: bool,
    pub enemy_title_id: Option<TitleId>,
}

/// Drop resolver bound to its read-only collaborators.
#[derive(Debug, Clone, Copy)]
pub struct DropEngine<'a, M, S, C = IdentityCorrection> {
    master: &'a M,
    skills: &'a S,
    config: &'a LootConfig,
    calculator: DropRateCalculator<C>,
}

impl<'a, M, S> DropEngine<'a, M, S, IdentityCorrection>
where
    M: MasterDataCache,
    S: SkillCompiler,
{
    #[must_use]
    pub const fn new(master: &'a M, skills: &'a S, config: &'a LootConfig) -> Self {
        Self {
            master,
            skills,
            config,
            calculator: DropRateCalculator::new(),
        }
    }
}

impl<'a, M, S, C> DropEngine<'a, M, S, C>
where
    M: MasterDataCache,
    S: SkillCompiler,
    C: ThresholdCorrection,
{
    /// Swap in a threshold correction for every drop roll.
    #[must_use]
    pub fn with_correction<D: ThresholdCorrection>(self, correction: D) -> DropEngine<'a, M, S, D> {
        DropEngine {
            master: self.master,
            skills: self.skills,
            config: self.config,
            calculator: DropRateCalculator::with_correction(correction),
        }
    }

    /// Resolve every drop for one battle.
    ///
    /// `daily_state` is only read and, on the first super-rare of the day,
    /// flipped to triggered; the updated copy comes back in the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`LootError::MissingItem`] when a fixed drop or generated
    /// candidate names an unknown item, and
    /// [`LootError::DegenerateRaceWeights`] when an enemy's race weight table
    /// sums to zero. No partial outcome is returned in either case.
    pub fn resolve<R>(
        &self,
        request: &DropRequest<'_>,
        daily_state: DailySuperRareState,
        rng: &mut R,
    ) -> Result<DropOutcome, LootError>
    where
        R: RandomSource + ?Sized,
    {
        if request.enemies.is_empty() {
            return Ok(DropOutcome::empty(daily_state));
        }

        let bonuses = PartyBonuses::from_party(request.party, self.skills);
        let enemy_title = request
            .enemy_title_id
            .and_then(|id| self.master.title(id));
        let ctx = TitleContext {
            bonuses: &bonuses,
            ticket_active: request.ticket_active,
            title_treasure_active: request.title_treasure_active,
            enemy_title_id: request.enemy_title_id,
            enemy_title,
            title_pool: self.master.titles(),
            super_rare_pool: self.master.super_rare_titles(),
        };
        let mut battle = BattleDrops {
            ctx,
            daily: daily_state,
            session: SessionSuperRareState::new(),
            results: Vec::new(),
            newly_dropped: BTreeSet::new(),
        };

        for enemy in request.enemies {
            for &item_id in &enemy.drops {
                if request.already_dropped.contains(&item_id) {
                    continue;
                }
                let item = self.lookup(item_id)?;
                self.roll_item(&mut battle, item, categorize(item), enemy.id, rng);
            }
        }

        let mut exclusion = request.already_dropped.clone();
        exclusion.extend(battle.newly_dropped.iter().copied());
        let common_pool: Vec<&ItemDef> = self
            .master
            .items()
            .iter()
            .filter(|item| item.rarity == RarityTier::Common)
            .collect();
        let candidates =
            generate_candidates(request.enemies, &common_pool, &exclusion, self.config, rng)?;
        for candidate in candidates {
            if battle.newly_dropped.contains(&candidate.item_id) {
                continue;
            }
            let item = self.lookup(candidate.item_id)?;
            self.roll_item(
                &mut battle,
                item,
                ItemCategory::Normal,
                candidate.source_enemy_id,
                rng,
            );
        }

        Ok(DropOutcome {
            results: battle.results,
            daily_state: battle.daily,
            newly_dropped: battle.newly_dropped,
        })
    }

    fn lookup(&self, item_id: ItemId) -> Result<&'a ItemDef, LootError> {
        self.master
            .item(item_id)
            .ok_or(LootError::MissingItem { item_id })
    }

    fn roll_item<R>(
        &self,
        battle: &mut BattleDrops<'_>,
        item: &ItemDef,
        category: ItemCategory,
        source_enemy_id: EnemyId,
        rng: &mut R,
    ) where
        R: RandomSource + ?Sized,
    {
        let bonuses = battle.ctx.bonuses;
        let roll = self.calculator.roll(
            category,
            bonuses.rare_drop_multiplier(),
            battle.ctx.ticket_active,
            f64::from(bonuses.fortune()),
            rng,
        );
        if !roll.will_drop {
            return;
        }
        let award = assign_titles(
            &battle.ctx,
            category,
            &mut battle.daily,
            &mut battle.session,
            rng,
        );
        battle.results.push(DropResult {
            item_id: item.id,
            quantity: DROP_QUANTITY,
            source_enemy_id: Some(source_enemy_id),
            normal_title_id: award.normal_title_id,
            super_rare_title_id: award.super_rare_title_id,
        });
        battle.newly_dropped.insert(item.id);
    }
}

struct BattleDrops<'a> {
    ctx: TitleContext<'a>,
    daily: DailySuperRareState,
    session: SessionSuperRareState,
    results: Vec<DropResult>,
    newly_dropped: BTreeSet<ItemId>,
}

/// Resolve one battle with the identity threshold correction.
///
/// # Errors
///
/// See [`DropEngine::resolve`].
pub fn resolve_drops<M, S, R>(
    master: &M,
    skills: &S,
    config: &LootConfig,
    request: &DropRequest<'_>,
    daily_state: DailySuperRareState,
    rng: &mut R,
) -> Result<DropOutcome, LootError>
where
    M: MasterDataCache,
    S: SkillCompiler,
    R: RandomSource + ?Sized,
{
    DropEngine::new(master, skills, config).resolve(request, daily_state, rng)
}
