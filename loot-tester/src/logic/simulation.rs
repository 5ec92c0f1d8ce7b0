use chrono::{Datelike, Days, NaiveDate};
use loot_engine::constants::BOSS_TIER_TITLE_ID;
use loot_engine::{
    DailySuperRareState, DayKey, DropOutcome, DropRequest, EnemyDef, GameRandom, ItemCategory,
    ItemId, LootError, LootTables, MasterDataCache, PartyMember, RandomSource, TitleId, categorize,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::hash::Hasher;
use twox_hash::XxHash64;

/// Battle schedule and flags shared by every seed in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationPlan {
    pub battles: u32,
    pub battles_per_day: u32,
    /// Battles that share one dropped-id set, like one dungeon floor.
    pub battles_per_floor: u32,
    pub max_group_size: u32,
    pub start_date: NaiveDate,
    pub ticket_active: bool,
    pub title_treasure_active: bool,
    pub enemy_title_id: Option<TitleId>,
    /// Title carried by groups that include a boss, unless `enemy_title_id` is set.
    pub boss_title_id: TitleId,
    pub party: Vec<PartyMember>,
}

impl SimulationPlan {
    #[must_use]
    pub fn new(start_date: NaiveDate, party: Vec<PartyMember>) -> Self {
        Self {
            battles: 500,
            battles_per_day: 50,
            battles_per_floor: 10,
            max_group_size: 3,
            start_date,
            ticket_active: false,
            title_treasure_active: false,
            enemy_title_id: None,
            boss_title_id: BOSS_TIER_TITLE_ID,
            party,
        }
    }

    #[must_use]
    pub fn with_battles(mut self, battles: u32) -> Self {
        self.battles = battles;
        self
    }

    fn enemy_title_for(&self, group: &[EnemyDef]) -> Option<TitleId> {
        self.enemy_title_id.or_else(|| {
            group
                .iter()
                .any(|enemy| enemy.is_boss)
                .then_some(self.boss_title_id)
        })
    }

    fn date_for_battle(&self, battle: u32) -> NaiveDate {
        let day = battle / self.battles_per_day.max(1);
        self.start_date
            .checked_add_days(Days::new(u64::from(day)))
            .unwrap_or(self.start_date)
    }
}

pub fn day_key(date: NaiveDate) -> DayKey {
    DayKey::from_ymd(u32::try_from(date.year()).unwrap_or(0), date.month(), date.day())
}

/// Aggregated drop statistics for one seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub seed: u64,
    pub battles: u32,
    pub days: u32,
    pub enemies_defeated: usize,
    pub drops: usize,
    pub drops_by_category: BTreeMap<ItemCategory, usize>,
    pub titled_drops: usize,
    pub super_rare_drops: usize,
    /// Super-rare drops whose normal title was stripped.
    pub stripped_titles: usize,
    /// Days on which the first super-rare title fired.
    pub super_rare_days: u32,
    pub fingerprint: u64,
}

/// Deterministic battle loop for one seed.
pub struct SimulationSession<'a> {
    tables: &'a LootTables,
    plan: &'a SimulationPlan,
    encounter_rng: GameRandom,
    drop_rng: GameRandom,
    daily: DailySuperRareState,
    floor_dropped: HashSet<ItemId>,
    hasher: XxHash64,
    summary: SimulationSummary,
}

impl<'a> SimulationSession<'a> {
    pub fn new(tables: &'a LootTables, plan: &'a SimulationPlan, seed: u64) -> Self {
        let drops_by_category = ItemCategory::ALL.iter().map(|c| (*c, 0)).collect();
        Self {
            tables,
            plan,
            encounter_rng: GameRandom::from_user_seed(seed, b"encounters"),
            drop_rng: GameRandom::from_user_seed(seed, b"drops"),
            daily: DailySuperRareState::new(day_key(plan.start_date)),
            floor_dropped: HashSet::new(),
            hasher: XxHash64::with_seed(0),
            summary: SimulationSummary {
                seed,
                battles: 0,
                days: 0,
                enemies_defeated: 0,
                drops: 0,
                drops_by_category,
                titled_drops: 0,
                super_rare_drops: 0,
                stripped_titles: 0,
                super_rare_days: 0,
                fingerprint: 0,
            },
        }
    }

    /// Run every planned battle.
    ///
    /// # Errors
    ///
    /// Propagates the first data error raised by drop resolution.
    pub fn run(mut self) -> Result<SimulationSummary, LootError> {
        let mut last_day = None;
        for battle in 0..self.plan.battles {
            let today = day_key(self.plan.date_for_battle(battle));
            if last_day != Some(today) {
                self.summary.days += 1;
                last_day = Some(today);
            }
            if battle % self.plan.battles_per_floor.max(1) == 0 {
                self.floor_dropped.clear();
            }
            self.daily = self.daily.rollover(today);
            let group = self.encounter();
            let outcome = self.fight(&group)?;
            self.record(&group, &outcome);
        }
        self.summary.fingerprint = self.hasher.finish();
        Ok(self.summary)
    }

    fn encounter(&mut self) -> Vec<EnemyDef> {
        let roster = self.tables.master().enemies();
        let Some(last) = roster.len().checked_sub(1) else {
            return Vec::new();
        };
        let last = u32::try_from(last).unwrap_or(u32::MAX);
        let size = self
            .encounter_rng
            .next_int(1..=self.plan.max_group_size.max(1));
        (0..size)
            .filter_map(|_| {
                let idx = usize::try_from(self.encounter_rng.next_int(0..=last)).ok()?;
                roster.get(idx).cloned()
            })
            .collect()
    }

    fn fight(&mut self, group: &[EnemyDef]) -> Result<DropOutcome, LootError> {
        let request = DropRequest {
            enemies: group,
            party: &self.plan.party,
            already_dropped: &self.floor_dropped,
            ticket_active: self.plan.ticket_active,
            title_treasure_active: self.plan.title_treasure_active,
            enemy_title_id: self.plan.enemy_title_for(group),
        };
        self.tables
            .resolve(&request, self.daily, &mut self.drop_rng)
    }

    fn record(&mut self, group: &[EnemyDef], outcome: &DropOutcome) {
        let summary = &mut self.summary;
        summary.battles += 1;
        summary.enemies_defeated += group.len();
        summary.drops += outcome.results.len();
        summary.titled_drops += outcome.titled_count();
        if !self.daily.has_triggered() && outcome.daily_state.has_triggered() {
            summary.super_rare_days += 1;
        }
        for result in &outcome.results {
            if let Some(item) = self.tables.master().item(result.item_id) {
                *summary.drops_by_category.entry(categorize(item)).or_default() += 1;
            }
            if result.super_rare_title_id.is_some() {
                summary.super_rare_drops += 1;
                if result.normal_title_id.is_none() {
                    summary.stripped_titles += 1;
                }
            }
        }
        log::debug!(
            "battle {} | {} enemies, {} drops, fingerprint {:016x}",
            summary.battles,
            group.len(),
            outcome.results.len(),
            outcome.fingerprint()
        );
        self.hasher.write_u64(outcome.fingerprint());
        self.daily = outcome.daily_state;
        outcome.remember_in(&mut self.floor_dropped);
    }
}
