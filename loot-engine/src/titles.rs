//! Title assignment for dropped items.
//!
//! A dropped item may carry a normal title chosen by weighted draws over the
//! title pool; titles that declare super-rare rates may then escalate into a
//! super-rare title (see [`crate::super_rare`]).

use crate::category::ItemCategory;
use crate::constants::{
    LOW_RANK_TITLE_CEILING, NORMAL_TITLE_RATE_FACTOR, THRESHOLD_CEILING, TICKET_MULTIPLIER,
    TITLE_STRIP_CHANCE,
};
use crate::data::{SuperRareTitle, SuperRareTitleId, TitleDef, TitleId};
use crate::numbers::round_f64_to_u32;
use crate::party::PartyBonuses;
use crate::random::RandomSource;
use crate::super_rare::{
    DailySuperRareState, SessionSuperRareState, SuperRareOutcome, SuperRareRequest,
    evaluate_super_rare,
};

/// Roll whether a dropped item of `category` receives a title at all.
pub fn should_assign_title<R>(
    category: ItemCategory,
    bonuses: &PartyBonuses,
    ticket_active: bool,
    rng: &mut R,
) -> bool
where
    R: RandomSource + ?Sized,
{
    let ticket = if ticket_active { TICKET_MULTIPLIER } else { 1.0 };
    let title_rate = bonuses.title_grant_rate_multiplier() * ticket;
    let threshold = match category {
        ItemCategory::Normal => THRESHOLD_CEILING - title_rate * NORMAL_TITLE_RATE_FACTOR,
        ItemCategory::Good | ItemCategory::Rare | ItemCategory::Gem => {
            THRESHOLD_CEILING - title_rate
        }
    }
    .max(0.0);
    let roll = rng.next_luck_random(bonuses.average_luck());
    threshold < roll
}

/// Number of independent title draws granted by the enemy's title.
#[must_use]
pub fn judgment_count(enemy_title: Option<&TitleDef>) -> u32 {
    enemy_title
        .and_then(|title| title.rank_multiplier)
        .map_or(1, |multiplier| round_f64_to_u32(multiplier * multiplier).max(1))
}

fn is_title_candidate(title: &TitleDef, title_treasure_active: bool) -> bool {
    let droppable = title.drop_probability.is_finite() && title.drop_probability > 0.0;
    droppable && (!title_treasure_active || title.allow_with_title_treasure)
}

/// Pick the normal title for a dropped item, if any.
///
/// Draws `judgment_count(enemy_title)` weighted titles and keeps the highest
/// rank. Low-rank results are discarded for good and gem drops.
pub fn determine_normal_title<'a, R>(
    title_pool: &'a [TitleDef],
    enemy_title: Option<&TitleDef>,
    title_treasure_active: bool,
    category: ItemCategory,
    rng: &mut R,
) -> Option<&'a TitleDef>
where
    R: RandomSource + ?Sized,
{
    let candidates: Vec<&TitleDef> = title_pool
        .iter()
        .filter(|title| is_title_candidate(title, title_treasure_active))
        .collect();
    let last = candidates.last().copied()?;
    let weights: Vec<f64> = candidates.iter().map(|t| t.drop_probability).collect();

    let mut best: Option<&TitleDef> = None;
    for _ in 0..judgment_count(enemy_title) {
        let drawn = rng
            .next_index(&weights)
            .and_then(|idx| candidates.get(idx).copied())
            .unwrap_or(last);
        if best.is_none_or(|kept| drawn.rank() > kept.rank()) {
            best = Some(drawn);
        }
    }

    let best = best?;
    let suppressed = matches!(category, ItemCategory::Good | ItemCategory::Gem)
        && best.rank() <= LOW_RANK_TITLE_CEILING;
    if suppressed {
        return None;
    }
    Some(best)
}

/// Fixed-chance roll to drop the normal title once a super-rare title attaches.
pub fn should_remove_normal_title_after_super_rare<R>(rng: &mut R) -> bool
where
    R: RandomSource + ?Sized,
{
    rng.next_bool(TITLE_STRIP_CHANCE)
}

/// Uniform pick over the super-rare roster.
pub fn select_super_rare_title<R>(
    super_rare_pool: &[SuperRareTitle],
    rng: &mut R,
) -> Option<SuperRareTitleId>
where
    R: RandomSource + ?Sized,
{
    if super_rare_pool.is_empty() {
        return None;
    }
    let last = u32::try_from(super_rare_pool.len() - 1).unwrap_or(u32::MAX);
    let idx = usize::try_from(rng.next_int(0..=last)).unwrap_or(0);
    super_rare_pool
        .get(idx)
        .or_else(|| super_rare_pool.last())
        .map(|title| title.id)
}

/// Titles attached to one dropped item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TitleAward {
    pub normal_title_id: Option<TitleId>,
    pub super_rare_title_id: Option<SuperRareTitleId>,
}

/// Per-call inputs shared by every title assignment in a battle.
#[derive(Debug, Clone, Copy)]
pub struct TitleContext<'a> {
    pub bonuses: &'a PartyBonuses,
    pub ticket_active: bool,
    pub title_treasure_active: bool,
    pub enemy_title_id: Option<TitleId>,
    pub enemy_title: Option<&'a TitleDef>,
    pub title_pool: &'a [TitleDef],
    pub super_rare_pool: &'a [SuperRareTitle],
}

/// Run the full title pipeline for one dropped item.
pub fn assign_titles<R>(
    ctx: &TitleContext<'_>,
    category: ItemCategory,
    daily: &mut DailySuperRareState,
    session: &mut SessionSuperRareState,
    rng: &mut R,
) -> TitleAward
where
    R: RandomSource + ?Sized,
{
    if !should_assign_title(category, ctx.bonuses, ctx.ticket_active, rng) {
        return TitleAward::default();
    }
    let Some(normal) = determine_normal_title(
        ctx.title_pool,
        ctx.enemy_title,
        ctx.title_treasure_active,
        category,
        rng,
    ) else {
        return TitleAward::default();
    };
    log::debug!("title | {category} item gets title {} ({})", normal.id, normal.name);

    let request = SuperRareRequest {
        normal_title: normal,
        category,
        enemy_title_id: ctx.enemy_title_id,
        super_rare_pool: ctx.super_rare_pool,
    };
    match evaluate_super_rare(&request, daily, session, rng) {
        SuperRareOutcome::NotTriggered => TitleAward {
            normal_title_id: Some(normal.id),
            super_rare_title_id: None,
        },
        SuperRareOutcome::Triggered {
            title_id,
            strip_normal_title,
        } => TitleAward {
            normal_title_id: (!strip_normal_title).then_some(normal.id),
            super_rare_title_id: Some(title_id),
        },
    }
}
