//! Procedural common-tier drops.
//!
//! Besides its fixed loot table every defeated enemy may offer one extra
//! common item. The equipment kind comes from the enemy race's weight table
//! and the item is picked uniformly among affordable items of that kind.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::config::{KindWeight, LootConfig};
use crate::data::{EnemyDef, EnemyId, ItemDef, ItemId, ItemKind};
use crate::error::LootError;
use crate::random::RandomSource;

/// A generated drop proposal, rolled later as a normal-category item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalCandidate {
    pub item_id: ItemId,
    pub source_enemy_id: EnemyId,
}

/// Propose at most one common-tier item per enemy, in enemy order.
///
/// Enemies whose race has no weight table, or whose chosen kind has nothing
/// left after excluding `already_dropped`, yield no candidate.
///
/// # Errors
///
/// Returns [`LootError::DegenerateRaceWeights`] when a configured race weight
/// table sums to zero.
pub fn generate_candidates<R>(
    enemies: &[EnemyDef],
    common_items: &[&ItemDef],
    already_dropped: &HashSet<ItemId>,
    config: &LootConfig,
    rng: &mut R,
) -> Result<Vec<NormalCandidate>, LootError>
where
    R: RandomSource + ?Sized,
{
    let mut candidates = Vec::with_capacity(enemies.len());
    for enemy in enemies {
        if let Some(item_id) = candidate_for_enemy(enemy, common_items, already_dropped, config, rng)? {
            candidates.push(NormalCandidate {
                item_id,
                source_enemy_id: enemy.id,
            });
        }
    }
    Ok(candidates)
}

fn candidate_for_enemy<R>(
    enemy: &EnemyDef,
    common_items: &[&ItemDef],
    already_dropped: &HashSet<ItemId>,
    config: &LootConfig,
    rng: &mut R,
) -> Result<Option<ItemId>, LootError>
where
    R: RandomSource + ?Sized,
{
    let Some(race) = config.race_weights(enemy.race) else {
        return Ok(None);
    };
    let total_weight = race.total_weight();
    if total_weight == 0 {
        return Err(LootError::DegenerateRaceWeights {
            race_id: enemy.race,
        });
    }

    let limit = config.sell_value_limit(enemy.level);
    let buckets = bucket_by_kind(common_items, limit);

    let pick = rng.next_int(0..=total_weight - 1);
    let kind = weighted_kind(&race.weights, pick);

    let remaining: Vec<ItemId> = buckets
        .get(&kind)
        .map(|items| {
            items
                .iter()
                .map(|item| item.id)
                .filter(|id| !already_dropped.contains(id))
                .collect()
        })
        .unwrap_or_default();
    if remaining.is_empty() {
        log::debug!(
            "normal drop | enemy {} rolled {kind:?} but nothing is eligible",
            enemy.id
        );
        return Ok(None);
    }

    let last = u32::try_from(remaining.len() - 1).unwrap_or(u32::MAX);
    let idx = usize::try_from(rng.next_int(0..=last)).unwrap_or(0);
    Ok(remaining.get(idx).or_else(|| remaining.last()).copied())
}

fn bucket_by_kind<'a>(items: &[&'a ItemDef], sell_limit: u32) -> BTreeMap<ItemKind, Vec<&'a ItemDef>> {
    let mut buckets: BTreeMap<ItemKind, Vec<&ItemDef>> = BTreeMap::new();
    for item in items.iter().copied().filter(|item| item.sell_value <= sell_limit) {
        buckets.entry(item.kind).or_default().push(item);
    }
    buckets
}

/// Walk cumulative weights until `pick` (in `[0, total)`) falls inside an entry.
fn weighted_kind(weights: &[KindWeight], pick: u32) -> ItemKind {
    let mut cumulative = 0_u32;
    for entry in weights {
        cumulative = cumulative.saturating_add(entry.weight);
        if pick < cumulative {
            return entry.kind;
        }
    }
    weights
        .iter()
        .rev()
        .find(|entry| entry.weight > 0)
        .map_or(ItemKind::Accessory, |entry| entry.kind)
}
