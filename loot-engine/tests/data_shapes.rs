use std::collections::{BTreeMap, HashSet};
use std::hash::Hasher;

use loot_engine::config::{
    RACE_DIVINE_DEMONIC, RACE_DRAGONKIN, RACE_HUMANOID, RACE_MONSTER, RACE_UNDEAD,
};
use loot_engine::{
    ItemCategory, LootConfig, MasterData, MasterDataCache, RarityTier, SkillCompiler, SkillRef,
    categorize,
};
use serde_json::Value;
use twox_hash::XxHash64;

#[test]
fn bundled_config_validates() {
    let config = LootConfig::load_from_static();
    config.validate().expect("bundled config is valid");
    for race in [
        RACE_HUMANOID,
        RACE_MONSTER,
        RACE_UNDEAD,
        RACE_DRAGONKIN,
        RACE_DIVINE_DEMONIC,
    ] {
        let table = config.race_weights(race).expect("race table");
        assert!(table.weights.iter().all(|entry| entry.weight > 0));
    }
}

#[test]
fn every_enemy_drop_resolves_to_an_item() {
    let master = MasterData::bundled().expect("bundled master data");
    for enemy in master.enemies() {
        assert!(!enemy.drops.is_empty(), "{} has no loot table", enemy.name);
        for id in &enemy.drops {
            assert!(
                master.item(*id).is_some(),
                "{} drops unknown item {id}",
                enemy.name
            );
        }
    }
}

#[test]
fn every_enemy_race_has_weights_and_common_stock() {
    let master = MasterData::bundled().expect("bundled master data");
    let config = LootConfig::load_from_static();
    for enemy in master.enemies() {
        let table = config
            .race_weights(enemy.race)
            .unwrap_or_else(|| panic!("race {} has no weight table", enemy.race));
        let limit = config.sell_value_limit(enemy.level);
        let stocked = table.weights.iter().any(|entry| {
            master
                .items()
                .iter()
                .any(|item| item.kind == entry.kind && item.rarity == RarityTier::Common && item.sell_value <= limit)
        });
        assert!(stocked, "{} can never roll a generated drop", enemy.name);
    }
}

#[test]
fn bundled_items_cover_every_category() {
    let master = MasterData::bundled().expect("bundled master data");
    let seen: HashSet<ItemCategory> = master.items().iter().map(categorize).collect();
    for category in ItemCategory::ALL {
        assert!(seen.contains(&category), "no {category} item in bundled data");
    }
}

#[test]
fn bundled_titles_are_well_formed() {
    let master = MasterData::bundled().expect("bundled master data");
    let titles = master.titles();
    assert!(titles.iter().any(|t| t.drop_probability > 0.0));
    assert!(titles.iter().any(|t| t.super_rare_rates.is_some()));
    assert!(titles.iter().any(|t| !t.allow_with_title_treasure));
    assert!(master.title(6).is_some(), "boss-tier title missing");
    for title in titles {
        assert!(title.drop_probability.is_finite() && title.drop_probability >= 0.0);
        if let Some(multiplier) = title.rank_multiplier {
            assert!(multiplier.is_finite() && multiplier > 0.0, "{}", title.name);
        }
    }
    assert!(!master.super_rare_titles().is_empty());
}

#[test]
fn bundled_skills_compile() {
    let master = MasterData::bundled().expect("bundled master data");
    let all: Vec<SkillRef> = master.skills().iter().map(|s| SkillRef { id: s.id }).collect();
    let scales = master.compile(&all).expect("bundled skills compile");
    assert!(scales.gold >= 1.0);
    assert!(scales.item_drop >= 1.0);
    assert!(scales.title >= 1.0);
}

#[test]
fn config_snapshot_survives_round_trip() {
    let config = LootConfig::load_from_static();
    let canonical = canonical_json(&serde_json::to_value(&config).expect("serialize config"));
    let reparsed = LootConfig::from_json(&canonical).expect("reparse config");
    assert_eq!(reparsed, config);
    let again = canonical_json(&serde_json::to_value(&reparsed).expect("serialize config"));
    assert_eq!(snapshot_hash(canonical.as_bytes()), snapshot_hash(again.as_bytes()));
}

fn canonical_json(value: &Value) -> String {
    fn canonicalize(value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> = map
                    .iter()
                    .map(|(key, inner)| (key.clone(), canonicalize(inner)))
                    .collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
            other => other.clone(),
        }
    }
    serde_json::to_string_pretty(&canonicalize(value)).expect("serialize snapshot")
}

fn snapshot_hash(bytes: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(bytes);
    hasher.finish()
}
