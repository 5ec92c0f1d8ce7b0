use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use loot_engine::LootTables;

use crate::logic::seeds::SeedInfo;
use crate::logic::simulation::{SimulationPlan, SimulationSession, SimulationSummary};

/// Outcome of simulating one seed twice and comparing the runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedResult {
    pub seed: SeedInfo,
    pub passed: bool,
    pub failures: Vec<String>,
    pub summary: Option<SimulationSummary>,
    pub replay_fingerprint: Option<u64>,
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

pub struct LootTester<'a> {
    tables: &'a LootTables,
    verbose: bool,
}

impl<'a> LootTester<'a> {
    pub const fn new(tables: &'a LootTables, verbose: bool) -> Self {
        Self { tables, verbose }
    }

    pub fn run_seeds(&self, plan: &SimulationPlan, seeds: &[SeedInfo]) -> Vec<SeedResult> {
        seeds.iter().map(|seed| self.run_seed(plan, seed)).collect()
    }

    /// Simulate a seed, then replay it and require an identical fingerprint.
    pub fn run_seed(&self, plan: &SimulationPlan, seed: &SeedInfo) -> SeedResult {
        let start_time = Instant::now();
        if self.verbose {
            println!(
                "🎲 Simulating seed {} ({} battles)",
                seed.display_name().bright_white(),
                plan.battles
            );
        }

        let mut failures = Vec::new();
        let first = SimulationSession::new(self.tables, plan, seed.seed).run();
        let replay = SimulationSession::new(self.tables, plan, seed.seed).run();

        let (summary, replay_fingerprint) = match (first, replay) {
            (Ok(summary), Ok(replayed)) => {
                if summary != replayed {
                    failures.push(format!(
                        "replay diverged: fingerprint {:016x} vs {:016x}",
                        summary.fingerprint, replayed.fingerprint
                    ));
                }
                let replay_fingerprint = replayed.fingerprint;
                (Some(summary), Some(replay_fingerprint))
            }
            (Err(err), _) | (_, Err(err)) => {
                failures.push(format!("drop resolution failed: {err}"));
                (None, None)
            }
        };

        let duration = start_time.elapsed();
        if self.verbose {
            if failures.is_empty() {
                println!("  ✅ seed {} passed ({duration:?})", seed.seed);
            } else {
                for failure in &failures {
                    println!("  ❌ seed {}: {}", seed.seed, failure.red());
                }
            }
        }

        SeedResult {
            seed: seed.clone(),
            passed: failures.is_empty(),
            failures,
            summary,
            replay_fingerprint,
            duration,
        }
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}
