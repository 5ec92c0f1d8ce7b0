//! Injectable random source used by every drop roll.
//!
//! The engine never touches a global RNG; callers thread a [`RandomSource`]
//! through each call so battles replay exactly from a seed or a recorded
//! script.

use hmac::{Hmac, Mac};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;
use std::collections::VecDeque;
use std::ops::RangeInclusive;

use crate::constants::{THRESHOLD_CEILING, THRESHOLD_FLOOR};

/// Random draws consumed by drop resolution.
pub trait RandomSource {
    /// Uniform integer in `range`. An empty range yields its start.
    fn next_int(&mut self, range: RangeInclusive<u32>) -> u32;

    /// `true` with the given probability (clamped to `[0, 1]`).
    fn next_bool(&mut self, probability: f64) -> bool;

    /// Weighted index draw, or `None` when no weight is positive.
    fn next_index(&mut self, weights: &[f64]) -> Option<usize>;

    /// Roll on the 0–100 scale biased upward as `lower_bound` (party luck) grows.
    fn next_luck_random(&mut self, lower_bound: f64) -> f64;
}

/// Clamp a luck value into the roll's lower bound.
#[must_use]
pub fn luck_lower_bound(luck: f64) -> f64 {
    if luck.is_nan() {
        return THRESHOLD_FLOOR;
    }
    luck.clamp(THRESHOLD_FLOOR, THRESHOLD_CEILING)
}

/// [`RandomSource`] backed by any `rand` generator, counting draws for instrumentation.
#[derive(Debug, Clone)]
pub struct GameRandom<R = ChaCha20Rng> {
    rng: R,
    draws: u64,
}

impl GameRandom<ChaCha20Rng> {
    /// ChaCha20 stream seeded directly from `seed`.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha20Rng::seed_from_u64(seed))
    }

    /// Independent stream derived from a user-visible seed and a domain tag.
    #[must_use]
    pub fn from_user_seed(seed: u64, domain_tag: &[u8]) -> Self {
        Self::seeded(derive_stream_seed(seed, domain_tag))
    }
}

impl<R: RngCore> GameRandom<R> {
    #[must_use]
    pub const fn new(rng: R) -> Self {
        Self { rng, draws: 0 }
    }

    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }

    fn count(&mut self) {
        self.draws = self.draws.saturating_add(1);
    }
}

impl<R: RngCore> RandomSource for GameRandom<R> {
    fn next_int(&mut self, range: RangeInclusive<u32>) -> u32 {
        self.count();
        if range.is_empty() {
            return *range.start();
        }
        self.rng.gen_range(range)
    }

    fn next_bool(&mut self, probability: f64) -> bool {
        self.count();
        if probability.is_nan() || probability <= 0.0 {
            return false;
        }
        if probability >= 1.0 {
            return true;
        }
        self.rng.gen_bool(probability)
    }

    fn next_index(&mut self, weights: &[f64]) -> Option<usize> {
        self.count();
        let usable = |weight: f64| weight.is_finite() && weight > 0.0;
        let total: f64 = weights.iter().copied().filter(|w| usable(*w)).sum();
        if !total.is_finite() || total <= 0.0 {
            return None;
        }
        let roll = self.rng.gen_range(0.0..total);
        let mut cumulative = 0.0;
        let mut last_usable = None;
        for (idx, weight) in weights.iter().copied().enumerate() {
            if !usable(weight) {
                continue;
            }
            cumulative += weight;
            last_usable = Some(idx);
            if roll < cumulative {
                return Some(idx);
            }
        }
        last_usable
    }

    fn next_luck_random(&mut self, lower_bound: f64) -> f64 {
        self.count();
        let lower = luck_lower_bound(lower_bound);
        if lower >= THRESHOLD_CEILING {
            return THRESHOLD_CEILING;
        }
        self.rng.gen_range(lower..=THRESHOLD_CEILING)
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0_u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

/// Replays a recorded sequence of draws.
///
/// Each draw kind has its own queue. When a queue runs dry the source answers
/// with a neutral value (range start, `false`, `None`, the luck lower bound)
/// and counts the shortfall in [`ScriptedRandom::misses`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    ints: VecDeque<u32>,
    bools: VecDeque<bool>,
    indices: VecDeque<Option<usize>>,
    luck_rolls: VecDeque<f64>,
    misses: u32,
}

impl ScriptedRandom {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_ints(mut self, values: impl IntoIterator<Item = u32>) -> Self {
        self.ints.extend(values);
        self
    }

    #[must_use]
    pub fn with_bools(mut self, values: impl IntoIterator<Item = bool>) -> Self {
        self.bools.extend(values);
        self
    }

    #[must_use]
    pub fn with_indices(mut self, values: impl IntoIterator<Item = Option<usize>>) -> Self {
        self.indices.extend(values);
        self
    }

    #[must_use]
    pub fn with_luck_rolls(mut self, values: impl IntoIterator<Item = f64>) -> Self {
        self.luck_rolls.extend(values);
        self
    }

    /// Draws answered with a fallback because their queue was empty.
    #[must_use]
    pub const fn misses(&self) -> u32 {
        self.misses
    }

    /// `true` once every queued value has been consumed.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.ints.is_empty()
            && self.bools.is_empty()
            && self.indices.is_empty()
            && self.luck_rolls.is_empty()
    }

    fn miss<T>(&mut self, fallback: T) -> T {
        self.misses = self.misses.saturating_add(1);
        fallback
    }
}

impl RandomSource for ScriptedRandom {
    fn next_int(&mut self, range: RangeInclusive<u32>) -> u32 {
        match self.ints.pop_front() {
            Some(value) if range.is_empty() => value,
            Some(value) => value.clamp(*range.start(), *range.end()),
            None => self.miss(*range.start()),
        }
    }

    fn next_bool(&mut self, _probability: f64) -> bool {
        match self.bools.pop_front() {
            Some(value) => value,
            None => self.miss(false),
        }
    }

    fn next_index(&mut self, weights: &[f64]) -> Option<usize> {
        match self.indices.pop_front() {
            Some(value) => value.filter(|idx| *idx < weights.len()),
            None => self.miss(None),
        }
    }

    fn next_luck_random(&mut self, lower_bound: f64) -> f64 {
        match self.luck_rolls.pop_front() {
            Some(value) => value,
            None => self.miss(luck_lower_bound(lower_bound)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn luck_roll_respects_lower_bound() {
        let mut rng = GameRandom::seeded(7);
        for _ in 0..500 {
            let roll = rng.next_luck_random(40.0);
            assert!((40.0..=100.0).contains(&roll), "roll {roll} out of range");
        }
        assert!((rng.next_luck_random(250.0) - 100.0).abs() < f64::EPSILON);
        let roll = rng.next_luck_random(f64::NAN);
        assert!((0.0..=100.0).contains(&roll));
    }

    #[test]
    fn luck_roll_mean_grows_with_luck() {
        let mut low = GameRandom::seeded(11);
        let mut high = GameRandom::seeded(11);
        let samples = 2_000;
        let low_mean: f64 = (0..samples).map(|_| low.next_luck_random(0.0)).sum::<f64>()
            / f64::from(samples);
        let high_mean: f64 = (0..samples).map(|_| high.next_luck_random(30.0)).sum::<f64>()
            / f64::from(samples);
        assert!(high_mean > low_mean);
    }

    #[test]
    fn next_index_skips_non_positive_weights() {
        let mut rng = GameRandom::new(StepRng::new(0, 0));
        assert_eq!(rng.next_index(&[0.0, -1.0, 3.0, 2.0]), Some(2));
        assert_eq!(rng.next_index(&[]), None);
        assert_eq!(rng.next_index(&[0.0, f64::NAN]), None);
    }

    #[test]
    fn next_index_distribution_tracks_weights() {
        let mut rng = GameRandom::seeded(3);
        let mut hits = [0_u32; 2];
        for _ in 0..4_000 {
            let idx = rng.next_index(&[1.0, 3.0]).unwrap();
            hits[idx] += 1;
        }
        let share = f64::from(hits[1]) / 4_000.0;
        assert!((share - 0.75).abs() < 0.03, "share drifted: {share}");
    }

    #[test]
    fn next_int_handles_degenerate_ranges() {
        let mut rng = GameRandom::seeded(5);
        assert_eq!(rng.next_int(4..=4), 4);
        #[allow(clippy::reversed_empty_ranges)]
        let empty = 9..=3;
        assert_eq!(rng.next_int(empty), 9);
        for _ in 0..100 {
            assert!((1..=6).contains(&rng.next_int(1..=6)));
        }
    }

    #[test]
    fn next_bool_saturates() {
        let mut rng = GameRandom::seeded(1);
        assert!(!rng.next_bool(0.0));
        assert!(!rng.next_bool(f64::NAN));
        assert!(rng.next_bool(1.5));
        assert_eq!(rng.draws(), 3);
    }

    #[test]
    fn derived_streams_are_stable_and_independent() {
        let mut a = GameRandom::from_user_seed(1337, b"battle");
        let mut b = GameRandom::from_user_seed(1337, b"battle");
        let mut c = GameRandom::from_user_seed(1337, b"floor");
        let seq_a: Vec<u32> = (0..8).map(|_| a.next_int(0..=1_000_000)).collect();
        let seq_b: Vec<u32> = (0..8).map(|_| b.next_int(0..=1_000_000)).collect();
        let seq_c: Vec<u32> = (0..8).map(|_| c.next_int(0..=1_000_000)).collect();
        assert_eq!(seq_a, seq_b);
        assert_ne!(seq_a, seq_c);
    }

    #[test]
    fn scripted_source_replays_and_counts_misses() {
        let mut script = ScriptedRandom::new()
            .with_ints([12, 0])
            .with_bools([true])
            .with_indices([Some(1), Some(9)])
            .with_luck_rolls([95.5]);

        assert_eq!(script.next_int(0..=10), 10);
        assert_eq!(script.next_int(1..=3), 1);
        assert!(script.next_bool(0.0));
        assert_eq!(script.next_index(&[1.0, 1.0]), Some(1));
        assert_eq!(script.next_index(&[1.0, 1.0]), None);
        assert!((script.next_luck_random(0.0) - 95.5).abs() < f64::EPSILON);
        assert!(script.is_exhausted());
        assert_eq!(script.misses(), 0);

        assert!(!script.next_bool(1.0));
        assert!((script.next_luck_random(20.0) - 20.0).abs() < f64::EPSILON);
        assert_eq!(script.misses(), 2);
    }
}
