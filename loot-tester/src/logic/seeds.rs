use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Seed metadata carried into reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedInfo {
    pub seed: u64,
    /// Word the seed was derived from, when it was not numeric.
    pub label: Option<String>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self { seed, label: None }
    }

    #[must_use]
    pub fn from_word(word: &str) -> Self {
        let normalized = word.to_uppercase();
        Self {
            seed: word_seed(&normalized),
            label: Some(normalized),
        }
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.label {
            Some(label) => format!("{label} ({})", self.seed),
            None => self.seed.to_string(),
        }
    }
}

/// Resolve CLI seed tokens into canonical seeds.
///
/// Supports decimal integers (negative values use their magnitude), `0x`
/// hexadecimal, and plain words, which are hashed into a seed so that
/// `--seeds dragon` is reproducible across machines.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut resolved = Vec::new();
    let mut seen = HashSet::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }
        let info = parse_token(token)?;
        if seen.insert(info.seed) {
            resolved.push(info);
        }
    }

    if resolved.is_empty() {
        resolved.push(SeedInfo::from_numeric(1337));
    }
    Ok(resolved)
}

fn parse_token(token: &str) -> Result<SeedInfo> {
    if let Ok(value) = token.parse::<i64>() {
        return Ok(SeedInfo::from_numeric(value.unsigned_abs()));
    }
    if let Ok(value) = token.parse::<u64>() {
        return Ok(SeedInfo::from_numeric(value));
    }
    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        return match u64::from_str_radix(&hex.replace('_', ""), 16) {
            Ok(value) => Ok(SeedInfo::from_numeric(value)),
            Err(_) => bail!("Unrecognized seed token: {token}"),
        };
    }
    if token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Ok(SeedInfo::from_word(token));
    }
    bail!("Unrecognized seed token: {token}")
}

fn word_seed(word: &str) -> u64 {
    let digest = Sha256::digest(word.as_bytes());
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}
