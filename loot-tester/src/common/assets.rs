use loot_engine::{DataLoader, LootConfig, MasterData, MasterDataError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid master data in {path}: {source}")]
    MasterData {
        path: String,
        #[source]
        source: MasterDataError,
    },
    #[error("invalid loot config in {path}: {source}")]
    Config {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Bundled(#[from] MasterDataError),
}

/// Loads master data and tuning from disk, falling back to the bundled sets.
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    master_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
}

impl FileLoader {
    #[must_use]
    pub const fn new(master_path: Option<PathBuf>, config_path: Option<PathBuf>) -> Self {
        Self {
            master_path,
            config_path,
        }
    }
}

fn read(path: &Path) -> Result<String, AssetError> {
    fs::read_to_string(path).map_err(|source| AssetError::Io {
        path: path.display().to_string(),
        source,
    })
}

impl DataLoader for FileLoader {
    type Error = AssetError;

    fn load_master_data(&self) -> Result<MasterData, Self::Error> {
        let Some(path) = &self.master_path else {
            return Ok(MasterData::bundled()?);
        };
        let json = read(path)?;
        MasterData::from_json(&json).map_err(|source| AssetError::MasterData {
            path: path.display().to_string(),
            source,
        })
    }

    fn load_loot_config(&self) -> Result<LootConfig, Self::Error> {
        let Some(path) = &self.config_path else {
            return Ok(LootConfig::load_from_static());
        };
        let json = read(path)?;
        LootConfig::from_json(&json).map_err(|source| AssetError::Config {
            path: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loot_engine::{LootTables, MasterDataCache};

    fn temp_file(label: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "loot-tester-{label}-{}.json",
            std::process::id()
        ));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn defaults_to_bundled_data() {
        let tables = LootTables::load(&FileLoader::default()).unwrap();
        assert!(!tables.master().items().is_empty());
        assert!(tables.config().validate().is_ok());
    }

    #[test]
    fn reads_overrides_from_disk() {
        let master = temp_file(
            "master",
            r#"{ "items": [ { "id": 1, "name": "Pebble", "kind": "gem" } ] }"#,
        );
        let config = temp_file("config", r#"{ "top_sell_limit": 5 }"#);
        let loader = FileLoader::new(Some(master), Some(config));
        let tables = LootTables::load(&loader).unwrap();
        assert_eq!(tables.master().items().len(), 1);
        assert_eq!(tables.config().top_sell_limit, 5);
    }

    #[test]
    fn reports_missing_and_malformed_files() {
        let missing = FileLoader::new(Some(PathBuf::from("/definitely/not/here.json")), None);
        assert!(matches!(
            missing.load_master_data(),
            Err(AssetError::Io { .. })
        ));
        let broken = temp_file("broken", "{ not json");
        let loader = FileLoader::new(None, Some(broken));
        assert!(matches!(
            loader.load_loot_config(),
            Err(AssetError::Config { .. })
        ));
    }
}
