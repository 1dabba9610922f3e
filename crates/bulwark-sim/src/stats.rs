//! Persistent stats stores.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use bulwark_core::error::StatsError;

use crate::collaborators::PersistentStatsStore;

/// In-memory store. `save` is a no-op that counts calls.
#[derive(Debug, Clone, Default)]
pub struct MemoryStatsStore {
    values: BTreeMap<String, i64>,
    saves: u32,
}

impl MemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: &str, value: i64) -> Self {
        self.values.insert(key.to_string(), value);
        self
    }

    /// How many times `save` was called.
    pub fn save_count(&self) -> u32 {
        self.saves
    }
}

impl PersistentStatsStore for MemoryStatsStore {
    fn get_int(&self, key: &str, default: i64) -> i64 {
        self.values.get(key).copied().unwrap_or(default)
    }

    fn set_int(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_string(), value);
    }

    fn save(&mut self) -> Result<(), StatsError> {
        self.saves += 1;
        Ok(())
    }
}

/// Store backed by a pretty-printed JSON object on disk.
#[derive(Debug, Clone)]
pub struct JsonStatsStore {
    path: PathBuf,
    values: BTreeMap<String, i64>,
}

impl JsonStatsStore {
    /// Open `path`. A missing file starts empty; a malformed one is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StatsError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StatsError::Io { path, source }),
        };
        Ok(Self { path, values })
    }

    /// Open `path`, falling back to an empty store when it cannot be read.
    pub fn open_or_default(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::open(&path) {
            Ok(store) => store,
            Err(err) => {
                warn!(error = %err, "stats file unusable; starting empty");
                Self {
                    path,
                    values: BTreeMap::new(),
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistentStatsStore for JsonStatsStore {
    fn get_int(&self, key: &str, default: i64) -> i64 {
        self.values.get(key).copied().unwrap_or(default)
    }

    fn set_int(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_string(), value);
    }

    fn save(&mut self) -> Result<(), StatsError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| StatsError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, json).map_err(|source| StatsError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_defaults_and_saves() {
        let mut store = MemoryStatsStore::new().with_value("a", 3);
        assert_eq!(store.get_int("a", 0), 3);
        assert_eq!(store.get_int("missing", -1), -1);
        store.set_int("a", 9);
        store.save().unwrap();
        assert_eq!(store.get_int("a", 0), 9);
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_json_store_persists_between_opens() {
        let dir = std::env::temp_dir().join("bulwark_test_stats_persist");
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("stats.json");

        let mut store = JsonStatsStore::open(&path).unwrap();
        assert_eq!(store.get_int("best_run_kills", 0), 0);
        store.set_int("best_run_kills", 41);
        store.save().unwrap();

        let reopened = JsonStatsStore::open(&path).unwrap();
        assert_eq!(reopened.get_int("best_run_kills", 0), 41);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_json_store_rejects_malformed_file() {
        let dir = std::env::temp_dir().join("bulwark_test_stats_malformed");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("stats.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(JsonStatsStore::open(&path), Err(StatsError::Format(_))));
        let fallback = JsonStatsStore::open_or_default(&path);
        assert_eq!(fallback.get_int("best_run_kills", 7), 7);

        let _ = fs::remove_dir_all(&dir);
    }
}
