//! The single recognized configuration surface: a typed struct loaded from
//! TOML, rejecting unknown keys at load time rather than accepting a
//! runtime-typed configuration bag.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LeIndexError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct StorageConfig {
    /// Root directory under which `<project_id>/store.db`,
    /// `<project_id>/cache/`, and `registry.db` live.
    pub data_dir: PathBuf,
    /// Least-recent-use cap on `analysis_cache` rows; `None` means entries
    /// never expire.
    pub analysis_cache_capacity: Option<usize>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".leindex"),
            analysis_cache_capacity: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct VectorConfig {
    pub dimension: usize,
    pub max_nb_connection: usize,
    pub ef_construction: usize,
    pub ef_search: usize,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            dimension: 384,
            max_nb_connection: 24,
            ef_construction: 200,
            ef_search: 64,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RankerConfig {
    pub semantic_weight: f32,
    pub structural_weight: f32,
    pub text_weight: f32,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            semantic_weight: 0.5,
            structural_weight: 0.3,
            text_weight: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct GravityTuning {
    pub semantic_weight: f32,
    pub structural_weight: f32,
    pub decay: f32,
}

impl Default for GravityTuning {
    fn default() -> Self {
        Self {
            semantic_weight: 0.6,
            structural_weight: 0.4,
            decay: 2.0,
        }
    }
}

/// Memory governor thresholds, expressed as fractions of `budget_bytes`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct MemoryConfig {
    pub budget_bytes: u64,
    pub warning_fraction: f32,
    pub prompt_fraction: f32,
    pub emergency_fraction: f32,
    pub poll_interval_secs: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            budget_bytes: 2 * 1024 * 1024 * 1024,
            warning_fraction: 0.80,
            prompt_fraction: 0.93,
            emergency_fraction: 0.98,
            poll_interval_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct IndexingConfig {
    pub worker_threads: usize,
    pub debounce_ms: u64,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            // `num_cpus` gives a sane default without a config edit on every machine.
            worker_threads: num_cpus::get().max(1),
            debounce_ms: 200,
        }
    }
}

/// The recognized options for the whole system. Unknown TOML keys at any
/// level are rejected at load time.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct LeIndexConfig {
    pub storage: StorageConfig,
    pub vector: VectorConfig,
    pub ranker: RankerConfig,
    pub gravity: GravityTuning,
    pub memory: MemoryConfig,
    pub indexing: IndexingConfig,
}

impl LeIndexConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            LeIndexError::invalid_input(
                "config.read_failed",
                format!("could not read {}: {e}", path.as_ref().display()),
            )
        })?;
        let config: LeIndexConfig = toml::from_str(&text).map_err(|e| {
            LeIndexError::invalid_input("config.parse_failed", format!("invalid config: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Range checks on weights/thresholds.
    pub fn validate(&self) -> Result<()> {
        let weights = [
            self.ranker.semantic_weight,
            self.ranker.structural_weight,
            self.ranker.text_weight,
        ];
        if weights.iter().any(|w| *w < 0.0) {
            return Err(LeIndexError::invalid_input(
                "config.negative_weight",
                "ranker weights must be non-negative",
            ));
        }
        let fractions = [
            self.memory.warning_fraction,
            self.memory.prompt_fraction,
            self.memory.emergency_fraction,
        ];
        if !(fractions[0] < fractions[1] && fractions[1] < fractions[2]) {
            return Err(LeIndexError::invalid_input(
                "config.bad_memory_thresholds",
                "memory thresholds must be strictly increasing: warning < prompt < emergency",
            ));
        }
        if fractions.iter().any(|f| *f <= 0.0 || *f > 1.0) {
            return Err(LeIndexError::invalid_input(
                "config.bad_memory_thresholds",
                "memory thresholds must be in (0, 1]",
            ));
        }
        if self.gravity.decay < 1.0 {
            return Err(LeIndexError::invalid_input(
                "config.bad_decay",
                "gravity decay must be >= 1",
            ));
        }
        Ok(())
    }

    pub fn project_dir(&self, project_id: &str) -> PathBuf {
        self.storage.data_dir.join(project_id)
    }

    pub fn store_path(&self, project_id: &str) -> PathBuf {
        self.project_dir(project_id).join("store.db")
    }

    pub fn cache_dir(&self, project_id: &str) -> PathBuf {
        self.project_dir(project_id).join("cache")
    }

    pub fn registry_path(&self) -> PathBuf {
        self.storage.data_dir.join("registry.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(LeIndexConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_unknown_keys() {
        let toml_text = "[storage]\ndata_dir = \".x\"\nbogus_key = 1\n";
        let result: std::result::Result<LeIndexConfig, _> = toml::from_str(toml_text);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_out_of_order_memory_thresholds() {
        let mut config = LeIndexConfig::default();
        config.memory.warning_fraction = 0.9;
        config.memory.prompt_fraction = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_decay_below_one() {
        let mut config = LeIndexConfig::default();
        config.gravity.decay = 0.5;
        assert!(config.validate().is_err());
    }
}
