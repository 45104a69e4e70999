//! On-disk configuration for the codesearch core.
//!
//! Loaded once at startup from `<base>/config/codesearch.toml`, following the
//! save/load shape of `julie::workspace::WorkspaceConfig` (serde + toml,
//! defaults when the file is absent).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default base directory, before tilde expansion: `~/.coa/codesearch`.
pub const DEFAULT_BASE_PATH: &str = "~/.coa/codesearch";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileWatcherConfig {
    pub debounce_ms: u64,
    pub delete_quiet_period_s: u64,
    pub atomic_write_window_ms: u64,
    pub batch_size: usize,
}

impl Default for FileWatcherConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            delete_quiet_period_s: 5,
            atomic_write_window_ms: 100,
            batch_size: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchIndexingConfig {
    pub batch_size: usize,
    pub max_batch_age_s: u64,
}

impl Default for BatchIndexingConfig {
    fn default() -> Self {
        Self {
            batch_size: 500,
            max_batch_age_s: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LockManagerConfig {
    pub test_artifact_min_age_m: u64,
    pub workspace_min_age_m: u64,
    pub stuck_lock_age_m: u64,
}

impl Default for LockManagerConfig {
    fn default() -> Self {
        Self {
            test_artifact_min_age_m: 1,
            workspace_min_age_m: 5,
            stuck_lock_age_m: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryPressureConfig {
    pub max_memory_mb: u64,
    pub throttle_threshold_percent: u8,
    pub gc_threshold_percent: u8,
}

impl Default for MemoryPressureConfig {
    fn default() -> Self {
        Self {
            max_memory_mb: 1024,
            throttle_threshold_percent: 80,
            gc_threshold_percent: 90,
        }
    }
}

fn default_excluded_directories() -> Vec<String> {
    [
        "bin",
        "obj",
        "node_modules",
        ".git",
        ".vs",
        "packages",
        "TestResults",
        ".coa",
        ".codesearch",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_supported_extensions() -> Vec<String> {
    crate::extractors::language_spec::all_recognized_extensions()
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_base_path() -> String {
    DEFAULT_BASE_PATH.to_string()
}

/// Top-level configuration, covering every tunable the indexing and
/// watching core exposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodesearchConfig {
    pub base_path: String,
    pub supported_extensions: Vec<String>,
    pub excluded_directories: Vec<String>,
    pub file_watcher: FileWatcherConfig,
    pub batch_indexing: BatchIndexingConfig,
    pub lock_manager: LockManagerConfig,
    pub memory_pressure: MemoryPressureConfig,
}

impl Default for CodesearchConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            supported_extensions: default_supported_extensions(),
            excluded_directories: default_excluded_directories(),
            file_watcher: FileWatcherConfig::default(),
            batch_indexing: BatchIndexingConfig::default(),
            lock_manager: LockManagerConfig::default(),
            memory_pressure: MemoryPressureConfig::default(),
        }
    }
}

impl CodesearchConfig {
    /// Load configuration from `path`, falling back to defaults if the file
    /// does not exist (mirrors `JulieWorkspace::load_config`).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let config: CodesearchConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| ConfigError::Write(path.to_path_buf(), e))
    }

    /// The base directory with a leading `~/` expanded against the user's
    /// home directory. Never creates the directory - expansion is pure.
    pub fn expanded_base_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.base_path).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = CodesearchConfig::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: CodesearchConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.file_watcher.debounce_ms, config.file_watcher.debounce_ms);
        assert_eq!(parsed.base_path, config.base_path);
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nonexistent.toml");
        let config = CodesearchConfig::load(&path).unwrap();
        assert_eq!(config.lock_manager.stuck_lock_age_m, 15);
    }

    #[test]
    fn tilde_expands_against_home_directory() {
        let mut config = CodesearchConfig::default();
        config.base_path = "~/.coa/codesearch".to_string();
        let expanded = config.expanded_base_path();
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }
}
