//! Configuration management.

use crate::error::{ProbeError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Persistent configuration for stackprobe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Override for the compose binary (e.g. "/usr/local/bin/docker").
    pub compose_binary: Option<String>,
    /// Hard limit on `up -d --build` per target.
    pub build_timeout_secs: u64,
    /// Initial pause after a successful start before the first readiness check.
    pub settle_secs: u64,
    /// Maximum total wait for at least one running service.
    pub max_ready_wait_secs: u64,
    /// Full log file name (created in the output directory).
    pub log_file: String,
    /// Success list file name.
    pub success_file: String,
    /// Failure list file name.
    pub failure_file: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            compose_binary: None,
            build_timeout_secs: 600,
            settle_secs: 5,
            max_ready_wait_secs: 60,
            log_file: "compose_test.log".to_string(),
            success_file: "success_list.txt".to_string(),
            failure_file: "failed_list.txt".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        paths::config_path()
    }

    /// Load configuration from disk, falling back to defaults when absent.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| ProbeError::InvalidConfig {
            reason: format!("Failed to read config: {}", e),
        })?;
        serde_json::from_str(&content).map_err(|e| ProbeError::InvalidConfig {
            reason: format!("Failed to parse config: {}", e),
        })
    }

    /// Save configuration to disk.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ProbeError::IoError { path: parent.to_path_buf(), source: e })?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|e| ProbeError::InvalidConfig {
            reason: format!("Failed to serialize config: {}", e),
        })?;
        std::fs::write(&path, content).map_err(|e| ProbeError::IoError { path, source: e })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.build_timeout_secs, 600);
        assert_eq!(config.settle_secs, 5);
        assert_eq!(config.log_file, "compose_test.log");
        assert!(config.compose_binary.is_none());
    }

    #[test]
    fn test_roundtrip_json() {
        let config = Config { settle_secs: 2, ..Config::default() };
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.settle_secs, 2);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let back: Config = serde_json::from_str(r#"{"settle_secs": 9}"#).unwrap();
        assert_eq!(back.settle_secs, 9);
        assert_eq!(back.build_timeout_secs, 600);
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("STACKPROBE_DATA_DIR", dir.path());

        let config = Config { build_timeout_secs: 42, ..Config::default() };
        config.save().unwrap();
        assert!(dir.path().join("config.json").is_file());

        let back = Config::load().unwrap();
        assert_eq!(back.build_timeout_secs, 42);

        std::env::remove_var("STACKPROBE_DATA_DIR");
    }
}
