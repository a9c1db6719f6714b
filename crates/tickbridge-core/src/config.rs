//! TOML-based bridge configuration.
//!
//! Stores:
//! - Poll interval in seconds (clamped to [60, 3600])
//! - Due-soon lookahead in minutes
//! - Whether completed tasks appear in listings and summaries
//!
//! Configuration is stored at `~/.config/tickbridge/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;
pub const MIN_POLL_INTERVAL_SECS: u64 = 60;
pub const MAX_POLL_INTERVAL_SECS: u64 = 3600;
pub const DEFAULT_DUE_SOON_MINUTES: i64 = 30;

/// Bridge configuration.
///
/// Serialized to/from TOML at `~/.config/tickbridge/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Seconds between poll cycles.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Lookahead window for due-soon warnings, in minutes.
    #[serde(default = "default_due_soon_minutes")]
    pub due_soon_minutes: i64,
    /// Show completed tasks in listings and summaries.
    #[serde(default)]
    pub include_completed: bool,
}

// Default functions
fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}
fn default_due_soon_minutes() -> i64 {
    DEFAULT_DUE_SOON_MINUTES
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            due_soon_minutes: default_due_soon_minutes(),
            include_completed: false,
        }
    }
}

impl BridgeConfig {
    /// Path of the configuration file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(base.join("tickbridge").join("config.toml"))
    }

    /// Load configuration from the default path. A missing file yields
    /// the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config: Self = toml::from_str(&raw).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(config.normalized())
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path, creating parent
    /// directories as needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::SaveFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        }
        let raw = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, raw).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Clamp out-of-range values into their supported bounds.
    pub fn normalized(mut self) -> Self {
        self.poll_interval_secs = self
            .poll_interval_secs
            .clamp(MIN_POLL_INTERVAL_SECS, MAX_POLL_INTERVAL_SECS);
        self.due_soon_minutes = self.due_soon_minutes.max(0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = BridgeConfig::default();
        assert_eq!(config.poll_interval_secs, 300);
        assert_eq!(config.due_soon_minutes, 30);
        assert!(!config.include_completed);
    }

    #[test]
    fn normalized_clamps_interval() {
        let config = BridgeConfig {
            poll_interval_secs: 5,
            ..Default::default()
        }
        .normalized();
        assert_eq!(config.poll_interval_secs, 60);

        let config = BridgeConfig {
            poll_interval_secs: 90_000,
            ..Default::default()
        }
        .normalized();
        assert_eq!(config.poll_interval_secs, 3600);

        let config = BridgeConfig {
            poll_interval_secs: 600,
            ..Default::default()
        }
        .normalized();
        assert_eq!(config.poll_interval_secs, 600);
    }

    #[test]
    fn normalized_rejects_negative_lookahead() {
        let config = BridgeConfig {
            due_soon_minutes: -15,
            ..Default::default()
        }
        .normalized();
        assert_eq!(config.due_soon_minutes, 0);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = BridgeConfig {
            poll_interval_secs: 120,
            due_soon_minutes: 45,
            include_completed: true,
        };
        config.save_to(&path).unwrap();

        let loaded = BridgeConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = BridgeConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, BridgeConfig::default());
    }

    #[test]
    fn load_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "due_soon_minutes = 10\n").unwrap();

        let loaded = BridgeConfig::load_from(&path).unwrap();
        assert_eq!(loaded.due_soon_minutes, 10);
        assert_eq!(loaded.poll_interval_secs, DEFAULT_POLL_INTERVAL_SECS);
    }

    #[test]
    fn load_clamps_out_of_range_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "poll_interval_secs = 10\n").unwrap();

        let loaded = BridgeConfig::load_from(&path).unwrap();
        assert_eq!(loaded.poll_interval_secs, MIN_POLL_INTERVAL_SECS);
    }
}
