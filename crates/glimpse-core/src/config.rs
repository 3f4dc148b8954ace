//! TOML-based viewer configuration.
//!
//! Tunables for the polling cadence and the sizes of the engine's bounded
//! session-scoped structures. Stored at `~/.config/glimpse/config.toml`;
//! every field has a default so a missing or partial file is fine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Viewer engine configuration.
///
/// Serialized to/from TOML at `~/.config/glimpse/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Countdown poll interval in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// High-water mark of the consumed view-once registry.
    #[serde(default = "default_consumed_capacity")]
    pub consumed_capacity: usize,
    /// Bound on queued store-write retries.
    #[serde(default = "default_write_retry_capacity")]
    pub write_retry_capacity: usize,
}

fn default_tick_interval_ms() -> u64 {
    100
}
fn default_consumed_capacity() -> usize {
    512
}
fn default_write_retry_capacity() -> usize {
    32
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            consumed_capacity: default_consumed_capacity(),
            write_retry_capacity: default_write_retry_capacity(),
        }
    }
}

impl ViewerConfig {
    /// Poll interval as a [`std::time::Duration`].
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms)
    }

    /// Default config location (`~/.config/glimpse/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("glimpse").join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config: Self =
            toml::from_str(&raw).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the default path; a missing file yields the defaults.
    pub fn load_or_default() -> Self {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path).unwrap_or_default(),
            _ => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let raw = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::SaveFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        }
        std::fs::write(path, raw).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "tick_interval_ms".into(),
                message: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: ViewerConfig = toml::from_str("tick_interval_ms = 250").unwrap();
        assert_eq!(config.tick_interval_ms, 250);
        assert_eq!(config.consumed_capacity, 512);
        assert_eq!(config.write_retry_capacity, 32);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = ViewerConfig {
            tick_interval_ms: 50,
            consumed_capacity: 8,
            write_retry_capacity: 4,
        };
        config.save(&path).unwrap();
        let loaded = ViewerConfig::load(&path).unwrap();
        assert_eq!(loaded.tick_interval_ms, 50);
        assert_eq!(loaded.consumed_capacity, 8);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "tick_interval_ms = 0").unwrap();
        assert!(matches!(
            ViewerConfig::load(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
