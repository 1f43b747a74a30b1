//! Configuration loading and management.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Library configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub calendar: CalendarConfig,
}

/// Row-store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".lifemap/lifemap.db")
}

/// Calendar mirroring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// When false, reconciliation makes no calendar calls and leaves
    /// stored event identifiers untouched.
    #[serde(default = "default_calendar_enabled")]
    pub enabled: bool,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            enabled: default_calendar_enabled(),
        }
    }
}

fn default_calendar_enabled() -> bool {
    true
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from the default location or return defaults.
    pub fn load_or_default() -> Self {
        if let Ok(config) = Self::load(".lifemap/config.yaml") {
            return config;
        }

        let mut config = Self::default();

        if let Ok(db_path) = std::env::var("LIFEMAP_DB_PATH") {
            config.store.db_path = PathBuf::from(db_path);
        }

        if let Ok(enabled) = std::env::var("LIFEMAP_CALENDAR_ENABLED") {
            if let Ok(enabled) = enabled.parse() {
                config.calendar.enabled = enabled;
            }
        }

        config
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.store.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_calendar() {
        let config = Config::default();
        assert!(config.calendar.enabled);
        assert_eq!(config.store.db_path, PathBuf::from(".lifemap/lifemap.db"));
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let config: Config = serde_yaml::from_str("calendar:\n  enabled: false\n").unwrap();
        assert!(!config.calendar.enabled);
        assert_eq!(config.store.db_path, PathBuf::from(".lifemap/lifemap.db"));
    }

    #[test]
    fn yaml_overrides_db_path() {
        let config: Config =
            serde_yaml::from_str("store:\n  db_path: /tmp/custom.db\n").unwrap();
        assert_eq!(config.store.db_path, PathBuf::from("/tmp/custom.db"));
    }
}
