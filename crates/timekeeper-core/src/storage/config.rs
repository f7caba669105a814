//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - The game process to watch
//! - Where the reward ledger lives
//! - Notification preferences
//! - Prefilled values for the start command
//!
//! Configuration is stored at `~/.config/timekeeper/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::ledger::LedgerPaths;
use crate::monitor::MonitorSettings;

/// Reward ledger file locations. Relative names resolve against the data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default = "default_total_file")]
    pub total_file: String,
}

/// Notification configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// When false, alerts only go to the log.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Ring the terminal bell with each alert.
    #[serde(default = "default_true")]
    pub bell: bool,
}

/// Values used when the start command is given no mode arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub hours: u64,
    #[serde(default = "default_minutes")]
    pub minutes: u64,
    #[serde(default)]
    pub seconds: u64,
    #[serde(default = "default_until")]
    pub until: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/timekeeper/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Executable name of the game, e.g. `Terraria.exe`.
    #[serde(default = "default_process_name")]
    pub process_name: String,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

// Default functions
fn default_process_name() -> String {
    "Terraria.exe".into()
}
fn default_log_file() -> String {
    "rewards_log.csv".into()
}
fn default_total_file() -> String {
    "rewards_total.json".into()
}
fn default_true() -> bool {
    true
}
fn default_minutes() -> u64 {
    30
}
fn default_until() -> String {
    "22:30".into()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            total_file: default_total_file(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bell: true,
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            hours: 0,
            minutes: default_minutes(),
            seconds: 0,
            until: default_until(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            process_name: default_process_name(),
            ledger: LedgerConfig::default(),
            notifications: NotificationsConfig::default(),
            defaults: DefaultsConfig::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|e| invalid(format!("cannot parse '{value}' as bool: {e}")))?,
                ),
                serde_json::Value::Number(_) => {
                    let n = value
                        .parse::<u64>()
                        .map_err(|e| invalid(format!("cannot parse '{value}' as number: {e}")))?;
                    serde_json::Value::Number(n.into())
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    return Err(invalid("cannot set a whole section; set its fields".into()));
                }
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing and returning defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Same as [`Config::load`] for an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Same as [`Config::save`] for an explicit file.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key in memory. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value has the wrong type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }

    /// Monitor settings for the configured process.
    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            process_name: self.process_name.clone(),
            ..MonitorSettings::default()
        }
    }

    /// Ledger file locations, relative names joined onto `dir`.
    pub fn ledger_paths(&self, dir: &Path) -> LedgerPaths {
        LedgerPaths {
            log: dir.join(&self.ledger.log_file),
            total: dir.join(&self.ledger.total_file),
        }
    }
}
