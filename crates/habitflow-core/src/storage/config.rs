//! TOML-based application configuration.
//!
//! Stores:
//! - The fixed UTC offset that defines the canonical "today"
//! - Defaults applied to newly created habits
//! - Tracker policy (whether future days may be marked done)
//! - Log level and the default habit owner
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::day::CalendarDay;
use crate::error::ConfigError;
use crate::habit::{validate_color, validate_target_days, HabitCategory};

/// Largest accepted |utc_offset_minutes| (UTC-14:00 .. UTC+14:00).
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Calendar configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Offset applied to the UTC clock before taking the date.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

/// Defaults for new habits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitsConfig {
    #[serde(default = "default_target_days")]
    pub default_target_days: u32,
    #[serde(default = "default_color")]
    pub default_color: String,
    #[serde(default)]
    pub default_category: HabitCategory,
}

/// Tracker policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Allow marking days after the as-of day.
    #[serde(default)]
    pub allow_future_days: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Owner used when the caller does not name one.
    #[serde(default = "default_owner")]
    pub owner: String,
    /// Database file; defaults to `<data_dir>/habitflow.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub habits: HabitsConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_target_days() -> u32 {
    30
}
fn default_color() -> String {
    "#4F46E5".into()
}
fn default_log_level() -> String {
    "warn".into()
}
fn default_owner() -> String {
    "local".into()
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
        }
    }
}

impl Default for HabitsConfig {
    fn default() -> Self {
        Self {
            default_target_days: default_target_days(),
            default_color: default_color(),
            default_category: HabitCategory::Other,
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            allow_future_days: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            database_path: None,
            calendar: CalendarConfig::default(),
            habits: HabitsConfig::default(),
            tracker: TrackerConfig::default(),
            logging: LoggingConfig::default(),
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
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let unknown = || ConfigError::UnknownKey(key.to_string());

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let new_value = match obj.get(part) {
                    Some(serde_json::Value::Bool(_)) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    Some(serde_json::Value::Number(_)) => {
                        let n = value.parse::<i64>().map_err(|e| invalid(e.to_string()))?;
                        serde_json::Value::Number(n.into())
                    }
                    Some(serde_json::Value::Object(_)) | Some(serde_json::Value::Array(_)) => {
                        return Err(invalid("cannot set a whole section".into()));
                    }
                    Some(_) => serde_json::Value::String(value.into()),
                    // Optional top-level settings are omitted while unset.
                    None if key == "database_path" => serde_json::Value::String(value.into()),
                    None => return Err(unknown()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Path of the config file in the data directory.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults on first run.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be parsed or fails
    /// validation, or if the defaults cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
    ///
    /// # Errors
    /// See [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
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

    /// Persist to the data directory.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Check cross-field constraints that serde cannot express.
    ///
    /// # Errors
    /// Returns `InvalidValue` naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.calendar.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(ConfigError::InvalidValue {
                key: "calendar.utc_offset_minutes".into(),
                message: format!("must be within ±{MAX_OFFSET_MINUTES}"),
            });
        }
        validate_target_days(self.habits.default_target_days).map_err(|e| {
            ConfigError::InvalidValue {
                key: "habits.default_target_days".into(),
                message: e.to_string(),
            }
        })?;
        validate_color(&self.habits.default_color).map_err(|e| ConfigError::InvalidValue {
            key: "habits.default_color".into(),
            message: e.to_string(),
        })?;
        if self.owner.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "owner".into(),
                message: "must not be empty".into(),
            });
        }
        Ok(())
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

    /// Set a config value by dot-separated key. Does not persist.
    ///
    /// # Errors
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result fails validation. `self` is unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// The canonical current day under this configuration.
    pub fn today(&self) -> CalendarDay {
        CalendarDay::today(self.calendar.utc_offset_minutes)
    }

    /// Database file location.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("habitflow.db")),
        }
    }
}
