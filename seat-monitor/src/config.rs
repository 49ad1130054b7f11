//! Monitor configuration.
//!
//! Read from a JSON file; every key is optional and falls back to the
//! defaults below. Messaging credentials may also come from the
//! environment, which takes precedence over the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use tracing::warn;

use crate::alerts::{AlertCacheConfig, MAX_ALERT_TTL};
use crate::domain::{FareClass, ScheduleType, travel_date};
use crate::notify::TelegramConfig;
use crate::portal::{DEFAULT_BASE_URL, PortalConfig};

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
pub const ENV_CHANNEL_ID: &str = "TELEGRAM_CHANNEL_ID";

/// Errors loading the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Origin and destination terminal ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    pub terminal_id: u32,
    pub destination_id: u32,
}

impl Default for RouteConfig {
    fn default() -> Self {
        // Mombasa Terminus → Nairobi Terminus
        Self {
            terminal_id: 3,
            destination_id: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PortalSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AlertCacheSettings {
    pub max_entries: u64,
    pub ttl_secs: u64,
}

impl Default for AlertCacheSettings {
    fn default() -> Self {
        let defaults = AlertCacheConfig::default();
        Self {
            max_entries: defaults.max_entries,
            ttl_secs: defaults.ttl.as_secs(),
        }
    }
}

/// Credentials as written in the file. Chat ids may be numbers or strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TelegramSettings {
    pub bot_token: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub chat_id: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub channel_id: Option<String>,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}

/// Everything the monitor reads at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Travel dates, `DD/MM/YYYY`.
    #[serde(with = "travel_date::list")]
    pub dates: Vec<NaiveDate>,
    pub train_types: Vec<ScheduleType>,
    /// Classes of interest. Informational only; alerts cover every class.
    pub classes: Vec<FareClass>,
    /// Seconds between check cycles.
    pub check_interval: u64,
    pub route: RouteConfig,
    /// Departure times queried for express trains.
    pub departure_times: Vec<String>,
    /// The single time queried for inter-county trains.
    pub inter_county_departure_time: String,
    pub portal: PortalSettings,
    pub alert_cache: AlertCacheSettings,
    pub telegram: TelegramSettings,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            dates: Vec::new(),
            train_types: vec![ScheduleType::Express, ScheduleType::InterCounty],
            classes: vec![FareClass::First, FareClass::Economy],
            check_interval: 60,
            route: RouteConfig::default(),
            departure_times: vec!["3.00".to_string(), "10.00".to_string()],
            inter_county_departure_time: "08.00".to_string(),
            portal: PortalSettings::default(),
            alert_cache: AlertCacheSettings::default(),
            telegram: TelegramSettings::default(),
        }
    }
}

impl MonitorConfig {
    /// Load config from `path`.
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged. An unreadable or malformed file is.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the monitor cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.check_interval == 0 {
            return Err(ConfigError::Invalid(
                "check_interval must be at least 1 second".to_string(),
            ));
        }
        if self.portal.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "portal.timeout_secs must be at least 1 second".to_string(),
            ));
        }
        if self.alert_cache.max_entries == 0 {
            return Err(ConfigError::Invalid(
                "alert_cache.max_entries must be at least 1".to_string(),
            ));
        }
        if self.alert_cache.ttl_secs == 0 || self.alert_cache.ttl_secs > MAX_ALERT_TTL.as_secs() {
            return Err(ConfigError::Invalid(format!(
                "alert_cache.ttl_secs must be between 1 and {}",
                MAX_ALERT_TTL.as_secs()
            )));
        }
        if self.inter_county_departure_time.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "inter_county_departure_time must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval)
    }

    pub fn portal_config(&self) -> PortalConfig {
        PortalConfig::new()
            .with_base_url(&self.portal.base_url)
            .with_timeout(self.portal.timeout_secs)
    }

    pub fn alert_cache_config(&self) -> AlertCacheConfig {
        AlertCacheConfig {
            max_entries: self.alert_cache.max_entries,
            ttl: Duration::from_secs(self.alert_cache.ttl_secs),
        }
    }

    /// Messaging credentials, environment first, then the file.
    ///
    /// `env` looks up a variable by name; empty values count as unset.
    /// Returns `None` unless both a bot token and a chat id are available.
    pub fn telegram(&self, env: impl Fn(&str) -> Option<String>) -> Option<TelegramConfig> {
        let lookup = |name: &str, file: &Option<String>| {
            env(name)
                .or_else(|| file.clone())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let token = lookup(ENV_BOT_TOKEN, &self.telegram.bot_token)?;
        let chat_id = lookup(ENV_CHAT_ID, &self.telegram.chat_id)?;
        let mut config = TelegramConfig::new(token, chat_id);
        if let Some(channel) = lookup(ENV_CHANNEL_ID, &self.telegram.channel_id) {
            config = config.with_channel(channel);
        }
        Some(config)
    }
}

/// Environment lookup treating empty variables as unset.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
