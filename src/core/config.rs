//! Environment-driven configuration
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Configurable alarm time zone and alert symbols
//! - 1.0.0: Initial release with Telegram and alerts API settings

use anyhow::{anyhow, Result};
use chrono_tz::Tz;

pub const DEFAULT_ALERTS_URL: &str = "https://api.alerts.in.ua/v1";
pub const DEFAULT_LOCATION_ID: &str = "31";
pub const DEFAULT_ACTIVE_SYMBOLS: &str = "A,P";
pub const DEFAULT_DATABASE_PATH: &str = "./data/data.db";
pub const DEFAULT_TIMEZONE: &str = "Europe/Kyiv";

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_token: String,
    pub alerts_token: String,
    pub alerts_url: String,
    pub alerts_location_id: String,
    /// Status symbols the alerts API uses for an active alert
    pub alerts_active_symbols: Vec<String>,
    pub database_path: String,
    pub timezone: Tz,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("{key} is missing"))
        };
        let optional = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let timezone_name = optional("ALARM_TIMEZONE", DEFAULT_TIMEZONE);
        let timezone: Tz = timezone_name
            .parse()
            .map_err(|e| anyhow!("Invalid ALARM_TIMEZONE '{timezone_name}': {e}"))?;

        let alerts_active_symbols = parse_symbols(&optional("ALERTS_ACTIVE_SYMBOLS", DEFAULT_ACTIVE_SYMBOLS));
        if alerts_active_symbols.is_empty() {
            return Err(anyhow!("ALERTS_ACTIVE_SYMBOLS must name at least one symbol"));
        }

        Ok(Config {
            telegram_token: required("TG_TOKEN")?,
            alerts_token: required("ALERTS_TOKEN")?,
            alerts_url: optional("ALERTS_URL", DEFAULT_ALERTS_URL)
                .trim_end_matches('/')
                .to_string(),
            alerts_location_id: optional("ALERTS_LOCATION_ID", DEFAULT_LOCATION_ID),
            alerts_active_symbols,
            database_path: optional("DATABASE_PATH", DEFAULT_DATABASE_PATH),
            timezone,
            log_level: optional("LOG_LEVEL", "info"),
        })
    }
}

fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
