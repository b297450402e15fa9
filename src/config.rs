//! Configuration and settings management
//!
//! Loads settings from environment variables and defines cache / polling
//! tuning constants.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub bot_token: String,

    /// Telegram channel ID that receives deal announcements
    pub channel_id: i64,

    /// Steam Web API key; user profile lookups are disabled without it
    pub steam_api_key: Option<String>,
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use steam_deals_bot::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or a required value is
    /// missing.
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            // Optional checked-in defaults
            .add_source(File::with_name("config/default").required(false))
            // Local overrides, not checked into git
            .add_source(File::with_name("config/local").required(false))
            // Environment variables win; UPPER_SNAKE_CASE maps to snake_case
            // and empty values count as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        s.try_deserialize()
    }
}

// Deal ingestion
/// Interval between CheapShark polls; the source changes at most hourly
pub const DEALS_POLL_INTERVAL_SECS: u64 = 3600;
/// Pause between consecutive channel announcements to avoid burst-sending
pub const DEAL_SEND_THROTTLE_SECS: u64 = 2;
/// Maximum entries retained in the seen-deals tracker
pub const SEEN_DEALS_MAX_SIZE: usize = 200;
/// Fraction of oldest seen-deals entries dropped per cleanup pass
pub const SEEN_DEALS_CLEANUP_FRACTION: f64 = 0.5;

// App details cache
/// TTL for cached Steam app details
pub const DETAILS_CACHE_TTL_SECS: u64 = 15 * 60;
/// Maximum entries in the app details cache
pub const DETAILS_CACHE_MAX_SIZE: usize = 200;
/// Entries evicted per batch when the details cache is full
pub const DETAILS_CACHE_EVICTION_BATCH: usize = 50;

// Interactive lookups
/// Simultaneous in-flight detail fetches while enriching search results
pub const SEARCH_FANOUT_CONCURRENCY: usize = 3;
/// Inline search results served per query
pub const MAX_SEARCH_RESULTS: usize = 5;
/// Description length limit in summary messages
pub const DESCRIPTION_LIMIT: usize = 500;

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_settings_from_env() -> Result<(), Box<dyn std::error::Error>> {
        env::set_var("BOT_TOKEN", "dummy-token");
        env::set_var("CHANNEL_ID", "-1001234567890");

        let settings = Settings::new()?;
        assert_eq!(settings.bot_token, "dummy-token");
        assert_eq!(settings.channel_id, -1_001_234_567_890);
        assert_eq!(settings.steam_api_key, None);

        env::remove_var("BOT_TOKEN");
        env::remove_var("CHANNEL_ID");
        Ok(())
    }

    #[test]
    fn test_cleanup_fraction_is_a_fraction() {
        assert!(SEEN_DEALS_CLEANUP_FRACTION > 0.0 && SEEN_DEALS_CLEANUP_FRACTION < 1.0);
        assert!(DETAILS_CACHE_EVICTION_BATCH <= DETAILS_CACHE_MAX_SIZE);
    }
}
