//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{
    CacheConfig, AVAILABILITY_MAX_SIZE, AVAILABILITY_TTL, FORM_STATE_MAX_SIZE, FORM_STATE_TTL,
    PRICING_MAX_SIZE, PRICING_TTL,
};
use crate::manager::{ManagerConfig, DEFAULT_CLEANUP_INTERVAL};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// Durations are given in seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Background sweep interval in seconds
    pub cleanup_interval: u64,
    pub pricing_ttl: u64,
    pub pricing_max_size: usize,
    pub availability_ttl: u64,
    pub availability_max_size: usize,
    pub form_state_ttl: u64,
    pub form_state_max_size: usize,
    /// Initial generation for every cache
    pub cache_version: u64,
    /// Quiet period before a stats snapshot is logged after writes, in milliseconds
    pub stats_debounce_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 300)
    /// - `PRICING_TTL` / `PRICING_MAX_SIZE` (default: 900 / 500)
    /// - `AVAILABILITY_TTL` / `AVAILABILITY_MAX_SIZE` (default: 300 / 200)
    /// - `FORM_STATE_TTL` / `FORM_STATE_MAX_SIZE` (default: 1800 / 50)
    /// - `CACHE_VERSION` - Initial cache generation (default: 1)
    /// - `STATS_DEBOUNCE_MS` - Stats log debounce in milliseconds (default: 500)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            pricing_ttl: env_or("PRICING_TTL", defaults.pricing_ttl),
            pricing_max_size: env_or("PRICING_MAX_SIZE", defaults.pricing_max_size),
            availability_ttl: env_or("AVAILABILITY_TTL", defaults.availability_ttl),
            availability_max_size: env_or("AVAILABILITY_MAX_SIZE", defaults.availability_max_size),
            form_state_ttl: env_or("FORM_STATE_TTL", defaults.form_state_ttl),
            form_state_max_size: env_or("FORM_STATE_MAX_SIZE", defaults.form_state_max_size),
            cache_version: env_or("CACHE_VERSION", defaults.cache_version),
            stats_debounce_ms: env_or("STATS_DEBOUNCE_MS", defaults.stats_debounce_ms),
        }
    }

    /// Cache layout derived from this configuration.
    pub fn manager_config(&self) -> ManagerConfig {
        let cache = |ttl: u64, max_size: usize| {
            CacheConfig::new(Duration::from_secs(ttl), max_size).with_version(self.cache_version)
        };
        ManagerConfig {
            pricing: cache(self.pricing_ttl, self.pricing_max_size),
            availability: cache(self.availability_ttl, self.availability_max_size),
            form_state: cache(self.form_state_ttl, self.form_state_max_size),
            cleanup_interval: Duration::from_secs(self.cleanup_interval),
        }
    }

    pub fn stats_debounce(&self) -> Duration {
        Duration::from_millis(self.stats_debounce_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL.as_secs(),
            pricing_ttl: PRICING_TTL.as_secs(),
            pricing_max_size: PRICING_MAX_SIZE,
            availability_ttl: AVAILABILITY_TTL.as_secs(),
            availability_max_size: AVAILABILITY_MAX_SIZE,
            form_state_ttl: FORM_STATE_TTL.as_secs(),
            form_state_max_size: FORM_STATE_MAX_SIZE,
            cache_version: 1,
            stats_debounce_ms: 500,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 300);
        assert_eq!(config.pricing_ttl, 900);
        assert_eq!(config.pricing_max_size, 500);
        assert_eq!(config.availability_ttl, 300);
        assert_eq!(config.form_state_max_size, 50);
    }

    #[test]
    fn test_default_manager_config_matches_cache_defaults() {
        assert_eq!(Config::default().manager_config(), ManagerConfig::default());
    }

    #[test]
    fn test_cache_version_is_applied_to_every_cache() {
        let config = Config {
            cache_version: 7,
            ..Default::default()
        };
        let manager = config.manager_config();

        assert_eq!(manager.pricing.version, 7);
        assert_eq!(manager.availability.version, 7);
        assert_eq!(manager.form_state.version, 7);
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        env::set_var("TRANSPORT_CACHE_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_or("TRANSPORT_CACHE_TEST_GARBAGE", 42u64), 42);
        env::remove_var("TRANSPORT_CACHE_TEST_GARBAGE");
    }
}
