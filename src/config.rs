//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

// == Eviction Strategy ==
/// Eviction policy identifier. Only LRU is implemented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EvictionStrategy {
    #[default]
    Lru,
}

impl FromStr for EvictionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lru" => Ok(EvictionStrategy::Lru),
            other => Err(format!("unsupported eviction strategy '{}'", other)),
        }
    }
}

impl fmt::Display for EvictionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvictionStrategy::Lru => write!(f, "lru"),
        }
    }
}

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_size: usize,
    /// TTL in milliseconds applied by callers when none is given, 0 = none
    pub default_ttl_ms: u64,
    /// Cleanup sweep interval in seconds, 0 disables the sweep
    pub check_period_secs: u64,
    /// Eviction policy
    pub strategy: EvictionStrategy,
    /// Whether to restore from and save to `snapshot_path` across restarts
    pub persistent: bool,
    /// Snapshot file used when `persistent` is set
    pub snapshot_path: PathBuf,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_SIZE` - Maximum cache entries (default: 1000)
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `CACHE_CHECK_PERIOD_SECS` - Cleanup frequency in seconds (default: 60)
    /// - `CACHE_STRATEGY` - Eviction strategy (default: lru)
    /// - `CACHE_PERSISTENT` - Snapshot across restarts (default: false)
    /// - `CACHE_SNAPSHOT_PATH` - Snapshot file (default: kb-cache-snapshot.json)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let strategy = match env::var("CACHE_STRATEGY") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("{}, falling back to {}", e, defaults.strategy);
                defaults.strategy
            }),
            Err(_) => defaults.strategy,
        };

        Self {
            max_size: parse_var("CACHE_MAX_SIZE")
                .unwrap_or(defaults.max_size)
                .max(1),
            default_ttl_ms: parse_var("CACHE_DEFAULT_TTL_MS").unwrap_or(defaults.default_ttl_ms),
            check_period_secs: parse_var("CACHE_CHECK_PERIOD_SECS")
                .unwrap_or(defaults.check_period_secs),
            strategy,
            persistent: env::var("CACHE_PERSISTENT")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.persistent),
            snapshot_path: env::var("CACHE_SNAPSHOT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.snapshot_path),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
        }
    }

    /// Cleanup sweep interval; zero when disabled.
    pub fn check_period(&self) -> Duration {
        Duration::from_secs(self.check_period_secs)
    }

    /// TTL a caller should apply when the request carries none.
    pub fn default_ttl(&self) -> Option<u64> {
        (self.default_ttl_ms > 0).then_some(self.default_ttl_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_size: 1000,
            default_ttl_ms: 300_000,
            check_period_secs: 60,
            strategy: EvictionStrategy::Lru,
            persistent: false,
            snapshot_path: PathBuf::from("kb-cache-snapshot.json"),
            server_port: 3000,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_size, 1000);
        assert_eq!(config.default_ttl_ms, 300_000);
        assert_eq!(config.check_period_secs, 60);
        assert_eq!(config.strategy, EvictionStrategy::Lru);
        assert!(!config.persistent);
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        for name in [
            "CACHE_MAX_SIZE",
            "CACHE_DEFAULT_TTL_MS",
            "CACHE_CHECK_PERIOD_SECS",
            "CACHE_STRATEGY",
            "CACHE_PERSISTENT",
            "CACHE_SNAPSHOT_PATH",
            "SERVER_PORT",
        ] {
            env::remove_var(name);
        }

        let config = Config::from_env();
        assert_eq!(config.max_size, 1000);
        assert_eq!(config.default_ttl(), Some(300_000));
        assert_eq!(config.check_period(), Duration::from_secs(60));
        assert_eq!(config.snapshot_path, PathBuf::from("kb-cache-snapshot.json"));
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("LRU".parse::<EvictionStrategy>(), Ok(EvictionStrategy::Lru));
        assert!("lfu".parse::<EvictionStrategy>().is_err());
        assert_eq!(EvictionStrategy::Lru.to_string(), "lru");
    }

    #[test]
    fn test_zero_default_ttl_means_none() {
        let config = Config {
            default_ttl_ms: 0,
            ..Config::default()
        };
        assert_eq!(config.default_ttl(), None);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
