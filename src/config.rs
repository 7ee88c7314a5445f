//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::admission::DEFAULT_PREFIX;
use crate::cache::EvictionPolicy;

/// Which eviction discipline the stores use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Capacity bound plus per-entry TTL
    Ttl,
    /// Capacity bound only, LRU eviction
    Lru,
}

impl CachePolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ttl" => Some(CachePolicy::Ttl),
            "lru" => Some(CachePolicy::Lru),
            _ => None,
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries each cache store can hold
    pub max_entries: usize,
    /// Entry lifetime in seconds under the TTL policy. Should be at least
    /// the longest rate limit window, or denied callers reset early.
    pub default_ttl: u64,
    /// Eviction discipline for the stores
    pub cache_policy: CachePolicy,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Prefix for rate limit counter keys
    pub rate_limit_prefix: String,
    /// Directory for daily rolling log files; stdout only when unset
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 2000)
    /// - `DEFAULT_TTL` - Entry TTL in seconds (default: 3600)
    /// - `CACHE_POLICY` - `ttl` or `lru` (default: ttl)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    /// - `RATE_LIMIT_PREFIX` - Counter key prefix (default: rate-limiter)
    /// - `LOG_DIR` - Log file directory (default: unset)
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            max_entries: parsed(&lookup, "MAX_ENTRIES").unwrap_or(defaults.max_entries),
            default_ttl: parsed(&lookup, "DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            cache_policy: lookup("CACHE_POLICY")
                .and_then(|v| CachePolicy::parse(&v))
                .unwrap_or(defaults.cache_policy),
            server_port: parsed(&lookup, "SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: parsed(&lookup, "CLEANUP_INTERVAL")
                .unwrap_or(defaults.cleanup_interval),
            rate_limit_prefix: lookup("RATE_LIMIT_PREFIX")
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.rate_limit_prefix),
            log_dir: lookup("LOG_DIR")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }

    /// Eviction policy for the stores built from this config.
    pub fn eviction_policy(&self) -> EvictionPolicy {
        match self.cache_policy {
            CachePolicy::Ttl => EvictionPolicy::CapacityTtl {
                ttl: Duration::from_secs(self.default_ttl),
            },
            CachePolicy::Lru => EvictionPolicy::CapacityOnly,
        }
    }
}

fn parsed<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(name).and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 2000,
            default_ttl: 3600,
            cache_policy: CachePolicy::Ttl,
            server_port: 3000,
            cleanup_interval: 1,
            rate_limit_prefix: DEFAULT_PREFIX.to_string(),
            log_dir: None,
        }
    }
}
