//! Configuration Module
//!
//! Handles loading and managing server and cache configuration from
//! environment variables.

use std::env;
use std::str::FromStr;

use crate::cache::{
    PopularityMode, DEFAULT_POPULARITY_MULTIPLIER, DEFAULT_POPULARITY_THRESHOLD,
    DEFAULT_SIZE_LIMIT_BYTES, DEFAULT_TTL_CAP_SECS, MIB,
};

// == Cache Config ==
/// Response cache tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Log hit/miss/evict events at info level
    pub debug: bool,
    /// Resident size that triggers eviction, in bytes
    pub size_limit_bytes: u64,
    /// TTL multiplier for popular resources
    pub popularity_multiplier: f64,
    /// Count a key must exceed to be considered popular
    pub popularity_threshold: u64,
    /// Ceiling for an extended TTL, in seconds
    pub ttl_cap_secs: u64,
    /// Which lookups count toward popularity
    pub popularity_mode: PopularityMode,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            debug: false,
            size_limit_bytes: DEFAULT_SIZE_LIMIT_BYTES,
            popularity_multiplier: DEFAULT_POPULARITY_MULTIPLIER,
            popularity_threshold: DEFAULT_POPULARITY_THRESHOLD,
            ttl_cap_secs: DEFAULT_TTL_CAP_SECS,
            popularity_mode: PopularityMode::AllLookups,
        }
    }
}

impl CacheConfig {
    /// Loads cache settings from the environment.
    ///
    /// # Environment Variables
    /// - `CACHE_DEBUG` - Verbose lifecycle logging (default: false)
    /// - `CACHE_SIZE_LIMIT` - Eviction ceiling in MB (default: 100)
    /// - `POPULAR_RESOURCE_MULTIPLIER` - TTL multiplier (default: 2.0)
    /// - `CACHE_POPULARITY_THRESHOLD` - Popularity threshold (default: 10)
    /// - `CACHE_TTL_CAP` - Extended TTL ceiling in seconds (default: 3600)
    /// - `CACHE_POPULARITY_MODE` - `all` or `misses` (default: all)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let multiplier = env_or("POPULAR_RESOURCE_MULTIPLIER", defaults.popularity_multiplier);

        Self {
            debug: env::var("CACHE_DEBUG")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.debug),
            size_limit_bytes: env_or("CACHE_SIZE_LIMIT", DEFAULT_SIZE_LIMIT_BYTES / MIB)
                .saturating_mul(MIB),
            popularity_multiplier: if multiplier.is_finite() && multiplier > 0.0 {
                multiplier
            } else {
                defaults.popularity_multiplier
            },
            popularity_threshold: env_or("CACHE_POPULARITY_THRESHOLD", defaults.popularity_threshold),
            ttl_cap_secs: env_or("CACHE_TTL_CAP", defaults.ttl_cap_secs),
            popularity_mode: env_or("CACHE_POPULARITY_MODE", defaults.popularity_mode),
        }
    }
}

// == Server Config ==
/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Background expiry sweep interval in seconds
    pub cleanup_interval: u64,
    /// Base cache duration for the product listing, in seconds
    pub products_cache_duration: u64,
    /// Base cache duration for a single product, in seconds
    pub product_cache_duration: u64,
    /// Response cache tuning
    pub cache: CacheConfig,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Expiry sweep frequency in seconds (default: 1)
    /// - `PRODUCTS_CACHE_DURATION` - Listing cache base TTL (default: 300)
    /// - `CACHE_DURATION` - Single product cache base TTL (default: 60)
    /// - plus the cache variables read by [`CacheConfig::from_env`]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            products_cache_duration: env_or(
                "PRODUCTS_CACHE_DURATION",
                defaults.products_cache_duration,
            ),
            product_cache_duration: env_or("CACHE_DURATION", defaults.product_cache_duration),
            cache: CacheConfig::from_env(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cleanup_interval: 1,
            products_cache_duration: 300,
            product_cache_duration: 60,
            cache: CacheConfig::default(),
        }
    }
}

/// Parses `name` from the environment, falling back to `default` when unset
/// or malformed.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}
