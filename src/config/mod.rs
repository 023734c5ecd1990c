//! Engine configuration
//!
//! Every component of the engine is tuned from one [`EngineConfig`] value.
//! All fields carry serde defaults so partial configuration files work, and
//! durations accept human-readable strings ("10m", "500ms").

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod defaults;
pub mod duration_serde;

use crate::retry::RetryPolicy;
use crate::variants::rules::{default_provider_rules, ProviderRule};
use defaults::*;

/// Top-level configuration for the media engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Bounded media cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Loaded-resource registry settings
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Priority load scheduler settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Retry/backoff policy applied per load attempt
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Provider URL rewrite rules, first host match wins
    ///
    /// These encode provider-specific CDN contracts and are treated as
    /// configuration data rather than logic; replacing the table wholesale is
    /// the supported way to adjust provider behavior.
    #[serde(default = "default_provider_rules")]
    pub providers: Vec<ProviderRule>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            registry: RegistryConfig::default(),
            scheduler: SchedulerConfig::default(),
            retry: RetryPolicy::default(),
            providers: default_provider_rules(),
        }
    }
}

/// Bounded cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of resolved handles held at once
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Age beyond which an entry is treated as absent
    #[serde(with = "duration_serde::duration", default = "default_cache_ttl")]
    pub ttl: Duration,

    /// Interval between background expiry sweeps
    #[serde(
        with = "duration_serde::duration",
        default = "default_cleanup_interval"
    )]
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl: default_cache_ttl(),
            cleanup_interval: default_cleanup_interval(),
        }
    }
}

/// Loaded-resource registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Maximum number of known-rendered keys tracked
    #[serde(default = "default_registry_capacity")]
    pub capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            capacity: default_registry_capacity(),
        }
    }
}

/// Priority load scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum number of loads dispatched concurrently
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

fn default_cache_ttl() -> Duration {
    Duration::from_secs(DEFAULT_CACHE_TTL_SECS)
}

fn default_cleanup_interval() -> Duration {
    Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS)
}

fn default_registry_capacity() -> usize {
    DEFAULT_REGISTRY_CAPACITY
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = EngineConfig::default();
        assert_eq!(config.cache.capacity, 500);
        assert_eq!(config.cache.ttl, Duration::from_secs(600));
        assert_eq!(config.cache.cleanup_interval, Duration::from_secs(120));
        assert_eq!(config.registry.capacity, 2000);
        assert_eq!(config.scheduler.concurrency, 4);
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.base_delay, Duration::from_millis(500));
        assert!(!config.providers.is_empty());
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"cache":{"capacity":64,"ttl":"1m"}}"#).unwrap();
        assert_eq!(config.cache.capacity, 64);
        assert_eq!(config.cache.ttl, Duration::from_secs(60));
        // Untouched sections keep their defaults
        assert_eq!(config.scheduler.concurrency, 4);
        assert_eq!(config.registry.capacity, 2000);
    }
}
