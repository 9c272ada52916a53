//! Configuration for the bounded TTL caches

use crate::error::{CacheError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default maximum number of entries shared by all cache layers
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Configuration for a single bounded TTL cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live measured from insertion
    pub ttl: Duration,

    /// Maximum number of entries; the oldest-inserted entry is evicted on overflow
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30 * 60),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl CacheConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(CacheError::ZeroLimit {
                setting: "max_entries",
            });
        }

        if self.ttl.is_zero() {
            return Err(CacheError::ZeroLimit { setting: "ttl" });
        }

        Ok(())
    }
}

/// Builder for cache configuration
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    ttl: Option<Duration>,
    max_entries: Option<usize>,
}

impl CacheConfigBuilder {
    /// Set the time-to-live for entries
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Set maximum number of cache entries
    pub fn max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max);
        self
    }

    /// Build the cache configuration
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();

        CacheConfig {
            ttl: self.ttl.unwrap_or(defaults.ttl),
            max_entries: self.max_entries.unwrap_or(defaults.max_entries),
        }
    }
}

/// Preset configurations for the three cache layers
impl CacheConfig {
    /// Query embeddings: 30 minutes
    pub fn embedding() -> Self {
        Self {
            ttl: Duration::from_secs(30 * 60),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }

    /// Retrieved context: 15 minutes, indexed documents change faster than query phrasing
    pub fn search_context() -> Self {
        Self {
            ttl: Duration::from_secs(15 * 60),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }

    /// Full answers: 60 minutes
    pub fn response() -> Self {
        Self {
            ttl: Duration::from_secs(60 * 60),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(1800));
        assert_eq!(config.max_entries, 100);
    }

    #[test]
    fn test_config_validation() {
        tokio_test::assert_ok!(CacheConfig::default().validate());

        let mut invalid_config = CacheConfig::default();
        invalid_config.max_entries = 0;
        tokio_test::assert_err!(invalid_config.validate());

        let invalid_config = CacheConfig::builder().ttl(Duration::ZERO).build();
        assert_eq!(
            invalid_config.validate(),
            Err(CacheError::ZeroLimit { setting: "ttl" })
        );
    }

    #[test]
    fn test_config_builder() {
        let config = CacheConfig::builder()
            .ttl(Duration::from_secs(600))
            .max_entries(5)
            .build();

        assert_eq!(config.ttl, Duration::from_secs(600));
        assert_eq!(config.max_entries, 5);
    }

    #[test]
    fn test_preset_configs() {
        assert_eq!(CacheConfig::embedding().ttl, Duration::from_secs(30 * 60));
        assert_eq!(CacheConfig::search_context().ttl, Duration::from_secs(15 * 60));
        assert_eq!(CacheConfig::response().ttl, Duration::from_secs(60 * 60));

        for preset in [
            CacheConfig::embedding(),
            CacheConfig::search_context(),
            CacheConfig::response(),
        ] {
            assert_eq!(preset.max_entries, DEFAULT_MAX_ENTRIES);
        }
    }
}
