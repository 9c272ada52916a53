//! Error types for cache and history configuration
//!
//! Lookups and insertions never fail: a missing, expired or evicted entry is
//! an ordinary miss. Errors only arise when a store is configured with
//! values it cannot honour.

use thiserror::Error;

/// Main error type for the cache crate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A numeric setting that must be positive was zero
    #[error("{setting} must be greater than 0")]
    ZeroLimit { setting: &'static str },
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

impl From<String> for CacheError {
    fn from(s: String) -> Self {
        CacheError::ConfigError(s)
    }
}

impl From<&str> for CacheError {
    fn from(s: &str) -> Self {
        CacheError::ConfigError(s.to_string())
    }
}
