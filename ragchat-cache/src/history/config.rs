//! Configuration for the conversation history store

use crate::error::{CacheError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Messages kept per conversation
pub const DEFAULT_MAX_MESSAGES: usize = 20;

/// Idle time before a conversation expires
pub const DEFAULT_HISTORY_TTL: Duration = Duration::from_secs(30 * 60);

/// Interval between background sweeps
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Conversation history settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Sliding window size; older messages are dropped
    pub max_messages: usize,

    /// Idle time after which a conversation is discarded
    pub ttl: Duration,

    /// How often the sweeper removes idle conversations
    pub sweep_interval: Duration,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_messages: DEFAULT_MAX_MESSAGES,
            ttl: DEFAULT_HISTORY_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl HistoryConfig {
    pub fn max_messages(mut self, max: usize) -> Self {
        self.max_messages = max;
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_messages == 0 {
            return Err(CacheError::ZeroLimit {
                setting: "max_messages",
            });
        }
        if self.ttl.is_zero() {
            return Err(CacheError::ZeroLimit { setting: "ttl" });
        }
        if self.sweep_interval.is_zero() {
            return Err(CacheError::ZeroLimit {
                setting: "sweep_interval",
            });
        }
        Ok(())
    }
}
