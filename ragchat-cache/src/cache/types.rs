//! Core type definitions for the cache system

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cache key type: a normalized query string
pub type CacheKey = String;

/// Maximum number of characters of a key shown in diagnostics
pub const KEY_PREVIEW_CHARS: usize = 50;

/// Running counters for cache performance monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CacheCounters {
    /// Total number of cache hits
    pub hits: u64,

    /// Total number of cache misses (absent or expired)
    pub misses: u64,

    /// Entries dropped because the size bound was exceeded
    pub evictions_fifo: u64,

    /// Entries dropped because they were read after their TTL
    pub evictions_ttl: u64,
}

impl CacheCounters {
    /// Calculate cache hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }

    /// Calculate total evictions
    pub fn total_evictions(&self) -> u64 {
        self.evictions_fifo + self.evictions_ttl
    }
}

/// A single entry as shown in a diagnostic snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPreview {
    /// Leading characters of the key, with `...` appended when truncated
    pub key_preview: String,

    /// Whole seconds since the entry was stored
    pub age_seconds: u64,
}

/// Point-in-time view of a cache, in insertion order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    /// Number of entries currently stored (expired-but-unread entries included)
    pub size: usize,

    /// Configured entry bound
    pub max_size: usize,

    /// Configured time-to-live in seconds
    pub ttl_seconds: u64,

    #[serde(flatten)]
    pub counters: CacheCounters,

    /// Stored entries, oldest insertion first
    pub entries: Vec<EntryPreview>,
}

impl fmt::Display for CacheSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheSnapshot {{ size: {}/{}, hits: {}, misses: {}, hit_rate: {:.2}%, evictions: {} }}",
            self.size,
            self.max_size,
            self.counters.hits,
            self.counters.misses,
            self.counters.hit_rate(),
            self.counters.total_evictions()
        )
    }
}

/// Shorten a key for diagnostics without splitting a character
pub fn key_preview(key: &str) -> String {
    let mut chars = key.chars();
    let preview: String = chars.by_ref().take(KEY_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

/// Cache layer in the chat pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheLayer {
    /// Query embedding vectors
    Embedding,

    /// Retrieved context strings
    SearchContext,

    /// Complete assistant answers
    Response,
}

impl fmt::Display for CacheLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheLayer::Embedding => write!(f, "embedding"),
            CacheLayer::SearchContext => write!(f, "search_context"),
            CacheLayer::Response => write!(f, "response"),
        }
    }
}

/// Why an entry left a cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionReason {
    /// Read at or after its TTL
    Expired,

    /// Oldest insertion dropped to respect the size bound
    CapacityExceeded,

    /// Removed by an explicit clear
    Cleared,
}

impl fmt::Display for EvictionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvictionReason::Expired => write!(f, "expired"),
            EvictionReason::CapacityExceeded => write!(f, "capacity_exceeded"),
            EvictionReason::Cleared => write!(f, "cleared"),
        }
    }
}
