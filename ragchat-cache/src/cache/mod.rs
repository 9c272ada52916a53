//! # Query caches
//!
//! Bounded, TTL-expiring in-memory caches that sit between the chat
//! endpoint and the external embedding, search and language-model
//! providers.
//!
//! ## Features
//!
//! - **Key normalization**: trim + lowercase, shared by every layer
//! - **Lazy TTL expiry**: entries are checked and dropped when read
//! - **FIFO eviction**: the oldest-inserted entry goes first when the bound is exceeded
//! - **Diagnostics**: side-effect-free snapshots for status endpoints
//!
//! ## Layers
//!
//! | Layer | Value | TTL |
//! |-------|-------|-----|
//! | Embedding | `Vec<f32>` | 30 min |
//! | Search context | `String` | 15 min |
//! | Response | `String` | 60 min |
//!
//! ## Example
//!
//! ```rust
//! use ragchat_cache::cache::{CacheConfig, ResponseCache};
//! use std::time::Duration;
//!
//! let responses = ResponseCache::new(
//!     CacheConfig::builder()
//!         .ttl(Duration::from_secs(3600))
//!         .max_entries(100)
//!         .build(),
//! );
//!
//! responses.put_response("Hola", "¡Hola! ¿En qué te ayudo?");
//!
//! // keys are normalized, so casing and surrounding spaces do not matter
//! assert!(responses.get_response("  hola ").is_some());
//! ```

pub mod config;
pub mod entry;
pub mod key;
pub mod layers;
pub mod store;
pub mod types;

pub use config::{CacheConfig, CacheConfigBuilder, DEFAULT_MAX_ENTRIES};
pub use entry::CacheEntry;
pub use key::normalize_key;
pub use layers::{
    CacheLayers, CacheLayersConfig, CacheStatsReport, EmbeddingCache, ResponseCache,
    SearchContextCache,
};
pub use store::BoundedTtlCache;
pub use types::{CacheCounters, CacheKey, CacheLayer, CacheSnapshot, EntryPreview, EvictionReason};
