//! # ragchat-cache
//!
//! In-memory caching and conversation state for a retrieval-augmented chat
//! backend.
//!
//! ## Features
//!
//! - Canonical query keys (trim + lowercase) shared by every cache
//! - Bounded TTL caches with lazy expiry and FIFO eviction
//! - Embedding, search-context and response cache layers
//! - Per-user conversation history with a sliding window, idle expiry and a
//!   cancellable background sweep
//!
//! Nothing here performs I/O and nothing suspends: every operation is a
//! short critical section over an in-process map, safe to call from any
//! task.
//!
//! ## Cache layers
//!
//! ```rust
//! use ragchat_cache::{CacheLayers, CacheLayersConfig};
//!
//! let layers = CacheLayers::new(&CacheLayersConfig::default()).unwrap();
//!
//! layers.embedding.put_embedding("Hola", vec![0.12, -0.4, 0.9]);
//! assert!(layers.embedding.get_embedding(" hola").is_some());
//!
//! let report = layers.stats();
//! assert_eq!(report.embedding.size, 1);
//! ```
//!
//! ## Conversation history
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ragchat_cache::{ConversationHistoryStore, HistoryConfig, HistorySweeper, Role};
//!
//! #[tokio::main]
//! async fn main() {
//!     let history = Arc::new(ConversationHistoryStore::new(HistoryConfig::default()));
//!     let sweeper = HistorySweeper::start(&history);
//!
//!     history.add_message("ana", Role::User, "hola");
//!     println!("{:?}", history.stats());
//!
//!     sweeper.shutdown().await;
//! }
//! ```

pub mod cache;
pub mod error;
pub mod history;

// Re-export main types for convenience
pub use cache::{
    normalize_key, BoundedTtlCache, CacheConfig, CacheConfigBuilder, CacheCounters, CacheEntry,
    CacheKey, CacheLayer, CacheLayers, CacheLayersConfig, CacheSnapshot, CacheStatsReport,
    EmbeddingCache, EntryPreview, EvictionReason, ResponseCache, SearchContextCache,
};
pub use error::{CacheError, Result};
pub use history::{
    ChatMessage, ConversationHistoryStore, HistoryConfig, HistoryStats, HistorySweeper, Message,
    Role,
};
