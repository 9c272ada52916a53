//! The three cache layers of the chat pipeline
//!
//! Each layer is a [`BoundedTtlCache`] keyed by the normalized query text:
//! - embeddings, so repeated queries skip the embedding call
//! - retrieved context, so repeated queries skip embedding and search
//! - full responses, so repeated queries skip the language model entirely

use crate::cache::{
    config::CacheConfig,
    key::normalize_key,
    store::BoundedTtlCache,
    types::{CacheLayer, CacheSnapshot},
};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Query embedding cache
#[derive(Debug)]
pub struct EmbeddingCache {
    cache: BoundedTtlCache<Vec<f32>>,
}

impl EmbeddingCache {
    /// Create an embedding cache with the given configuration
    pub fn new(config: CacheConfig) -> Self {
        Self {
            cache: BoundedTtlCache::new("embedding", config),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::embedding())
    }

    pub fn get_embedding(&self, query: &str) -> Option<Vec<f32>> {
        self.cache.get(&normalize_key(query))
    }

    pub fn put_embedding(&self, query: &str, embedding: Vec<f32>) {
        self.cache.set(normalize_key(query), embedding);
    }

    pub fn stats(&self) -> CacheSnapshot {
        self.cache.stats()
    }

    /// Get the underlying cache
    pub fn inner(&self) -> &BoundedTtlCache<Vec<f32>> {
        &self.cache
    }
}

/// Retrieved-context cache
#[derive(Debug)]
pub struct SearchContextCache {
    cache: BoundedTtlCache<String>,
}

impl SearchContextCache {
    /// Create a search-context cache with the given configuration
    pub fn new(config: CacheConfig) -> Self {
        Self {
            cache: BoundedTtlCache::new("search_context", config),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::search_context())
    }

    pub fn get_context(&self, query: &str) -> Option<String> {
        self.cache.get(&normalize_key(query))
    }

    pub fn put_context(&self, query: &str, context: impl Into<String>) {
        self.cache.set(normalize_key(query), context.into());
    }

    pub fn stats(&self) -> CacheSnapshot {
        self.cache.stats()
    }

    /// Get the underlying cache
    pub fn inner(&self) -> &BoundedTtlCache<String> {
        &self.cache
    }
}

/// Full-response cache
#[derive(Debug)]
pub struct ResponseCache {
    cache: BoundedTtlCache<String>,
}

impl ResponseCache {
    /// Create a response cache with the given configuration
    pub fn new(config: CacheConfig) -> Self {
        Self {
            cache: BoundedTtlCache::new("response", config),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::response())
    }

    pub fn get_response(&self, query: &str) -> Option<String> {
        self.cache.get(&normalize_key(query))
    }

    pub fn put_response(&self, query: &str, response: impl Into<String>) {
        self.cache.set(normalize_key(query), response.into());
    }

    pub fn stats(&self) -> CacheSnapshot {
        self.cache.stats()
    }

    /// Get the underlying cache
    pub fn inner(&self) -> &BoundedTtlCache<String> {
        &self.cache
    }
}

/// Per-layer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheLayersConfig {
    pub embedding: CacheConfig,
    pub search_context: CacheConfig,
    pub response: CacheConfig,
}

impl Default for CacheLayersConfig {
    fn default() -> Self {
        Self {
            embedding: CacheConfig::embedding(),
            search_context: CacheConfig::search_context(),
            response: CacheConfig::response(),
        }
    }
}

impl CacheLayersConfig {
    /// Validate every layer
    pub fn validate(&self) -> Result<()> {
        self.embedding.validate()?;
        self.search_context.validate()?;
        self.response.validate()
    }

    /// Configuration of a single layer
    pub fn layer(&self, layer: CacheLayer) -> &CacheConfig {
        match layer {
            CacheLayer::Embedding => &self.embedding,
            CacheLayer::SearchContext => &self.search_context,
            CacheLayer::Response => &self.response,
        }
    }
}

/// Snapshot of all three layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatsReport {
    pub embedding: CacheSnapshot,
    pub search_context: CacheSnapshot,
    pub response: CacheSnapshot,
}

/// The three cache layers, constructed once and shared
#[derive(Debug, Clone)]
pub struct CacheLayers {
    pub embedding: Arc<EmbeddingCache>,
    pub search_context: Arc<SearchContextCache>,
    pub response: Arc<ResponseCache>,
}

impl CacheLayers {
    /// Build all layers from a validated configuration
    pub fn new(config: &CacheLayersConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            embedding: Arc::new(EmbeddingCache::new(config.embedding.clone())),
            search_context: Arc::new(SearchContextCache::new(config.search_context.clone())),
            response: Arc::new(ResponseCache::new(config.response.clone())),
        })
    }

    pub fn with_defaults() -> Self {
        Self {
            embedding: Arc::new(EmbeddingCache::with_defaults()),
            search_context: Arc::new(SearchContextCache::with_defaults()),
            response: Arc::new(ResponseCache::with_defaults()),
        }
    }

    /// Read-only snapshot for health and status endpoints
    pub fn stats(&self) -> CacheStatsReport {
        CacheStatsReport {
            embedding: self.embedding.stats(),
            search_context: self.search_context.stats(),
            response: self.response.stats(),
        }
    }
}
