//! Retrieval of context for a user query
//!
//! Checks the search-context cache, then the embedding cache, and only
//! then reaches the embedding model and the search index. Provider failures
//! never fail the chat turn: they turn into a descriptive context string so
//! the model can still answer without the knowledge base.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::ChatError;
use crate::providers::{with_timeout, EmbeddingProvider, ProviderResult, SearchProvider};
use ragchat_cache::{EmbeddingCache, SearchContextCache};

/// Context returned when the index holds no documents; never cached
pub const EMPTY_INDEX_CONTEXT: &str =
    "No hay documentos en el índice de búsqueda. Respondiendo sin contexto adicional.";

/// Context returned when the vector search found nothing usable
pub const NO_RELEVANT_CONTEXT: &str = "No se encontró información relevante.";

/// Prefix of the context returned when a provider failed
pub const RETRIEVAL_ERROR_PREFIX: &str = "Error al recuperar información relevante: ";

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_VECTOR_FIELD: &str = "content_vector";
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Vector query parameters and provider time bound
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Nearest neighbours requested from the index
    pub top_k: usize,
    /// Index field holding document vectors
    pub vector_field: String,
    /// Upper bound for each provider call
    pub provider_timeout: Duration,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            vector_field: DEFAULT_VECTOR_FIELD.to_string(),
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }
}

enum Retrieved {
    EmptyIndex,
    Context(String),
}

/// Builds the context string for a query
pub struct RetrievalOrchestrator {
    embeddings: Arc<dyn EmbeddingProvider>,
    search: Arc<dyn SearchProvider>,
    embedding_cache: Arc<EmbeddingCache>,
    context_cache: Arc<SearchContextCache>,
    config: RetrievalConfig,
}

impl RetrievalOrchestrator {
    pub fn new(
        embeddings: Arc<dyn EmbeddingProvider>,
        search: Arc<dyn SearchProvider>,
        embedding_cache: Arc<EmbeddingCache>,
        context_cache: Arc<SearchContextCache>,
        config: RetrievalConfig,
    ) -> Self {
        info!(
            embeddings = embeddings.name(),
            search = search.name(),
            k = config.top_k,
            field = %config.vector_field,
            "Retrieval orchestrator ready"
        );

        Self {
            embeddings,
            search,
            embedding_cache,
            context_cache,
            config,
        }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Context for `query`
    ///
    /// Only an empty query is an error. Provider failures and timeouts come
    /// back as a string starting with [`RETRIEVAL_ERROR_PREFIX`].
    pub async fn retrieve(&self, query: &str) -> Result<String, ChatError> {
        if query.trim().is_empty() {
            return Err(ChatError::InvalidInput("query must not be empty".into()));
        }

        if let Some(context) = self.context_cache.get_context(query) {
            debug!("Search context served from cache");
            return Ok(context);
        }

        match self.fetch(query).await {
            Ok(Retrieved::EmptyIndex) => {
                warn!("Search index is empty, answering without context");
                Ok(EMPTY_INDEX_CONTEXT.to_string())
            }
            Ok(Retrieved::Context(context)) => {
                self.context_cache.put_context(query, context.as_str());
                Ok(context)
            }
            Err(e) => {
                error!("Failed to retrieve context: {}", e);
                Ok(format!("{}{}", RETRIEVAL_ERROR_PREFIX, e))
            }
        }
    }

    async fn fetch(&self, query: &str) -> ProviderResult<Retrieved> {
        let started = Instant::now();
        let embedding = self.embedding_for(query).await?;
        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Embedding ready");

        let limit = self.config.provider_timeout;

        // presence probe: an empty index makes the vector query pointless
        let probe = with_timeout(limit, "text search", self.search.search_text(query)).await?;
        if probe.is_empty() {
            return Ok(Retrieved::EmptyIndex);
        }

        let documents = with_timeout(
            limit,
            "vector search",
            self.search
                .search_vector(&embedding, self.config.top_k, &self.config.vector_field),
        )
        .await?;
        debug!(documents = documents.len(), "Vector search returned");

        let context = documents
            .iter()
            .map(|doc| doc.content.trim())
            .filter(|content| !content.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if context.is_empty() {
            return Ok(Retrieved::Context(NO_RELEVANT_CONTEXT.to_string()));
        }
        Ok(Retrieved::Context(context))
    }

    async fn embedding_for(&self, query: &str) -> ProviderResult<Vec<f32>> {
        if let Some(embedding) = self.embedding_cache.get_embedding(query) {
            debug!("Embedding served from cache");
            return Ok(embedding);
        }

        let embedding = with_timeout(
            self.config.provider_timeout,
            "embedding",
            self.embeddings.embed(query),
        )
        .await?;
        self.embedding_cache.put_embedding(query, embedding.clone());
        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::{MockEmbeddingProvider, MockSearchProvider};
    use ragchat_cache::CacheLayers;

    struct Fixture {
        embeddings: Arc<MockEmbeddingProvider>,
        search: Arc<MockSearchProvider>,
        caches: CacheLayers,
        retrieval: RetrievalOrchestrator,
    }

    fn fixture(embeddings: MockEmbeddingProvider, search: MockSearchProvider) -> Fixture {
        let embeddings = Arc::new(embeddings);
        let search = Arc::new(search);
        let caches = CacheLayers::with_defaults();
        let retrieval = RetrievalOrchestrator::new(
            embeddings.clone(),
            search.clone(),
            caches.embedding.clone(),
            caches.search_context.clone(),
            RetrievalConfig::default(),
        );
        Fixture {
            embeddings,
            search,
            caches,
            retrieval,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_joins_documents_and_caches_context() {
        let f = fixture(
            MockEmbeddingProvider::default(),
            MockSearchProvider::with_contents(&["Lego Classic", "Puzzle 500 piezas"]),
        );

        let context = f.retrieval.retrieve("¿Tienen legos?").await.unwrap();
        assert_eq!(context, "Lego Classic\nPuzzle 500 piezas");
        assert_eq!(
            f.caches.search_context.get_context("¿tienen legos?"),
            Some(context.clone())
        );

        // second call, different casing: no provider traffic
        let again = f.retrieval.retrieve("  ¿TIENEN LEGOS?").await.unwrap();
        assert_eq!(again, context);
        assert_eq!(f.embeddings.calls(), 1);
        assert_eq!(f.search.text_calls(), 1);
        assert_eq!(f.search.vector_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_vector_query_uses_config() {
        let f = fixture(
            MockEmbeddingProvider::default(),
            MockSearchProvider::with_contents(&["a", "b", "c", "d", "e", "f", "g"]),
        );

        let context = f.retrieval.retrieve("juguetes").await.unwrap();
        assert_eq!(context.lines().count(), 5);
        assert_eq!(
            f.search.last_vector_query(),
            Some((5, "content_vector".to_string()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_index_is_not_cached() {
        let f = fixture(MockEmbeddingProvider::default(), MockSearchProvider::empty());

        assert_eq!(f.retrieval.retrieve("hola").await.unwrap(), EMPTY_INDEX_CONTEXT);
        assert_eq!(f.retrieval.retrieve("hola").await.unwrap(), EMPTY_INDEX_CONTEXT);

        assert_eq!(f.search.text_calls(), 2);
        assert_eq!(f.search.vector_calls(), 0);
        assert!(f.caches.search_context.get_context("hola").is_none());
        // the embedding itself is still reused
        assert_eq!(f.embeddings.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_documents_yield_no_relevant_context() {
        let f = fixture(
            MockEmbeddingProvider::default(),
            MockSearchProvider::with_contents(&["", "   "]),
        );

        let context = f.retrieval.retrieve("dinosaurios").await.unwrap();
        assert_eq!(context, NO_RELEVANT_CONTEXT);
        assert_eq!(
            f.caches.search_context.get_context("dinosaurios").as_deref(),
            Some(NO_RELEVANT_CONTEXT)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_embedding_failure_degrades_without_caching() {
        let f = fixture(
            MockEmbeddingProvider::failing("quota exceeded"),
            MockSearchProvider::with_contents(&["Lego"]),
        );

        let context = f.retrieval.retrieve("hola").await.unwrap();
        assert!(context.starts_with(RETRIEVAL_ERROR_PREFIX));
        assert!(context.contains("quota exceeded"));
        assert_eq!(f.search.calls(), 0);
        assert!(f.caches.search_context.get_context("hola").is_none());
        assert!(f.caches.embedding.get_embedding("hola").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_failure_degrades_but_keeps_embedding() {
        let f = fixture(
            MockEmbeddingProvider::default(),
            MockSearchProvider::failing("503 service unavailable"),
        );

        let context = f.retrieval.retrieve("hola").await.unwrap();
        assert!(context.starts_with(RETRIEVAL_ERROR_PREFIX));
        assert!(f.caches.search_context.get_context("hola").is_none());
        assert!(f.caches.embedding.get_embedding("hola").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_search_times_out() {
        let f = fixture(
            MockEmbeddingProvider::default(),
            MockSearchProvider::with_contents(&["Lego"]).with_delay(Duration::from_secs(120)),
        );

        let context = f.retrieval.retrieve("hola").await.unwrap();
        assert_eq!(
            context,
            format!("{}text search timed out after 30s", RETRIEVAL_ERROR_PREFIX)
        );
        assert_eq!(f.caches.search_context.stats().size, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_embedding_outlives_search_context() {
        let f = fixture(
            MockEmbeddingProvider::default(),
            MockSearchProvider::with_contents(&["Lego"]),
        );

        f.retrieval.retrieve("lego").await.unwrap();
        // past the 15 min context TTL, inside the 30 min embedding TTL
        tokio::time::advance(Duration::from_secs(16 * 60)).await;
        f.retrieval.retrieve("lego").await.unwrap();

        assert_eq!(f.embeddings.calls(), 1);
        assert_eq!(f.search.text_calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected_before_providers() {
        let f = fixture(
            MockEmbeddingProvider::default(),
            MockSearchProvider::with_contents(&["Lego"]),
        );

        assert!(matches!(
            f.retrieval.retrieve("   ").await,
            Err(ChatError::InvalidInput(_))
        ));
        assert_eq!(f.embeddings.calls(), 0);
        assert_eq!(f.search.calls(), 0);
    }
}
