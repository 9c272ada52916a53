//! In-memory providers for tests and offline runs
//!
//! Every mock counts its calls so tests can assert which providers a chat
//! turn actually reached.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use super::{EmbeddingProvider, LlmProvider, ProviderResult, SearchDocument, SearchProvider};
use crate::error::ProviderError;
use ragchat_cache::ChatMessage;

async fn simulate(delay: Option<Duration>, failure: &Option<String>) -> ProviderResult<()> {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    match failure {
        Some(message) => Err(ProviderError::Connection(message.clone())),
        None => Ok(()),
    }
}

/// Deterministic embeddings derived from the input bytes
#[derive(Debug)]
pub struct MockEmbeddingProvider {
    dimension: usize,
    failure: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockEmbeddingProvider {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            failure: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every call fails with a connection error
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(8)
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new(8)
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn name(&self) -> &str {
        "mock-embeddings"
    }

    async fn embed(&self, text: &str) -> ProviderResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        simulate(self.delay, &self.failure).await?;

        let bytes = text.as_bytes();
        Ok((0..self.dimension)
            .map(|i| {
                let byte = bytes.get(i % bytes.len().max(1)).copied().unwrap_or(0);
                f32::from(byte) / 255.0
            })
            .collect())
    }
}

/// A fixed document set returned for every query
#[derive(Debug)]
pub struct MockSearchProvider {
    documents: Vec<SearchDocument>,
    failure: Option<String>,
    delay: Option<Duration>,
    text_calls: AtomicUsize,
    vector_calls: AtomicUsize,
    last_vector_query: Mutex<Option<(usize, String)>>,
}

impl MockSearchProvider {
    pub fn with_documents(documents: Vec<SearchDocument>) -> Self {
        Self {
            documents,
            failure: None,
            delay: None,
            text_calls: AtomicUsize::new(0),
            vector_calls: AtomicUsize::new(0),
            last_vector_query: Mutex::new(None),
        }
    }

    /// Index with one document per content string
    pub fn with_contents(contents: &[&str]) -> Self {
        Self::with_documents(contents.iter().map(|c| SearchDocument::new(*c)).collect())
    }

    /// An index without documents
    pub fn empty() -> Self {
        Self::with_documents(Vec::new())
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::empty()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn text_calls(&self) -> usize {
        self.text_calls.load(Ordering::SeqCst)
    }

    pub fn vector_calls(&self) -> usize {
        self.vector_calls.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.text_calls() + self.vector_calls()
    }

    /// `(k, field)` of the most recent vector query
    pub fn last_vector_query(&self) -> Option<(usize, String)> {
        self.last_vector_query
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SearchProvider for MockSearchProvider {
    fn name(&self) -> &str {
        "mock-search"
    }

    async fn search_text(&self, _query: &str) -> ProviderResult<Vec<SearchDocument>> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        simulate(self.delay, &self.failure).await?;
        Ok(self.documents.clone())
    }

    async fn search_vector(
        &self,
        _embedding: &[f32],
        k: usize,
        field: &str,
    ) -> ProviderResult<Vec<SearchDocument>> {
        self.vector_calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_vector_query
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some((k, field.to_string()));
        simulate(self.delay, &self.failure).await?;
        Ok(self.documents.iter().take(k).cloned().collect())
    }
}

/// Canned replies, cycled in order
#[derive(Debug)]
pub struct MockLlmProvider {
    responses: Vec<String>,
    failure: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_messages: Mutex<Vec<ChatMessage>>,
}

impl MockLlmProvider {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses,
            failure: None,
            delay: None,
            calls: AtomicUsize::new(0),
            last_messages: Mutex::new(Vec::new()),
        }
    }

    /// Always the same reply
    pub fn constant(response: &str) -> Self {
        Self::new(vec![response.to_string()])
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(Vec::new())
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Messages sent on the most recent call
    pub fn last_messages(&self) -> Vec<ChatMessage> {
        self.last_messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn name(&self) -> &str {
        "mock-llm"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> ProviderResult<String> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = messages.to_vec();
        simulate(self.delay, &self.failure).await?;

        if self.responses.is_empty() {
            return Err(ProviderError::InvalidResponse("no canned responses".into()));
        }
        Ok(self.responses[index % self.responses.len()].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_embeddings_are_deterministic() {
        let provider = MockEmbeddingProvider::new(4);
        let a = provider.embed("hola").await.unwrap();
        let b = provider.embed("hola").await.unwrap();

        assert_eq!(a, b);
        assert_eq!(a.len(), 4);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_search_counts_each_kind() {
        let provider = MockSearchProvider::with_contents(&["a", "b", "c"]);

        assert_eq!(provider.search_text("x").await.unwrap().len(), 3);
        assert_eq!(
            provider
                .search_vector(&[0.0], 2, "content_vector")
                .await
                .unwrap()
                .len(),
            2
        );
        assert_eq!(provider.text_calls(), 1);
        assert_eq!(provider.vector_calls(), 1);
        assert_eq!(
            provider.last_vector_query(),
            Some((2, "content_vector".to_string()))
        );
    }

    #[tokio::test]
    async fn test_llm_cycles_and_records_messages() {
        let provider = MockLlmProvider::new(vec!["uno".into(), "dos".into()]);
        let messages = [ChatMessage::user("hola")];

        assert_eq!(provider.complete(&messages).await.unwrap(), "uno");
        assert_eq!(provider.complete(&messages).await.unwrap(), "dos");
        assert_eq!(provider.complete(&messages).await.unwrap(), "uno");
        assert_eq!(provider.last_messages(), messages.to_vec());
    }

    #[tokio::test]
    async fn test_failing_mocks_still_count() {
        let llm = MockLlmProvider::failing("model offline");
        assert!(matches!(
            llm.complete(&[]).await,
            Err(ProviderError::Connection(_))
        ));
        assert_eq!(llm.calls(), 1);

        let embeddings = MockEmbeddingProvider::failing("quota exceeded");
        assert!(embeddings.embed("hola").await.is_err());
        assert_eq!(embeddings.calls(), 1);
    }
}
