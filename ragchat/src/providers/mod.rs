//! External providers used by a chat turn
//!
//! Three async seams are consumed by the orchestrators: an embedding model,
//! a search index and a chat-completion model. They are the only places a
//! chat turn suspends. A fourth, synchronous seam builds the system prompt.

pub mod azure_openai;
pub mod azure_search;
mod chat_completion;
#[cfg(feature = "fastembed")]
pub mod embedding;
pub mod local_llm;
pub mod mock;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use ragchat_cache::ChatMessage;

pub use azure_openai::{AzureOpenAiChat, AzureOpenAiEmbeddings};
pub use azure_search::AzureSearchProvider;
#[cfg(feature = "fastembed")]
pub use embedding::FastEmbedProvider;
pub use local_llm::LocalLlmProvider;

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// A document returned by the search index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    #[serde(default)]
    pub id: Option<String>,

    /// Text used as retrieval context
    #[serde(default)]
    pub content: String,

    #[serde(default, rename = "@search.score")]
    pub score: Option<f64>,
}

impl SearchDocument {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: None,
            content: content.into(),
            score: None,
        }
    }
}

/// Turns text into a vector
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn embed(&self, text: &str) -> ProviderResult<Vec<f32>>;
}

/// Document search over an external index
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Plain full-text search
    async fn search_text(&self, query: &str) -> ProviderResult<Vec<SearchDocument>>;

    /// Nearest neighbours of `embedding` over the vector `field`
    async fn search_vector(
        &self,
        embedding: &[f32],
        k: usize,
        field: &str,
    ) -> ProviderResult<Vec<SearchDocument>>;
}

/// Chat-completion model
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Complete a conversation whose first message is the system prompt
    async fn complete(&self, messages: &[ChatMessage]) -> ProviderResult<String>;
}

/// Builds the system prompt around retrieved context
pub trait PromptTemplate: Send + Sync {
    fn build_system_prompt(&self, context: &str) -> String;
}

/// Run a provider call with an upper bound on its duration
pub async fn with_timeout<T, F>(
    limit: Duration,
    operation: &'static str,
    call: F,
) -> ProviderResult<T>
where
    F: Future<Output = ProviderResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout {
            seconds: limit.as_secs(),
            operation,
        }),
    }
}

/// Map a non-success HTTP status into [`ProviderError::Request`]
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> ProviderResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Request {
        status: status.as_u16(),
        body,
    })
}

/// Strip trailing slashes so paths can be appended safely
pub(crate) fn trim_endpoint(endpoint: &str) -> &str {
    endpoint.trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_document_from_index_json() {
        let doc: SearchDocument = serde_json::from_value(serde_json::json!({
            "@search.score": 0.83,
            "id": "doc-7",
            "content": "Rompecabezas de 500 piezas",
            "category": "puzzles"
        }))
        .unwrap();

        assert_eq!(doc.id.as_deref(), Some("doc-7"));
        assert_eq!(doc.content, "Rompecabezas de 500 piezas");
        assert_eq!(doc.score, Some(0.83));
    }

    #[test]
    fn test_search_document_without_content() {
        let doc: SearchDocument =
            serde_json::from_value(serde_json::json!({ "id": "x" })).unwrap();
        assert!(doc.content.is_empty());
    }

    #[test]
    fn test_trim_endpoint() {
        assert_eq!(trim_endpoint("https://a.example/"), "https://a.example");
        assert_eq!(trim_endpoint("https://a.example"), "https://a.example");
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_expires() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, ProviderError>(1)
        };

        let err = with_timeout(Duration::from_secs(30), "search", slow)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Timeout {
                seconds: 30,
                operation: "search"
            }
        ));
    }

    #[tokio::test]
    async fn test_with_timeout_passes_result_through() {
        let fast = async { Err::<u8, _>(ProviderError::InvalidResponse("bad".into())) };
        let err = with_timeout(Duration::from_secs(1), "llm", fast)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }
}
