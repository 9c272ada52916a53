//! OpenAI-compatible local inference server (LM Studio, llama.cpp server)

use async_trait::async_trait;
use tracing::debug;

use super::chat_completion::{ChatCompletionRequest, ChatCompletionResponse};
use super::{ensure_success, LlmProvider, ProviderResult};
use crate::config::{LocalLlmConfig, DEFAULT_LOCAL_LLM_MODEL, DEFAULT_LOCAL_LLM_URL};
use ragchat_cache::ChatMessage;

/// Chat completions from a model served on the local machine
#[derive(Debug, Clone)]
pub struct LocalLlmProvider {
    /// Full chat completions URL
    url: String,
    model: String,
    client: reqwest::Client,
}

impl LocalLlmProvider {
    /// LM Studio on its default port
    pub fn new(model: &str) -> Self {
        Self::with_url(DEFAULT_LOCAL_LLM_URL, model)
    }

    pub fn with_url(url: &str, model: &str) -> Self {
        Self {
            url: url.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &LocalLlmConfig) -> Self {
        Self::with_url(&config.url, &config.model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Default for LocalLlmProvider {
    fn default() -> Self {
        Self::new(DEFAULT_LOCAL_LLM_MODEL)
    }
}

#[async_trait]
impl LlmProvider for LocalLlmProvider {
    fn name(&self) -> &str {
        "local-llm"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> ProviderResult<String> {
        debug!(model = %self.model, url = %self.url, "Calling local model");

        let request = ChatCompletionRequest {
            model: Some(&self.model),
            messages,
        };

        let response = self.client.post(&self.url).json(&request).send().await?;
        let body: ChatCompletionResponse = ensure_success(response).await?.json().await?;
        body.into_reply()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let provider = LocalLlmProvider::default();
        assert_eq!(provider.model(), "google/gemma-3-12b");
        assert_eq!(provider.url, "http://localhost:1234/v1/chat/completions");
    }

    #[test]
    fn test_from_config() {
        let provider = LocalLlmProvider::from_config(&LocalLlmConfig {
            url: "http://10.0.0.5:8080/v1/chat/completions".into(),
            model: "llama-3.1-8b".into(),
        });
        assert_eq!(provider.model(), "llama-3.1-8b");
        assert_eq!(provider.name(), "local-llm");
    }

    #[tokio::test]
    #[ignore] // Requires a local model server
    async fn test_local_completion() {
        let provider = LocalLlmProvider::default();
        let reply = provider
            .complete(&[ChatMessage::user("Di hola en una palabra")])
            .await
            .unwrap();
        assert!(!reply.is_empty());
    }
}
