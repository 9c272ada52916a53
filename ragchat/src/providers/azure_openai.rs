//! Azure OpenAI embeddings and chat completions

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::chat_completion::{ChatCompletionRequest, ChatCompletionResponse};
use super::{ensure_success, trim_endpoint, EmbeddingProvider, LlmProvider, ProviderResult};
use crate::config::{AzureOpenAiConfig, ConfigResult};
use crate::error::ProviderError;
use ragchat_cache::ChatMessage;

fn deployment_url(endpoint: &str, deployment: &str, operation: &str, api_version: &str) -> String {
    format!(
        "{}/openai/deployments/{}/{}?api-version={}",
        trim_endpoint(endpoint),
        deployment,
        operation,
        api_version
    )
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Embeddings from an Azure OpenAI deployment
#[derive(Debug, Clone)]
pub struct AzureOpenAiEmbeddings {
    url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AzureOpenAiEmbeddings {
    pub fn new(endpoint: &str, deployment: &str, api_key: &str, api_version: &str) -> Self {
        Self {
            url: deployment_url(endpoint, deployment, "embeddings", api_version),
            api_key: api_key.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Build from configuration; fails when a credential is missing
    pub fn from_config(config: &AzureOpenAiConfig) -> ConfigResult<Self> {
        Ok(Self::new(
            config.endpoint()?,
            config.embedding_deployment()?,
            config.api_key()?,
            &config.api_version,
        ))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl EmbeddingProvider for AzureOpenAiEmbeddings {
    fn name(&self) -> &str {
        "azure-openai-embeddings"
    }

    async fn embed(&self, text: &str) -> ProviderResult<Vec<f32>> {
        let response = self
            .client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(&EmbeddingRequest { input: text })
            .send()
            .await?;

        let body: EmbeddingResponse = ensure_success(response).await?.json().await?;
        let embedding = body
            .data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .ok_or_else(|| ProviderError::InvalidResponse("no embedding in response".into()))?;

        debug!(dimension = embedding.len(), "Embedding generated");
        Ok(embedding)
    }
}

/// Chat completions from an Azure OpenAI deployment
#[derive(Debug, Clone)]
pub struct AzureOpenAiChat {
    url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AzureOpenAiChat {
    pub fn new(endpoint: &str, deployment: &str, api_key: &str, api_version: &str) -> Self {
        Self {
            url: deployment_url(endpoint, deployment, "chat/completions", api_version),
            api_key: api_key.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &AzureOpenAiConfig) -> ConfigResult<Self> {
        Ok(Self::new(
            config.endpoint()?,
            config.chat_deployment()?,
            config.api_key()?,
            &config.api_version,
        ))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl LlmProvider for AzureOpenAiChat {
    fn name(&self) -> &str {
        "azure-openai-chat"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> ProviderResult<String> {
        let request = ChatCompletionRequest {
            model: None,
            messages,
        };

        let response = self
            .client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let body: ChatCompletionResponse = ensure_success(response).await?.json().await?;
        body.into_reply()
    }
}
