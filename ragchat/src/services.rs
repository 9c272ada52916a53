//! Process-wide wiring of stores, providers and the sweep task

use std::sync::Arc;

use tracing::info;

use crate::chat::{ChatOrchestrator, Providers};
use crate::config::{AppConfig, ConfigResult};
use crate::prompts::StorefrontPrompt;
use crate::providers::{
    AzureOpenAiChat, AzureOpenAiEmbeddings, AzureSearchProvider, EmbeddingProvider, LlmProvider,
    LocalLlmProvider,
};
use ragchat_cache::{CacheLayers, ConversationHistoryStore, HistorySweeper};

/// Everything a running server shares between requests
///
/// Built once at startup. Each instance owns independent caches and
/// history; nothing is shared across processes.
pub struct ChatServices {
    pub orchestrator: Arc<ChatOrchestrator>,
    sweeper: HistorySweeper,
}

impl ChatServices {
    /// Build real providers from configuration
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_config(config: &AppConfig) -> ConfigResult<Self> {
        let providers = Providers {
            embeddings: embedding_provider(config)?,
            search: Arc::new(AzureSearchProvider::from_config(&config.azure_search)?),
            llm: llm_provider(config)?,
            prompt: Arc::new(StorefrontPrompt::default()),
        };

        Self::with_providers(providers, config)
    }

    /// Build with caller-supplied providers, e.g. mocks
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_providers(providers: Providers, config: &AppConfig) -> ConfigResult<Self> {
        let caches = CacheLayers::new(&config.caches)?;
        let history = Arc::new(ConversationHistoryStore::try_new(config.history.clone())?);
        let sweeper = HistorySweeper::start(&history);

        let orchestrator = Arc::new(ChatOrchestrator::new(
            providers,
            caches,
            history,
            config.retrieval.clone(),
        ));

        info!("Chat services initialized");
        Ok(Self {
            orchestrator,
            sweeper,
        })
    }

    /// Stop the history sweep and wait for it
    pub async fn shutdown(self) {
        self.sweeper.shutdown().await;
    }
}

fn llm_provider(config: &AppConfig) -> ConfigResult<Arc<dyn LlmProvider>> {
    if config.use_local_llm {
        info!(model = %config.local_llm.model, "Using local language model");
        return Ok(Arc::new(LocalLlmProvider::from_config(&config.local_llm)));
    }

    info!("Using Azure OpenAI language model");
    Ok(Arc::new(AzureOpenAiChat::from_config(&config.azure_openai)?))
}

#[cfg(feature = "fastembed")]
fn embedding_provider(config: &AppConfig) -> ConfigResult<Arc<dyn EmbeddingProvider>> {
    if config.use_local_embeddings {
        return Ok(Arc::new(crate::providers::FastEmbedProvider::new()?));
    }
    Ok(Arc::new(AzureOpenAiEmbeddings::from_config(
        &config.azure_openai,
    )?))
}

#[cfg(not(feature = "fastembed"))]
fn embedding_provider(config: &AppConfig) -> ConfigResult<Arc<dyn EmbeddingProvider>> {
    if config.use_local_embeddings {
        return Err(crate::error::ConfigError::FeatureDisabled {
            setting: "USE_LOCAL_EMBEDDINGS",
            feature: "fastembed",
        });
    }
    Ok(Arc::new(AzureOpenAiEmbeddings::from_config(
        &config.azure_openai,
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();
        AppConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap()
    }

    fn azure_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            ("AZURE_OPENAI_ENDPOINT", "https://toyboy.openai.azure.com"),
            ("AZURE_OPENAI_API_KEY", "key"),
            ("AZURE_OPENAI_CHAT_DEPLOYMENT", "gpt-4o"),
            ("AZURE_OPENAI_DEPLOYMENT_NAME", "text-embedding-ada-002"),
            ("AZURE_SEARCH_ENDPOINT", "https://toyboy.search.windows.net"),
            ("AZURE_SEARCH_INDEX_NAME", "juguetes"),
            ("AZURE_SEARCH_KEY", "key"),
        ]
    }

    #[tokio::test]
    async fn test_from_config_with_azure_credentials() {
        let services = ChatServices::from_config(&config(&azure_vars())).unwrap();
        assert_eq!(
            services.orchestrator.conversation_stats().max_messages,
            20
        );
        services.shutdown().await;
    }

    #[tokio::test]
    async fn test_local_llm_does_not_need_chat_deployment() {
        let mut vars: Vec<_> = azure_vars()
            .into_iter()
            .filter(|(name, _)| *name != "AZURE_OPENAI_CHAT_DEPLOYMENT")
            .collect();
        vars.push(("USE_LOCAL_LLM", "true"));

        let services = ChatServices::from_config(&config(&vars)).unwrap();
        services.shutdown().await;
    }

    #[tokio::test]
    async fn test_missing_search_credentials_fail() {
        let vars: Vec<_> = azure_vars()
            .into_iter()
            .filter(|(name, _)| *name != "AZURE_SEARCH_KEY")
            .collect();

        assert!(matches!(
            ChatServices::from_config(&config(&vars)),
            Err(ConfigError::MissingEnvVar("AZURE_SEARCH_KEY"))
        ));
    }

    #[cfg(not(feature = "fastembed"))]
    #[tokio::test]
    async fn test_local_embeddings_need_feature() {
        let mut vars = azure_vars();
        vars.push(("USE_LOCAL_EMBEDDINGS", "true"));

        assert!(matches!(
            ChatServices::from_config(&config(&vars)),
            Err(ConfigError::FeatureDisabled { .. })
        ));
    }
}
