//! Local embedding generation with fastembed
//!
//! Useful for development without Azure credentials. The vectors differ
//! from the index's Azure embeddings, so vector search only makes sense
//! against an index built with the same model.

use std::sync::Arc;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::info;

use super::{EmbeddingProvider, ProviderResult};
use crate::error::ProviderError;

/// Embedding model running in-process
pub struct FastEmbedProvider {
    model: Arc<TextEmbedding>,
    dimension: usize,
}

impl FastEmbedProvider {
    /// Multilingual model, suitable for Spanish queries
    pub fn new() -> ProviderResult<Self> {
        Self::with_model(EmbeddingModel::MultilingualE5Small)
    }

    pub fn with_model(model_name: EmbeddingModel) -> ProviderResult<Self> {
        info!("Initializing embedding model: {:?}", model_name);

        let dimension = match model_name {
            EmbeddingModel::MultilingualE5Small => 384,
            EmbeddingModel::MultilingualE5Base => 768,
            EmbeddingModel::MultilingualE5Large => 1024,
            EmbeddingModel::BGEBaseENV15 => 768,
            _ => 384,
        };

        let mut options = InitOptions::default();
        options.model_name = model_name;
        options.show_download_progress = true;

        let model = TextEmbedding::try_new(options).map_err(|e| {
            ProviderError::NotConfigured(format!("failed to load embedding model: {}", e))
        })?;

        Ok(Self {
            model: Arc::new(model),
            dimension,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    fn name(&self) -> &str {
        "fastembed"
    }

    async fn embed(&self, text: &str) -> ProviderResult<Vec<f32>> {
        let model = Arc::clone(&self.model);
        // e5 models expect a "query: " prefix on search queries
        let input = format!("query: {}", text);

        let embeddings = tokio::task::spawn_blocking(move || model.embed(vec![input], None))
            .await
            .map_err(|e| ProviderError::Connection(format!("embedding task failed: {}", e)))?
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("no embedding generated".into()))
    }
}
