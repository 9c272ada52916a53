//! Azure AI Search over a document index

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ensure_success, trim_endpoint, ProviderResult, SearchDocument, SearchProvider};
use crate::config::{AzureSearchConfig, ConfigResult};

#[derive(Debug, Serialize)]
struct TextQuery<'a> {
    search: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VectorSearch<'a> {
    vector_queries: [VectorQuery<'a>; 1],
    top: usize,
}

#[derive(Debug, Serialize)]
struct VectorQuery<'a> {
    kind: &'static str,
    vector: &'a [f32],
    k: usize,
    fields: &'a str,
    exhaustive: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<SearchDocument>,
}

/// Text and vector queries against one index
#[derive(Debug, Clone)]
pub struct AzureSearchProvider {
    url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AzureSearchProvider {
    pub fn new(endpoint: &str, index_name: &str, api_key: &str, api_version: &str) -> Self {
        Self {
            url: format!(
                "{}/indexes/{}/docs/search?api-version={}",
                trim_endpoint(endpoint),
                index_name,
                api_version
            ),
            api_key: api_key.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &AzureSearchConfig) -> ConfigResult<Self> {
        Ok(Self::new(
            config.endpoint()?,
            config.index_name()?,
            config.api_key()?,
            &config.api_version,
        ))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post<B: Serialize + ?Sized>(&self, body: &B) -> ProviderResult<Vec<SearchDocument>> {
        let response = self
            .client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let body: SearchResponse = ensure_success(response).await?.json().await?;
        Ok(body.value)
    }
}

#[async_trait]
impl SearchProvider for AzureSearchProvider {
    fn name(&self) -> &str {
        "azure-search"
    }

    async fn search_text(&self, query: &str) -> ProviderResult<Vec<SearchDocument>> {
        let documents = self.post(&TextQuery { search: query }).await?;
        debug!(count = documents.len(), "Text search finished");
        Ok(documents)
    }

    async fn search_vector(
        &self,
        embedding: &[f32],
        k: usize,
        field: &str,
    ) -> ProviderResult<Vec<SearchDocument>> {
        let body = VectorSearch {
            vector_queries: [VectorQuery {
                kind: "vector",
                vector: embedding,
                k,
                fields: field,
                exhaustive: true,
            }],
            top: k,
        };

        let documents = self.post(&body).await?;
        debug!(count = documents.len(), k, field, "Vector search finished");
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    #[test]
    fn test_url() {
        let provider = AzureSearchProvider::new(
            "https://toyboy.search.windows.net/",
            "juguetes",
            "key",
            "2023-11-01",
        );
        assert_eq!(
            provider.url(),
            "https://toyboy.search.windows.net/indexes/juguetes/docs/search?api-version=2023-11-01"
        );
    }

    #[test]
    fn test_vector_body_shape() {
        let vector = [0.5_f32, -0.25];
        let body = VectorSearch {
            vector_queries: [VectorQuery {
                kind: "vector",
                vector: &vector,
                k: 5,
                fields: "content_vector",
                exhaustive: true,
            }],
            top: 5,
        };

        let json = serde_json::to_value(&body).unwrap();
        let query = &json["vectorQueries"][0];
        assert_eq!(query["kind"], "vector");
        assert_eq!(query["k"], 5);
        assert_eq!(query["fields"], "content_vector");
        assert_eq!(query["exhaustive"], true);
        assert_eq!(query["vector"][1], -0.25);
        assert_eq!(json["top"], 5);
    }

    #[test]
    fn test_from_config_requires_index() {
        let config = AzureSearchConfig {
            endpoint: Some("https://toyboy.search.windows.net".into()),
            api_key: Some("key".into()),
            ..Default::default()
        };
        assert!(matches!(
            AzureSearchProvider::from_config(&config),
            Err(ConfigError::MissingEnvVar("AZURE_SEARCH_INDEX_NAME"))
        ));
    }
}
