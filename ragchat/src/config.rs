//! Environment configuration
//!
//! Values come from the process environment after `.env` has been loaded
//! with `dotenv`. Cloud credentials are optional at load time and only
//! become required when the provider that needs them is built.

use std::str::FromStr;
use std::time::Duration;

use ragchat_cache::{CacheConfig, CacheLayersConfig, HistoryConfig};

use crate::error::ConfigError;
use crate::retrieval::RetrievalConfig;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_JWT_SECRET: &str = "secret";
pub const DEFAULT_LOCAL_LLM_URL: &str = "http://localhost:1234/v1/chat/completions";
pub const DEFAULT_LOCAL_LLM_MODEL: &str = "google/gemma-3-12b";
pub const DEFAULT_OPENAI_API_VERSION: &str = "2024-02-15-preview";
pub const DEFAULT_SEARCH_API_VERSION: &str = "2023-11-01";

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// HTTP server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
        }
    }
}

/// OpenAI-compatible local server (LM Studio and similar)
#[derive(Debug, Clone)]
pub struct LocalLlmConfig {
    pub url: String,
    pub model: String,
}

impl Default for LocalLlmConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_LOCAL_LLM_URL.to_string(),
            model: DEFAULT_LOCAL_LLM_MODEL.to_string(),
        }
    }
}

/// Azure OpenAI credentials and deployments
#[derive(Debug, Clone)]
pub struct AzureOpenAiConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub chat_deployment: Option<String>,
    pub embedding_deployment: Option<String>,
    pub api_version: String,
}

impl Default for AzureOpenAiConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            chat_deployment: None,
            embedding_deployment: None,
            api_version: DEFAULT_OPENAI_API_VERSION.to_string(),
        }
    }
}

impl AzureOpenAiConfig {
    pub fn endpoint(&self) -> ConfigResult<&str> {
        require(&self.endpoint, "AZURE_OPENAI_ENDPOINT")
    }

    pub fn api_key(&self) -> ConfigResult<&str> {
        require(&self.api_key, "AZURE_OPENAI_API_KEY")
    }

    pub fn chat_deployment(&self) -> ConfigResult<&str> {
        require(&self.chat_deployment, "AZURE_OPENAI_CHAT_DEPLOYMENT")
    }

    pub fn embedding_deployment(&self) -> ConfigResult<&str> {
        require(&self.embedding_deployment, "AZURE_OPENAI_DEPLOYMENT_NAME")
    }
}

/// Azure AI Search index access
#[derive(Debug, Clone)]
pub struct AzureSearchConfig {
    pub endpoint: Option<String>,
    pub index_name: Option<String>,
    pub api_key: Option<String>,
    pub api_version: String,
}

impl Default for AzureSearchConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            index_name: None,
            api_key: None,
            api_version: DEFAULT_SEARCH_API_VERSION.to_string(),
        }
    }
}

impl AzureSearchConfig {
    pub fn endpoint(&self) -> ConfigResult<&str> {
        require(&self.endpoint, "AZURE_SEARCH_ENDPOINT")
    }

    pub fn index_name(&self) -> ConfigResult<&str> {
        require(&self.index_name, "AZURE_SEARCH_INDEX_NAME")
    }

    pub fn api_key(&self) -> ConfigResult<&str> {
        require(&self.api_key, "AZURE_SEARCH_KEY")
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub use_local_llm: bool,
    pub local_llm: LocalLlmConfig,
    /// Embed queries in-process instead of calling Azure OpenAI
    pub use_local_embeddings: bool,
    pub azure_openai: AzureOpenAiConfig,
    pub azure_search: AzureSearchConfig,
    pub retrieval: RetrievalConfig,
    pub caches: CacheLayersConfig,
    pub history: HistoryConfig,
}

impl AppConfig {
    /// Load `.env` (if present) and read the process environment
    pub fn from_env() -> ConfigResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let server = ServerConfig {
            host: var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(&var, "PORT", DEFAULT_PORT)?,
            jwt_secret: var("JWT_SECRET").unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string()),
        };

        let use_local_llm = flag(&var, "USE_LOCAL_LLM")?;
        let use_local_embeddings = flag(&var, "USE_LOCAL_EMBEDDINGS")?;

        let local_llm = LocalLlmConfig {
            url: var("LOCAL_LLM_URL").unwrap_or_else(|| DEFAULT_LOCAL_LLM_URL.to_string()),
            model: var("LOCAL_LLM_MODEL").unwrap_or_else(|| DEFAULT_LOCAL_LLM_MODEL.to_string()),
        };

        let azure_openai = AzureOpenAiConfig {
            endpoint: var("AZURE_OPENAI_ENDPOINT"),
            api_key: var("AZURE_OPENAI_API_KEY"),
            chat_deployment: var("AZURE_OPENAI_CHAT_DEPLOYMENT"),
            embedding_deployment: var("AZURE_OPENAI_DEPLOYMENT_NAME"),
            api_version: var("AZURE_OPENAI_API_VERSION")
                .unwrap_or_else(|| DEFAULT_OPENAI_API_VERSION.to_string()),
        };

        let azure_search = AzureSearchConfig {
            endpoint: var("AZURE_SEARCH_ENDPOINT"),
            index_name: var("AZURE_SEARCH_INDEX_NAME"),
            api_key: var("AZURE_SEARCH_KEY"),
            api_version: var("AZURE_SEARCH_API_VERSION")
                .unwrap_or_else(|| DEFAULT_SEARCH_API_VERSION.to_string()),
        };

        let defaults = RetrievalConfig::default();
        let retrieval = RetrievalConfig {
            top_k: parse_or(&var, "RAG_TOP_K", defaults.top_k)?,
            vector_field: var("RAG_VECTOR_FIELD").unwrap_or(defaults.vector_field),
            provider_timeout: Duration::from_secs(parse_or(
                &var,
                "PROVIDER_TIMEOUT_SECS",
                defaults.provider_timeout.as_secs(),
            )?),
        };
        if retrieval.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                name: "RAG_TOP_K",
                value: "0".into(),
            });
        }
        if retrieval.provider_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "PROVIDER_TIMEOUT_SECS",
                value: "0".into(),
            });
        }

        let layer_defaults = CacheLayersConfig::default();
        let max_entries = parse_or(
            &var,
            "CACHE_MAX_ENTRIES",
            layer_defaults.embedding.max_entries,
        )?;
        let layer = |name: &'static str, fallback: &CacheConfig| -> ConfigResult<CacheConfig> {
            let secs = parse_or(&var, name, fallback.ttl.as_secs())?;
            Ok(CacheConfig::builder()
                .ttl(Duration::from_secs(secs))
                .max_entries(max_entries)
                .build())
        };
        let caches = CacheLayersConfig {
            embedding: layer("EMBEDDING_CACHE_TTL_SECS", &layer_defaults.embedding)?,
            search_context: layer("SEARCH_CACHE_TTL_SECS", &layer_defaults.search_context)?,
            response: layer("RESPONSE_CACHE_TTL_SECS", &layer_defaults.response)?,
        };
        caches.validate()?;

        let history_defaults = HistoryConfig::default();
        let history = HistoryConfig::default()
            .max_messages(parse_or(
                &var,
                "HISTORY_MAX_MESSAGES",
                history_defaults.max_messages,
            )?)
            .ttl(Duration::from_secs(parse_or(
                &var,
                "HISTORY_TTL_SECS",
                history_defaults.ttl.as_secs(),
            )?))
            .sweep_interval(Duration::from_secs(parse_or(
                &var,
                "HISTORY_SWEEP_SECS",
                history_defaults.sweep_interval.as_secs(),
            )?));
        history.validate()?;

        Ok(Self {
            server,
            use_local_llm,
            local_llm,
            use_local_embeddings,
            azure_openai,
            azure_search,
            retrieval,
            caches,
            history,
        })
    }

    /// Human readable overview with secrets masked
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        let shown = |value: &Option<String>| value.clone().unwrap_or_else(|| "<unset>".into());
        let hidden = |value: &Option<String>| {
            value
                .as_deref()
                .map(mask_secret)
                .unwrap_or_else(|| "<unset>".into())
        };

        let llm = if self.use_local_llm {
            format!("local ({} @ {})", self.local_llm.model, self.local_llm.url)
        } else {
            "azure openai".to_string()
        };

        vec![
            (
                "server",
                format!("{}:{}", self.server.host, self.server.port),
            ),
            ("jwt_secret", mask_secret(&self.server.jwt_secret)),
            ("llm", llm),
            (
                "embeddings",
                if self.use_local_embeddings {
                    "local (fastembed)".to_string()
                } else {
                    "azure openai".to_string()
                },
            ),
            ("azure_openai_endpoint", shown(&self.azure_openai.endpoint)),
            ("azure_openai_api_key", hidden(&self.azure_openai.api_key)),
            (
                "azure_openai_chat_deployment",
                shown(&self.azure_openai.chat_deployment),
            ),
            (
                "azure_openai_embedding_deployment",
                shown(&self.azure_openai.embedding_deployment),
            ),
            ("azure_search_endpoint", shown(&self.azure_search.endpoint)),
            ("azure_search_index", shown(&self.azure_search.index_name)),
            ("azure_search_key", hidden(&self.azure_search.api_key)),
            (
                "vector_query",
                format!(
                    "k={} field={}",
                    self.retrieval.top_k, self.retrieval.vector_field
                ),
            ),
            (
                "provider_timeout",
                format!("{}s", self.retrieval.provider_timeout.as_secs()),
            ),
        ]
    }
}

fn require<'a>(value: &'a Option<String>, name: &'static str) -> ConfigResult<&'a str> {
    value.as_deref().ok_or(ConfigError::MissingEnvVar(name))
}

fn parse_or<T, F>(var: &F, name: &'static str, default: T) -> ConfigResult<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
    }
}

fn flag<F>(var: &F, name: &'static str) -> ConfigResult<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        None => Ok(false),
        Some(value) => parse_flag(&value).ok_or(ConfigError::InvalidValue { name, value }),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Keep the first four characters of a secret
pub fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> ConfigResult<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.jwt_secret, "secret");
        assert!(!config.use_local_llm);
        assert_eq!(config.local_llm.model, "google/gemma-3-12b");
        assert_eq!(config.azure_openai.api_version, "2024-02-15-preview");
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.vector_field, "content_vector");
        assert_eq!(config.retrieval.provider_timeout, Duration::from_secs(30));
        assert_eq!(config.caches.embedding.ttl, Duration::from_secs(1800));
        assert_eq!(config.caches.search_context.ttl, Duration::from_secs(900));
        assert_eq!(config.caches.response.ttl, Duration::from_secs(3600));
        assert_eq!(config.caches.response.max_entries, 100);
        assert_eq!(config.history.max_messages, 20);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("PORT", "8081"),
            ("USE_LOCAL_LLM", "true"),
            ("LOCAL_LLM_MODEL", "llama-3"),
            ("RAG_TOP_K", "3"),
            ("CACHE_MAX_ENTRIES", "10"),
            ("RESPONSE_CACHE_TTL_SECS", "60"),
            ("HISTORY_MAX_MESSAGES", "4"),
        ])
        .unwrap();

        assert_eq!(config.server.port, 8081);
        assert!(config.use_local_llm);
        assert_eq!(config.local_llm.model, "llama-3");
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.caches.embedding.max_entries, 10);
        assert_eq!(config.caches.response.ttl, Duration::from_secs(60));
        assert_eq!(config.history.max_messages, 4);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            load(&[("PORT", "http")]),
            Err(ConfigError::InvalidValue { name: "PORT", .. })
        ));
        assert!(matches!(
            load(&[("USE_LOCAL_LLM", "maybe")]),
            Err(ConfigError::InvalidValue { name: "USE_LOCAL_LLM", .. })
        ));
        assert!(matches!(
            load(&[("CACHE_MAX_ENTRIES", "0")]),
            Err(ConfigError::Cache(_))
        ));
        assert!(load(&[("RAG_TOP_K", "0")]).is_err());
        assert!(matches!(
            load(&[("PROVIDER_TIMEOUT_SECS", "0")]),
            Err(ConfigError::InvalidValue { name: "PROVIDER_TIMEOUT_SECS", .. })
        ));
    }

    #[test]
    fn test_missing_credentials_only_fail_on_access() {
        let config = load(&[("AZURE_SEARCH_ENDPOINT", "https://search.example")]).unwrap();

        assert_eq!(
            config.azure_search.endpoint().unwrap(),
            "https://search.example"
        );
        assert!(matches!(
            config.azure_search.api_key(),
            Err(ConfigError::MissingEnvVar("AZURE_SEARCH_KEY"))
        ));
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        let config = load(&[("AZURE_OPENAI_API_KEY", "  "), ("HOST", "")]).unwrap();
        assert!(config.azure_openai.api_key.is_none());
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_summary_masks_secrets() {
        let config = load(&[("AZURE_SEARCH_KEY", "abcd1234secret")]).unwrap();
        let summary = config.summary();

        let key = summary
            .iter()
            .find(|(name, _)| *name == "azure_search_key")
            .map(|(_, value)| value.as_str());
        assert_eq!(key, Some("abcd****"));
        assert!(summary.iter().all(|(_, value)| !value.contains("1234secret")));
    }

    #[test]
    fn test_mask_short_secret() {
        assert_eq!(mask_secret("abc"), "****");
    }
}
