//! Error types for providers, chat turns and configuration

use thiserror::Error;

/// Failure of an external provider (embeddings, search or LLM)
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request failed with status {status}: {body}")]
    Request { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("{operation} timed out after {seconds}s")]
    Timeout { seconds: u64, operation: &'static str },

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::InvalidResponse(err.to_string())
        } else {
            ProviderError::Connection(err.to_string())
        }
    }
}

/// Failure of a chat turn
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Failure while reading configuration from the environment
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("{setting} requires the `{feature}` cargo feature")]
    FeatureDisabled {
        setting: &'static str,
        feature: &'static str,
    },

    #[error("Failed to initialize provider: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Cache(#[from] ragchat_cache::CacheError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message() {
        let err = ProviderError::Timeout {
            seconds: 30,
            operation: "embedding",
        };
        assert_eq!(err.to_string(), "embedding timed out after 30s");
    }

    #[test]
    fn test_provider_error_is_transparent_in_chat_error() {
        let err: ChatError = ProviderError::Connection("refused".into()).into();
        assert_eq!(err.to_string(), "Connection failed: refused");
        assert!(matches!(err, ChatError::Provider(_)));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            name: "PORT",
            value: "http".into(),
        };
        assert_eq!(err.to_string(), "Invalid value for PORT: \"http\"");
    }
}
