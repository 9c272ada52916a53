//! # ragchat
//!
//! Retrieval-augmented chat backend for a store assistant.
//!
//! A chat turn checks the response cache, records the message in the
//! user's history, retrieves context (search-context cache, embedding
//! cache, then the embedding model and search index), asks the language
//! model and caches the reply. Caching and history live in
//! [`ragchat_cache`]; this crate adds the providers, the orchestration,
//! configuration and the HTTP layer.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ragchat::chat::Providers;
//! use ragchat::prompts::StorefrontPrompt;
//! use ragchat::providers::mock::{MockEmbeddingProvider, MockLlmProvider, MockSearchProvider};
//! use ragchat::{AppConfig, ChatServices};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let providers = Providers {
//!         embeddings: Arc::new(MockEmbeddingProvider::default()),
//!         search: Arc::new(MockSearchProvider::with_contents(&["Lego Classic, 4+ años"])),
//!         llm: Arc::new(MockLlmProvider::constant("¡Tenemos Lego Classic!")),
//!         prompt: Arc::new(StorefrontPrompt::default()),
//!     };
//!     let services = ChatServices::with_providers(providers, &AppConfig::default())?;
//!
//!     let reply = services.orchestrator.respond("¿Tienen Lego?", "ana").await?;
//!     println!("{}", reply);
//!
//!     services.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chat;
pub mod config;
pub mod error;
pub mod prompts;
pub mod providers;
pub mod retrieval;
pub mod services;

pub use chat::{ChatOrchestrator, Providers};
pub use config::AppConfig;
pub use error::{ChatError, ConfigError, ProviderError};
pub use providers::{EmbeddingProvider, LlmProvider, PromptTemplate, SearchDocument, SearchProvider};
pub use retrieval::{RetrievalConfig, RetrievalOrchestrator};
pub use services::ChatServices;
