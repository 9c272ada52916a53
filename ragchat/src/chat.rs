//! One chat turn: response cache, history, retrieval and the language model

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, instrument};

use crate::error::{ChatError, ProviderError};
use crate::providers::{
    with_timeout, EmbeddingProvider, LlmProvider, PromptTemplate, SearchProvider,
};
use crate::retrieval::{RetrievalConfig, RetrievalOrchestrator};
use ragchat_cache::{
    CacheLayers, CacheStatsReport, ChatMessage, ConversationHistoryStore, HistoryStats, Message,
    Role,
};

/// The external seams of a chat turn
#[derive(Clone)]
pub struct Providers {
    pub embeddings: Arc<dyn EmbeddingProvider>,
    pub search: Arc<dyn SearchProvider>,
    pub llm: Arc<dyn LlmProvider>,
    pub prompt: Arc<dyn PromptTemplate>,
}

/// Answers user messages
///
/// Holds shared handles to the three caches and the history store; it
/// owns none of them. Concurrent identical messages may both miss the
/// response cache and both reach the model; the last reply stored wins.
pub struct ChatOrchestrator {
    retrieval: RetrievalOrchestrator,
    llm: Arc<dyn LlmProvider>,
    prompt: Arc<dyn PromptTemplate>,
    caches: CacheLayers,
    history: Arc<ConversationHistoryStore>,
    llm_timeout: Duration,
}

impl ChatOrchestrator {
    pub fn new(
        providers: Providers,
        caches: CacheLayers,
        history: Arc<ConversationHistoryStore>,
        config: RetrievalConfig,
    ) -> Self {
        let llm_timeout = config.provider_timeout;
        let retrieval = RetrievalOrchestrator::new(
            providers.embeddings,
            providers.search,
            Arc::clone(&caches.embedding),
            Arc::clone(&caches.search_context),
            config,
        );

        Self {
            retrieval,
            llm: providers.llm,
            prompt: providers.prompt,
            caches,
            history,
            llm_timeout,
        }
    }

    /// Reply to `message` from `username`
    ///
    /// A cached reply skips retrieval and the model, but both messages are
    /// still recorded in the user's history. Retrieval problems degrade the
    /// context; a model failure fails the turn and caches nothing.
    #[instrument(skip(self, message))]
    pub async fn respond(&self, message: &str, username: &str) -> Result<String, ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::InvalidInput("message must not be empty".into()));
        }
        if username.trim().is_empty() {
            return Err(ChatError::InvalidInput("username must not be empty".into()));
        }

        if let Some(reply) = self.caches.response.get_response(message) {
            debug!("Reply served from response cache");
            self.history.add_message(username, Role::User, message);
            self.history
                .add_message(username, Role::Assistant, reply.as_str());
            return Ok(reply);
        }

        self.history.add_message(username, Role::User, message);
        let history = self.history.get_formatted_history(username);

        let context = self.retrieval.retrieve(message).await?;
        let system_prompt = self.prompt.build_system_prompt(&context);
        let messages = compose_messages(system_prompt, history, message);
        debug!(messages = messages.len(), "Calling language model");

        let reply = with_timeout(
            self.llm_timeout,
            "chat completion",
            self.llm.complete(&messages),
        )
        .await
        .and_then(|reply| {
            let reply = reply.trim();
            if reply.is_empty() {
                return Err(ProviderError::InvalidResponse("empty completion".into()));
            }
            Ok(reply.to_string())
        })
        .map_err(|e| {
            error!("Language model failed: {}", e);
            ChatError::from(e)
        })?;

        self.history
            .add_message(username, Role::Assistant, reply.as_str());
        self.caches.response.put_response(message, reply.as_str());

        Ok(reply)
    }

    pub fn cache_stats(&self) -> CacheStatsReport {
        self.caches.stats()
    }

    pub fn conversation_stats(&self) -> HistoryStats {
        self.history.stats()
    }

    pub fn clear_conversation(&self, username: &str) {
        self.history.clear_conversation(username);
    }

    pub fn history(&self, username: &str) -> Vec<Message> {
        self.history.get_history(username)
    }

    pub fn caches(&self) -> &CacheLayers {
        &self.caches
    }

    pub fn history_store(&self) -> &Arc<ConversationHistoryStore> {
        &self.history
    }
}

/// System prompt, then prior turns, then the current message exactly once
fn compose_messages(
    system_prompt: String,
    mut history: Vec<ChatMessage>,
    message: &str,
) -> Vec<ChatMessage> {
    let ends_with_current = history
        .last()
        .is_some_and(|last| last.role == Role::User && last.content == message);

    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system_prompt));
    messages.append(&mut history);
    if !ends_with_current {
        messages.push(ChatMessage::user(message));
    }
    messages
}
