//! Per-user conversation history with a sliding window and idle expiry
//!
//! Each username maps to at most `max_messages` messages. A conversation
//! that has been idle for the TTL is gone: reads evict it on the spot and the
//! [`HistorySweeper`](crate::history::HistorySweeper) removes the ones
//! nobody reads again.

use crate::error::Result;
use crate::history::{
    config::HistoryConfig,
    types::{ChatMessage, ConversationRecord, HistoryStats, Message, Role},
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::time::Instant;
use tracing::{debug, info};

/// In-memory conversation store keyed by authenticated username
pub struct ConversationHistoryStore {
    config: HistoryConfig,
    conversations: Mutex<HashMap<String, ConversationRecord>>,
}

impl ConversationHistoryStore {
    pub fn new(config: HistoryConfig) -> Self {
        info!(
            max_messages = config.max_messages,
            ttl_secs = config.ttl.as_secs(),
            sweep_secs = config.sweep_interval.as_secs(),
            "Initializing conversation history store"
        );

        Self {
            config,
            conversations: Mutex::new(HashMap::new()),
        }
    }

    /// Create a store after validating its configuration
    pub fn try_new(config: HistoryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Append a message, creating the conversation if needed.
    ///
    /// A conversation idle past the TTL is discarded even if no sweep has
    /// run yet, so a late message starts a fresh window.
    pub fn add_message(&self, username: &str, role: Role, content: impl Into<String>) {
        let mut conversations = self.lock();
        let max_messages = self.config.max_messages;

        if conversations
            .get(username)
            .is_some_and(|record| record.is_expired(self.config.ttl))
        {
            debug!(username, "Conversation expired, starting over");
            conversations.remove(username);
        }

        let record = conversations
            .entry(username.to_string())
            .or_insert_with(ConversationRecord::new);

        record.messages.push(Message {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        });

        if record.messages.len() > max_messages {
            let overflow = record.messages.len() - max_messages;
            record.messages.drain(..overflow);
        }

        record.last_activity = Instant::now();
    }

    /// Messages for a user, oldest first; empty when absent or expired
    pub fn get_history(&self, username: &str) -> Vec<Message> {
        let mut conversations = self.lock();

        match conversations.get(username) {
            None => Vec::new(),
            Some(record) if record.is_expired(self.config.ttl) => {
                debug!(username, "Conversation expired on read");
                conversations.remove(username);
                Vec::new()
            }
            Some(record) => record.messages.clone(),
        }
    }

    /// History projected to what a language model needs
    pub fn get_formatted_history(&self, username: &str) -> Vec<ChatMessage> {
        self.get_history(username)
            .iter()
            .map(ChatMessage::from)
            .collect()
    }

    /// Drop a user's conversation
    pub fn clear_conversation(&self, username: &str) {
        if self.lock().remove(username).is_some() {
            debug!(username, "Conversation cleared");
        }
    }

    /// Remove every expired conversation, returning how many were dropped
    pub fn sweep(&self) -> usize {
        let mut conversations = self.lock();
        let before = conversations.len();
        let ttl = self.config.ttl;

        conversations.retain(|_, record| !record.is_expired(ttl));

        let removed = before - conversations.len();
        if removed > 0 {
            info!(removed, remaining = conversations.len(), "Swept idle conversations");
        }
        removed
    }

    pub fn stats(&self) -> HistoryStats {
        let conversations = self.lock();
        let ttl = self.config.ttl;

        let (active_conversations, total_messages) = conversations
            .values()
            .filter(|record| !record.is_expired(ttl))
            .fold((0, 0), |(count, messages), record| {
                (count + 1, messages + record.messages.len())
            });

        HistoryStats {
            active_conversations,
            total_messages,
            max_messages: self.config.max_messages,
            ttl_minutes: ttl.as_secs() / 60,
        }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ConversationRecord>> {
        self.conversations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ConversationHistoryStore {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl std::fmt::Debug for ConversationHistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationHistoryStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
