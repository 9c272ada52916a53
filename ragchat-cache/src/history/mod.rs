//! Per-user conversation history
//!
//! Keeps the last `max_messages` (20) messages of each user's conversation
//! so the language model sees recent dialogue. Conversations idle for the
//! TTL (30 minutes) expire twice over: lazily when read, and proactively via
//! [`HistorySweeper`] every `sweep_interval` (10 minutes).
//!
//! ```rust
//! use ragchat_cache::history::{ConversationHistoryStore, HistoryConfig, Role};
//!
//! let store = ConversationHistoryStore::new(HistoryConfig::default());
//! store.add_message("ana", Role::User, "¿Tienen rompecabezas?");
//! store.add_message("ana", Role::Assistant, "¡Sí! Tenemos de 24 a 1000 piezas.");
//!
//! assert_eq!(store.get_formatted_history("ana").len(), 2);
//! ```

pub mod config;
pub mod store;
pub mod sweeper;
pub mod types;

pub use config::{
    HistoryConfig, DEFAULT_HISTORY_TTL, DEFAULT_MAX_MESSAGES, DEFAULT_SWEEP_INTERVAL,
};
pub use store::ConversationHistoryStore;
pub use sweeper::HistorySweeper;
pub use types::{ChatMessage, ConversationRecord, HistoryStats, Message, Role};
