//! Inventory chat core: configuration, intent catalog and matcher, conversation
//! state, and the error taxonomy shared by the agent and server crates.
//!
//! Nothing in this crate performs network I/O. Matching is a pure function of
//! the input text and the static catalog.

pub mod config;
pub mod domain;
pub mod errors;
pub mod intents;
pub mod store;

pub use domain::chat::{
    ChatMessage, ChatRequest, ChatResponse, ChatStatus, MessageRole, PROVIDER_NAME,
};
pub use domain::intent::{IntentId, IntentMatch, IntentRule, MatchResult};
pub use domain::session::{Session, SessionId, TokenUsage, Turn};
pub use errors::{ChatError, ProviderError, SessionStoreError};
pub use intents::{IntentCatalog, IntentMatcher};
pub use store::{InMemorySessionStore, SessionStore};
