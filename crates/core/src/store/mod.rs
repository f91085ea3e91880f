use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::session::{Session, SessionId, Turn};
use crate::errors::SessionStoreError;

pub mod memory;

pub use memory::InMemorySessionStore;

/// Conversation state keyed by caller-supplied session id.
///
/// Sessions are created lazily and never expire. Implementations must keep
/// appends to one session ordered and must not make unrelated sessions wait on
/// each other.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns a snapshot of the session, creating it on first reference.
    async fn get_or_create(&self, id: &SessionId) -> Result<Session, SessionStoreError>;

    async fn append(&self, id: &SessionId, turn: Turn) -> Result<(), SessionStoreError>;

    async fn merge_context(
        &self,
        id: &SessionId,
        context: Map<String, Value>,
    ) -> Result<(), SessionStoreError>;

    async fn find(&self, id: &SessionId) -> Result<Option<Session>, SessionStoreError>;

    /// Returns whether a session was removed.
    ///
    /// A request already in flight for the id still appends its turn after the
    /// clear, which recreates the session holding only that turn.
    async fn clear(&self, id: &SessionId) -> Result<bool, SessionStoreError>;
}
