use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::{Mutex, RwLock};

use crate::domain::session::{Session, SessionId, Turn};
use crate::errors::SessionStoreError;

use super::SessionStore;

/// Process-lifetime session map. Contents are lost on restart.
///
/// The outer map lock is only held long enough to find or insert a session
/// handle; each session then has its own mutex, so appends to one session are
/// serialized without blocking others.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    async fn handle(&self, id: &SessionId) -> Arc<Mutex<Session>> {
        if let Some(existing) = self.sessions.read().await.get(&id.0) {
            return Arc::clone(existing);
        }

        let mut sessions = self.sessions.write().await;
        Arc::clone(
            sessions
                .entry(id.0.clone())
                .or_insert_with(|| Arc::new(Mutex::new(Session::new(id.clone())))),
        )
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, id: &SessionId) -> Result<Session, SessionStoreError> {
        let handle = self.handle(id).await;
        let session = handle.lock().await;
        Ok(session.clone())
    }

    async fn append(&self, id: &SessionId, turn: Turn) -> Result<(), SessionStoreError> {
        let handle = self.handle(id).await;
        handle.lock().await.push_turn(turn);
        Ok(())
    }

    async fn merge_context(
        &self,
        id: &SessionId,
        context: Map<String, Value>,
    ) -> Result<(), SessionStoreError> {
        let handle = self.handle(id).await;
        handle.lock().await.merge_context(context);
        Ok(())
    }

    async fn find(&self, id: &SessionId) -> Result<Option<Session>, SessionStoreError> {
        let handle = self.sessions.read().await.get(&id.0).cloned();
        match handle {
            Some(handle) => Ok(Some(handle.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn clear(&self, id: &SessionId) -> Result<bool, SessionStoreError> {
        Ok(self.sessions.write().await.remove(&id.0).is_some())
    }
}
