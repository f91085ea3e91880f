use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::chat::ChatStatus;
use crate::domain::intent::IntentId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_consistent(&self) -> bool {
        self.prompt_tokens.checked_add(self.completion_tokens) == Some(self.total_tokens)
    }
}

/// One user message and the assistant's reply, with provenance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub user_message: String,
    pub intent: Option<IntentId>,
    pub sql: Option<String>,
    pub answer: String,
    pub usage: TokenUsage,
    pub latency_ms: u64,
    pub status: ChatStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    pub turns: Vec<Turn>,
    pub context: Map<String, Value>,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        let now = Utc::now();
        Self { id, created_at: now, last_active_at: now, turns: Vec::new(), context: Map::new() }
    }

    pub fn push_turn(&mut self, turn: Turn) {
        if turn.created_at > self.last_active_at {
            self.last_active_at = turn.created_at;
        }
        self.turns.push(turn);
    }

    /// Later keys overwrite earlier ones.
    pub fn merge_context(&mut self, context: Map<String, Value>) {
        for (key, value) in context {
            self.context.insert(key, value);
        }
        self.last_active_at = Utc::now();
    }

    /// The last `limit` turns, oldest first.
    pub fn recent_turns(&self, limit: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(limit);
        &self.turns[start..]
    }
}
