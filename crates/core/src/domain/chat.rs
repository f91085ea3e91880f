use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::session::TokenUsage;

pub const PROVIDER_NAME: &str = "openai";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: MessageRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: MessageRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: MessageRole::Assistant, content: content.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
    #[serde(default)]
    pub context: Option<Map<String, Value>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatStatus {
    Ok,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub natural_language_answer: String,
    pub sql_query: String,
    pub token_usage: TokenUsage,
    pub latency_ms: u64,
    pub provider: String,
    pub model: String,
    pub status: ChatStatus,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::domain::chat::{ChatMessage, ChatRequest, ChatResponse, ChatStatus};
    use crate::domain::session::TokenUsage;

    #[test]
    fn request_context_is_optional() {
        let request: ChatRequest =
            serde_json::from_value(json!({"session_id": "s-1", "message": "hi"}))
                .expect("request without context should decode");

        assert_eq!(request.session_id, "s-1");
        assert!(request.context.is_none());
    }

    #[test]
    fn response_serializes_with_wire_field_names() {
        let response = ChatResponse {
            natural_language_answer: "You have assets.".to_string(),
            sql_query: "SELECT 1;".to_string(),
            token_usage: TokenUsage::new(10, 4),
            latency_ms: 120,
            provider: "openai".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            status: ChatStatus::Ok,
        };

        let value = serde_json::to_value(&response).expect("serialize response");
        assert_eq!(value["status"], "ok");
        assert_eq!(value["token_usage"]["total_tokens"], 14);
        assert_eq!(value["latency_ms"], 120);
    }

    #[test]
    fn messages_serialize_lowercase_roles() {
        let value = serde_json::to_value(ChatMessage::assistant("done")).expect("serialize");
        assert_eq!(value, json!({"role": "assistant", "content": "done"}));
    }
}
