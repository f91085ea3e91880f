use std::time::Instant;

use chrono::Utc;
use invchat_core::{
    ChatError, ChatResponse, ChatStatus, MatchResult, SessionId, SessionStore, TokenUsage, Turn,
};
use tracing::warn;

use crate::llm::CompletionResult;

pub const NO_MATCH_SQL: &str = "-- No matching SQL query pattern found for this question";
pub const FALLBACK_ANSWER: &str = "I'll help you with that inventory question.";
pub const ERROR_ANSWER_PREFIX: &str = "Error processing request";

/// Wall-clock start of a chat request.
#[derive(Clone, Copy, Debug)]
pub struct Timings {
    started_at: Instant,
}

impl Timings {
    pub fn start() -> Self {
        Self { started_at: Instant::now() }
    }

    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Turns matcher and model output into the wire response and records the turn.
#[derive(Clone, Debug)]
pub struct ResponseAssembler {
    provider: String,
    model: String,
}

impl ResponseAssembler {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self { provider: provider.into(), model: model.into() }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Builds the response, appends the turn, and never fails: any problem on
    /// the way becomes a status `error` response.
    pub async fn assemble(
        &self,
        store: &dyn SessionStore,
        session_id: &SessionId,
        user_message: &str,
        match_result: &MatchResult,
        completion: &CompletionResult,
        timings: &Timings,
    ) -> ChatResponse {
        let response = match self.build(match_result, completion, timings.elapsed_ms()) {
            Ok(response) => response,
            Err(error) => {
                warn!(
                    event_name = "chat.response.assembly_failed",
                    session_id = %session_id,
                    error = %error,
                    "response assembly failed"
                );
                self.error_response(match_result, &error, timings.elapsed_ms())
            }
        };

        let turn = turn_from(user_message, match_result, &response);
        match store.append(session_id, turn).await {
            Ok(()) => response,
            Err(error) => {
                let error = ChatError::from(error);
                warn!(
                    event_name = "chat.session.append_failed",
                    session_id = %session_id,
                    error = %error,
                    "turn could not be recorded"
                );
                self.error_response(match_result, &error, timings.elapsed_ms())
            }
        }
    }

    pub fn build(
        &self,
        match_result: &MatchResult,
        completion: &CompletionResult,
        latency_ms: u64,
    ) -> Result<ChatResponse, ChatError> {
        if let Some(error) = completion.error() {
            return Ok(self.error_response(match_result, &ChatError::from(error.clone()), latency_ms));
        }

        if !completion.usage.is_consistent() {
            return Err(ChatError::Assembly(format!(
                "token usage is inconsistent: {} + {} != {}",
                completion.usage.prompt_tokens,
                completion.usage.completion_tokens,
                completion.usage.total_tokens
            )));
        }

        let answer = if completion.answer.trim().is_empty() {
            FALLBACK_ANSWER.to_string()
        } else {
            completion.answer.clone()
        };

        Ok(ChatResponse {
            natural_language_answer: answer,
            sql_query: sql_for(match_result),
            token_usage: completion.usage,
            latency_ms,
            provider: self.provider.clone(),
            model: self.model.clone(),
            status: ChatStatus::Ok,
        })
    }

    /// Matching never depends on provider health, so the SQL still reflects the match.
    pub fn error_response(
        &self,
        match_result: &MatchResult,
        error: &ChatError,
        latency_ms: u64,
    ) -> ChatResponse {
        ChatResponse {
            natural_language_answer: format!("{ERROR_ANSWER_PREFIX}: {}", error.user_message()),
            sql_query: sql_for(match_result),
            token_usage: TokenUsage::zero(),
            latency_ms,
            provider: self.provider.clone(),
            model: self.model.clone(),
            status: ChatStatus::Error,
        }
    }
}

fn sql_for(match_result: &MatchResult) -> String {
    match match_result {
        MatchResult::Matched(intent_match) => intent_match.sql.clone(),
        MatchResult::NoMatch => NO_MATCH_SQL.to_string(),
    }
}

fn turn_from(user_message: &str, match_result: &MatchResult, response: &ChatResponse) -> Turn {
    let intent_match = match_result.as_match();
    Turn {
        user_message: user_message.to_string(),
        intent: intent_match.map(|found| found.intent.clone()),
        sql: intent_match.map(|found| found.sql.clone()),
        answer: response.natural_language_answer.clone(),
        usage: response.token_usage,
        latency_ms: response.latency_ms,
        status: response.status,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use invchat_core::{
        ChatStatus, InMemorySessionStore, IntentCatalog, IntentMatcher, MatchResult, ProviderError,
        Session, SessionId, SessionStore, SessionStoreError, TokenUsage, Turn,
    };
    use serde_json::{Map, Value};

    use super::{ResponseAssembler, Timings, FALLBACK_ANSWER, NO_MATCH_SQL};
    use crate::llm::CompletionResult;

    struct FailingStore;

    #[async_trait]
    impl SessionStore for FailingStore {
        async fn get_or_create(&self, _id: &SessionId) -> Result<Session, SessionStoreError> {
            Err(SessionStoreError::Unavailable("offline".to_string()))
        }

        async fn append(&self, _id: &SessionId, _turn: Turn) -> Result<(), SessionStoreError> {
            Err(SessionStoreError::Unavailable("offline".to_string()))
        }

        async fn merge_context(
            &self,
            _id: &SessionId,
            _context: Map<String, Value>,
        ) -> Result<(), SessionStoreError> {
            Err(SessionStoreError::Unavailable("offline".to_string()))
        }

        async fn find(&self, _id: &SessionId) -> Result<Option<Session>, SessionStoreError> {
            Ok(None)
        }

        async fn clear(&self, _id: &SessionId) -> Result<bool, SessionStoreError> {
            Ok(false)
        }
    }

    fn assembler() -> ResponseAssembler {
        ResponseAssembler::new("openai", "gpt-3.5-turbo")
    }

    fn vendors_match() -> MatchResult {
        IntentMatcher::new(Arc::new(IntentCatalog::builtin().expect("builtin catalog")))
            .match_text("List all vendors")
    }

    #[test]
    fn successful_completion_becomes_ok_response() {
        let match_result = vendors_match();
        let completion = CompletionResult::success("Here are your vendors.", TokenUsage::new(20, 5), 80);

        let response = assembler().build(&match_result, &completion, 95).expect("build");

        assert_eq!(response.status, ChatStatus::Ok);
        assert_eq!(response.natural_language_answer, "Here are your vendors.");
        assert_eq!(response.sql_query, match_result.as_match().expect("match").sql);
        assert_eq!(response.token_usage.total_tokens, 25);
        assert_eq!(response.latency_ms, 95);
        assert_eq!(response.provider, "openai");
        assert_eq!(response.model, "gpt-3.5-turbo");
    }

    #[test]
    fn unmatched_response_uses_sentinel_sql() {
        let completion = CompletionResult::success("General answer.", TokenUsage::new(10, 3), 10);
        let response = assembler().build(&MatchResult::NoMatch, &completion, 12).expect("build");

        assert!(response.sql_query.starts_with(NO_MATCH_SQL));
        assert_eq!(response.status, ChatStatus::Ok);
    }

    #[test]
    fn empty_model_answer_falls_back_to_placeholder() {
        let completion = CompletionResult::success("   ", TokenUsage::new(10, 0), 10);
        let response = assembler().build(&MatchResult::NoMatch, &completion, 12).expect("build");

        assert_eq!(response.natural_language_answer, FALLBACK_ANSWER);
    }

    #[test]
    fn provider_failure_keeps_matched_sql_and_zeroes_usage() {
        let match_result = vendors_match();
        let completion = CompletionResult::failed(
            ProviderError::Status { status: 503, body: "overloaded".to_string() },
            40,
        );

        let response = assembler().build(&match_result, &completion, 41).expect("build");

        assert_eq!(response.status, ChatStatus::Error);
        assert_eq!(response.sql_query, match_result.as_match().expect("match").sql);
        assert_eq!(response.token_usage, TokenUsage::zero());
        assert_eq!(
            response.token_usage.total_tokens,
            response.token_usage.prompt_tokens + response.token_usage.completion_tokens
        );
        assert!(response.natural_language_answer.starts_with("Error processing request"));
        assert!(!response.natural_language_answer.contains("overloaded"));
    }

    #[test]
    fn inconsistent_usage_is_an_assembly_error() {
        let completion = CompletionResult::success(
            "answer",
            TokenUsage { prompt_tokens: 1, completion_tokens: 1, total_tokens: 9 },
            5,
        );
        assert!(assembler().build(&MatchResult::NoMatch, &completion, 5).is_err());
    }

    #[tokio::test]
    async fn assemble_records_turn_with_provenance() {
        let store = InMemorySessionStore::new();
        let session_id = SessionId("s-1".to_string());
        let match_result = vendors_match();
        let completion = CompletionResult::success("Vendors listed.", TokenUsage::new(9, 4), 30);

        let response = assembler()
            .assemble(&store, &session_id, "List all vendors", &match_result, &completion, &Timings::start())
            .await;

        let session = store.get_or_create(&session_id).await.expect("session");
        assert_eq!(session.turns.len(), 1);
        let turn = &session.turns[0];
        assert_eq!(turn.user_message, "List all vendors");
        assert_eq!(turn.intent.as_ref().map(|id| id.0.as_str()), Some("list_vendors"));
        assert_eq!(turn.sql.as_deref(), Some(response.sql_query.as_str()));
        assert_eq!(turn.answer, "Vendors listed.");
        assert!(turn.usage.is_consistent());
        assert_eq!(turn.status, ChatStatus::Ok);
    }

    #[tokio::test]
    async fn inconsistent_usage_is_recorded_as_failed_turn() {
        let store = InMemorySessionStore::new();
        let session_id = SessionId("s-2".to_string());
        let completion = CompletionResult::success(
            "answer",
            TokenUsage { prompt_tokens: 2, completion_tokens: 2, total_tokens: 7 },
            5,
        );

        let response = assembler()
            .assemble(&store, &session_id, "hi", &MatchResult::NoMatch, &completion, &Timings::start())
            .await;

        assert_eq!(response.status, ChatStatus::Error);
        let session = store.get_or_create(&session_id).await.expect("session");
        assert_eq!(session.turns[0].usage, TokenUsage::zero());
        assert_eq!(session.turns[0].sql, None);
    }

    #[tokio::test]
    async fn store_failure_becomes_error_response() {
        let completion = CompletionResult::success("fine", TokenUsage::new(1, 1), 5);
        let response = assembler()
            .assemble(
                &FailingStore,
                &SessionId("s".to_string()),
                "List all vendors",
                &vendors_match(),
                &completion,
                &Timings::start(),
            )
            .await;

        assert_eq!(response.status, ChatStatus::Error);
        assert_eq!(response.token_usage, TokenUsage::zero());
        assert!(response.natural_language_answer.contains("Conversation history"));
        assert!(response.sql_query.starts_with("SELECT VendorCode"));
    }
}
