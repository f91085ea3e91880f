use std::sync::Arc;

use invchat_core::{
    ChatError, ChatRequest, ChatResponse, IntentMatcher, MatchResult, Session, SessionId,
    SessionStore,
};
use serde_json::{Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::assembler::{ResponseAssembler, Timings};
use crate::llm::LlmClient;
use crate::prompt::PromptBuilder;

/// Runs one chat request: load session, match, build prompt, call the model,
/// assemble, record the turn.
pub struct ChatRuntime {
    matcher: IntentMatcher,
    store: Arc<dyn SessionStore>,
    llm: Arc<dyn LlmClient>,
    prompts: PromptBuilder,
    assembler: ResponseAssembler,
}

impl ChatRuntime {
    pub fn new(
        matcher: IntentMatcher,
        store: Arc<dyn SessionStore>,
        llm: Arc<dyn LlmClient>,
        prompts: PromptBuilder,
        model: impl Into<String>,
    ) -> Self {
        let assembler = ResponseAssembler::new(llm.provider().to_string(), model);
        Self { matcher, store, llm, prompts, assembler }
    }

    pub fn model(&self) -> &str {
        self.assembler.model()
    }

    pub fn provider(&self) -> &str {
        self.assembler.provider()
    }

    pub fn matcher(&self) -> &IntentMatcher {
        &self.matcher
    }

    pub async fn process_message(&self, request: ChatRequest) -> ChatResponse {
        let timings = Timings::start();
        let correlation_id = Uuid::new_v4().to_string();
        let session_id = SessionId(request.session_id);

        info!(
            event_name = "chat.request.received",
            correlation_id = %correlation_id,
            session_id = %session_id,
            message_chars = request.message.chars().count(),
            "chat request received"
        );

        let match_result = self.matcher.match_text(&request.message);
        match &match_result {
            MatchResult::Matched(found) => info!(
                event_name = "chat.intent.matched",
                correlation_id = %correlation_id,
                session_id = %session_id,
                intent = %found.intent,
                "intent matched"
            ),
            MatchResult::NoMatch => info!(
                event_name = "chat.intent.unmatched",
                correlation_id = %correlation_id,
                session_id = %session_id,
                "no intent matched"
            ),
        }

        let outcome = self
            .respond(&session_id, &request.message, request.context, &match_result, &timings)
            .await;

        let response = match outcome {
            Ok(response) => response,
            Err(error) => {
                warn!(
                    event_name = "chat.request.failed",
                    correlation_id = %correlation_id,
                    session_id = %session_id,
                    error = %error,
                    "chat request failed before assembly"
                );
                self.assembler.error_response(&match_result, &error, timings.elapsed_ms())
            }
        };

        info!(
            event_name = "chat.response.assembled",
            correlation_id = %correlation_id,
            session_id = %session_id,
            status = ?response.status,
            latency_ms = response.latency_ms,
            total_tokens = response.token_usage.total_tokens,
            "chat response assembled"
        );

        response
    }

    async fn respond(
        &self,
        session_id: &SessionId,
        message: &str,
        context: Option<Map<String, Value>>,
        match_result: &MatchResult,
        timings: &Timings,
    ) -> Result<ChatResponse, ChatError> {
        if let Some(context) = context.filter(|context| !context.is_empty()) {
            self.store.merge_context(session_id, context).await?;
        }

        let session = self.store.get_or_create(session_id).await?;
        let messages = self.prompts.build(&session, message, match_result);
        let completion = self.llm.complete(&messages, self.assembler.model()).await;

        if let Some(error) = completion.error() {
            warn!(
                event_name = "chat.provider.failed",
                session_id = %session_id,
                provider = self.llm.provider(),
                latency_ms = completion.latency_ms,
                error = %error,
                "completion request failed"
            );
        }

        Ok(self
            .assembler
            .assemble(self.store.as_ref(), session_id, message, match_result, &completion, timings)
            .await)
    }

    pub async fn session(&self, session_id: &SessionId) -> Result<Option<Session>, ChatError> {
        Ok(self.store.find(session_id).await?)
    }

    pub async fn clear_session(&self, session_id: &SessionId) -> Result<bool, ChatError> {
        let cleared = self.store.clear(session_id).await?;
        info!(
            event_name = "chat.session.cleared",
            session_id = %session_id,
            cleared,
            "session reset requested"
        );
        Ok(cleared)
    }
}
