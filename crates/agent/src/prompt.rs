use invchat_core::{ChatMessage, ChatStatus, MatchResult, Session};
use serde_json::Value;

pub const SYSTEM_PROMPT: &str = "You are a helpful inventory management assistant. \
You help users query their inventory database which includes assets, customers, vendors, \
sites, locations, bills, purchase orders, and sales orders.

When a user asks a question about their inventory, provide a clear, concise answer. \
Explain the data in plain language and keep responses brief and to the point.";

/// Composes the message sequence sent to the model.
///
/// Order: system instruction, intent note (when matched), session context note
/// (when non-empty), the last `history_turns` turns, then the current message.
#[derive(Clone, Debug)]
pub struct PromptBuilder {
    history_turns: usize,
}

impl PromptBuilder {
    pub fn new(history_turns: usize) -> Self {
        Self { history_turns }
    }

    pub fn history_turns(&self) -> usize {
        self.history_turns
    }

    pub fn build(
        &self,
        session: &Session,
        user_message: &str,
        match_result: &MatchResult,
    ) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT)];

        if let Some(intent_match) = match_result.as_match() {
            messages.push(ChatMessage::system(format!(
                "The user's question matched the `{intent}` query ({description}).\n\
                 SQL query to be executed:\n{sql}\n\
                 Answer template hint: {hint}\n\
                 Decide whether the template is useful for the user's message and adapt it if needed. \
                 Respond with a concise, high-level answer as if the query had executed. \
                 Do not invent specific numbers unless the user provided them. \
                 If results are unknown, describe what the result set would contain (entities, counts). \
                 Do not show SQL. Keep the answer under 60 words.",
                intent = intent_match.intent,
                description = intent_match.description,
                sql = intent_match.sql,
                hint = intent_match.answer_template,
            )));
        }

        if !session.context.is_empty() {
            let rendered = session
                .context
                .iter()
                .map(|(key, value)| format!("- {key}: {}", render_value(value)))
                .collect::<Vec<_>>()
                .join("\n");
            messages.push(ChatMessage::system(format!(
                "Conversation context supplied by the client:\n{rendered}"
            )));
        }

        for turn in session.recent_turns(self.history_turns) {
            messages.push(ChatMessage::user(turn.user_message.clone()));
            // Failed turns carry an error notice rather than a model answer.
            if turn.status == ChatStatus::Ok {
                messages.push(ChatMessage::assistant(turn.answer.clone()));
            }
        }

        messages.push(ChatMessage::user(user_message));
        messages
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use invchat_core::{
        ChatStatus, IntentCatalog, IntentMatcher, MatchResult, MessageRole, Session, SessionId,
        TokenUsage, Turn,
    };
    use serde_json::json;

    use super::{PromptBuilder, SYSTEM_PROMPT};

    fn matcher() -> IntentMatcher {
        IntentMatcher::new(Arc::new(IntentCatalog::builtin().expect("builtin catalog")))
    }

    fn turn(user: &str, answer: &str, status: ChatStatus) -> Turn {
        Turn {
            user_message: user.to_string(),
            intent: None,
            sql: None,
            answer: answer.to_string(),
            usage: TokenUsage::zero(),
            latency_ms: 1,
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn unmatched_prompt_is_system_then_user() {
        let session = Session::new(SessionId("s".to_string()));
        let messages = PromptBuilder::new(5).build(&session, "asdkjhasd", &MatchResult::NoMatch);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[0].content, SYSTEM_PROMPT);
        assert_eq!(messages[1].role, MessageRole::User);
        assert_eq!(messages[1].content, "asdkjhasd");
    }

    #[test]
    fn matched_prompt_carries_sql_and_description() {
        let session = Session::new(SessionId("s".to_string()));
        let match_result = matcher().match_text("List all vendors");
        let intent = match_result.as_match().expect("vendors should match").clone();

        let messages = PromptBuilder::new(5).build(&session, "List all vendors", &match_result);

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, MessageRole::System);
        assert!(messages[1].content.contains(&intent.sql));
        assert!(messages[1].content.contains(&intent.description));
        assert!(messages[1].content.contains("list_vendors"));
        assert_eq!(messages.last().map(|message| message.content.as_str()), Some("List all vendors"));
    }

    #[test]
    fn previous_turn_is_carried_into_follow_up() {
        let mut session = Session::new(SessionId("s".to_string()));
        session.push_turn(turn("List all vendors", "Here are your active vendors.", ChatStatus::Ok));

        let follow_up = "How many of them are active?";
        let messages =
            PromptBuilder::new(5).build(&session, follow_up, &matcher().match_text(follow_up));

        assert!(messages.iter().any(|message| message.role == MessageRole::User
            && message.content == "List all vendors"));
        assert!(messages.iter().any(|message| message.role == MessageRole::Assistant
            && message.content == "Here are your active vendors."));
        assert_eq!(messages.last().map(|message| message.content.as_str()), Some(follow_up));
    }

    #[test]
    fn history_window_is_bounded() {
        let mut session = Session::new(SessionId("s".to_string()));
        for index in 0..10 {
            session.push_turn(turn(&format!("question {index}"), "answer", ChatStatus::Ok));
        }

        let messages = PromptBuilder::new(3).build(&session, "now", &MatchResult::NoMatch);

        // system + 3 * (user, assistant) + current
        assert_eq!(messages.len(), 8);
        assert!(!messages.iter().any(|message| message.content == "question 6"));
        assert!(messages.iter().any(|message| message.content == "question 7"));
    }

    #[test]
    fn failed_turns_contribute_only_the_question() {
        let mut session = Session::new(SessionId("s".to_string()));
        session.push_turn(turn("List all sites", "Error processing request", ChatStatus::Error));

        let messages = PromptBuilder::new(5).build(&session, "and vendors?", &MatchResult::NoMatch);

        assert!(messages.iter().any(|message| message.content == "List all sites"));
        assert!(!messages.iter().any(|message| message.role == MessageRole::Assistant));
    }

    #[test]
    fn session_context_is_rendered_as_system_note() {
        let mut session = Session::new(SessionId("s".to_string()));
        let mut context = serde_json::Map::new();
        context.insert("site".to_string(), json!("Austin"));
        context.insert("fiscal_year".to_string(), json!(2024));
        session.merge_context(context);

        let messages = PromptBuilder::new(5).build(&session, "hello", &MatchResult::NoMatch);

        assert_eq!(messages.len(), 3);
        assert!(messages[1].content.contains("- site: Austin"));
        assert!(messages[1].content.contains("- fiscal_year: 2024"));
    }
}
