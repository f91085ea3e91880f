use std::sync::Arc;

use crate::domain::intent::{IntentMatch, MatchResult};
use crate::intents::catalog::IntentCatalog;

/// First-match-wins evaluation of the intent catalog.
///
/// Matching depends only on the text and the catalog; conversation state never
/// influences which SQL is selected.
#[derive(Clone, Debug)]
pub struct IntentMatcher {
    catalog: Arc<IntentCatalog>,
}

impl IntentMatcher {
    pub fn new(catalog: Arc<IntentCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &IntentCatalog {
        &self.catalog
    }

    pub fn match_text(&self, text: &str) -> MatchResult {
        let normalized = normalize_text(text);
        if normalized.is_empty() {
            return MatchResult::NoMatch;
        }

        self.catalog
            .rules()
            .iter()
            .find(|rule| rule.matches(&normalized))
            .map(|rule| {
                MatchResult::Matched(IntentMatch {
                    intent: rule.id.clone(),
                    sql: rule.sql.clone(),
                    description: rule.description.clone(),
                    answer_template: rule.answer_template.clone(),
                })
            })
            .unwrap_or(MatchResult::NoMatch)
    }
}

/// Lowercases and collapses runs of whitespace to a single space.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().map(str::to_lowercase).collect::<Vec<_>>().join(" ")
}
