use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntentId(pub String);

impl fmt::Display for IntentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One catalog entry: a set of case-insensitive patterns bound to a canonical SQL statement.
///
/// `sql` is the template with its placeholders already resolved against the static
/// defaults, so matching never touches the template text again.
#[derive(Clone, Debug)]
pub struct IntentRule {
    pub id: IntentId,
    pub patterns: Vec<Regex>,
    pub sql_template: String,
    pub sql: String,
    pub description: String,
    pub answer_template: String,
}

impl IntentRule {
    /// Patterns are matched against already-normalized (lowercased) text.
    pub fn matches(&self, normalized_text: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(normalized_text))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IntentMatch {
    pub intent: IntentId,
    pub sql: String,
    pub description: String,
    pub answer_template: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum MatchResult {
    Matched(IntentMatch),
    NoMatch,
}

impl MatchResult {
    pub fn as_match(&self) -> Option<&IntentMatch> {
        match self {
            Self::Matched(intent_match) => Some(intent_match),
            Self::NoMatch => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matched(_))
    }

    pub fn intent_id(&self) -> Option<&IntentId> {
        self.as_match().map(|intent_match| &intent_match.intent)
    }
}
