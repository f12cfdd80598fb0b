//! Classification of learner replies.
//!
//! A reply either acknowledges the current explanation (advance to the next
//! chunk) or asks for clarification (stay on it). The default classifier is
//! a plain keyword match, so "yesterday" and "next week?" both count as
//! acknowledgements.

use serde::{Deserialize, Serialize};

/// What the learner meant by a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    /// Understood, move on.
    Acknowledge,
    /// Anything else: a question or a request to re-explain.
    Clarify,
}

/// Decides the intent of a learner reply.
pub trait IntentClassifier: Send + Sync {
    fn classify(&self, reply: &str) -> Intent;
}

/// Case-insensitive substring match against a fixed token list.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    tokens: Vec<String>,
}

impl KeywordClassifier {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens = tokens
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { tokens }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(["yes", "understood", "next"])
    }
}

impl IntentClassifier for KeywordClassifier {
    fn classify(&self, reply: &str) -> Intent {
        let reply = reply.to_lowercase();
        if self.tokens.iter().any(|token| reply.contains(token.as_str())) {
            Intent::Acknowledge
        } else {
            Intent::Clarify
        }
    }
}
