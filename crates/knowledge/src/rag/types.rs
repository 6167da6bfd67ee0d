//! Answer and conversation types.

use crate::types::SearchHit;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether an answer came from the model or from the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Generated from retrieved context
    Grounded,
    /// Nothing was retrieved; the fallback message was returned
    Ungrounded,
}

/// Result of answering one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Completion text, or the fallback message verbatim
    pub text: String,

    pub outcome: Outcome,

    /// Hits used as context, nearest first
    pub retrieved: Vec<SearchHit>,

    /// Search failure that was degraded to an empty retrieval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_error: Option<String>,
}

impl Answer {
    pub fn is_grounded(&self) -> bool {
        self.outcome == Outcome::Grounded
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let speaker = match self.role {
            Role::User => "You",
            Role::Assistant => "Assistant",
        };
        write!(f, "{}: {}", speaker, self.text)
    }
}

/// Caller-owned transcript of a conversation.
///
/// The answerer never reads or stores it; questions are answered
/// independently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationLog {
    turns: Vec<Turn>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a conversation with the assistant's greeting.
    pub fn with_greeting(initial_message: impl Into<String>) -> Self {
        let mut log = Self::new();
        log.push_assistant(initial_message);
        log
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.turns.push(Turn {
            role: Role::User,
            text: text.into(),
        });
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.turns.push(Turn {
            role: Role::Assistant,
            text: text.into(),
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
