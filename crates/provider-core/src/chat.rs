//! Request types for completion calls.

use serde::{Deserialize, Serialize};

/// Role of a single turn in the conversation context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A message from the conversation counterpart.
    User,
    /// A message sent by the account itself.
    Assistant,
}

impl Role {
    /// Wire name used by both provider backends.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single turn of conversation context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

impl ChatTurn {
    /// Create a user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Create an assistant turn.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// A completion request: bounded conversation context plus generation knobs.
///
/// The final turn is the message being replied to; earlier turns are the
/// most recent history in chronological order.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// System prompt, if the backend supports one.
    pub system_prompt: Option<String>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Conversation turns, oldest first.
    pub turns: Vec<ChatTurn>,
}

impl CompletionRequest {
    /// Create a request with just a single user turn.
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            turns: vec![ChatTurn::user(prompt)],
            ..Default::default()
        }
    }

    /// The prompt to answer: the text of the last user turn, if any.
    pub fn prompt(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == Role::User)
            .map(|t| t.text.as_str())
    }

    /// Turns preceding the final one (the history sent to backends that
    /// take prompt and history separately).
    pub fn history(&self) -> &[ChatTurn] {
        match self.turns.len() {
            0 => &[],
            n => &self.turns[..n - 1],
        }
    }
}
