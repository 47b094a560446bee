//! UI-agnostic conversation state types
//!
//! These types describe the whole state of a chat session and don't depend on
//! any specific UI framework. They live only in memory; nothing here is
//! persisted.

use serde::{Deserialize, Serialize};

/// Shown as the assistant's reply whenever an answer request fails.
pub const DEFAULT_FALLBACK_MESSAGE: &str = "エラーが発生しました。もう一度お試しください。";

/// A single turn in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Everything the chat screen knows about the current session.
///
/// `is_busy` is true exactly while an answer request is in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    pub messages: Vec<ChatMessage>,
    pub pending_input: String,
    pub is_busy: bool,
}

impl ConversationState {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether a key-submit right now would actually send something.
    pub fn can_submit(&self) -> bool {
        !self.is_busy && !self.pending_input.trim().is_empty()
    }
}
