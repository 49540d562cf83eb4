//! UI-agnostic conversation state
//!
//! The transcript a front end shows and the context sent to the completion
//! endpoint are the same ordered list, so this module only ever appends.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A chat message in the conversation
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

/// A prompt that is empty once whitespace is trimmed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("prompt is empty")]
pub struct EmptyInputError;

/// Ordered message history for one session
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user turn. The text is stored as typed, not trimmed.
    pub fn append_user(&mut self, text: &str) -> Result<ChatMessage, EmptyInputError> {
        if text.trim().is_empty() {
            return Err(EmptyInputError);
        }

        let message = ChatMessage::user(text);
        self.messages.push(message.clone());
        Ok(message)
    }

    /// Append an assistant turn holding already-compiled markup.
    pub fn append_assistant(&mut self, compiled: impl Into<String>) -> ChatMessage {
        let message = ChatMessage::assistant(compiled);
        self.messages.push(message.clone());
        message
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Pending flag and latest failure of the exchange in flight
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestState {
    pub pending: bool,
    pub last_error: Option<String>,
}
