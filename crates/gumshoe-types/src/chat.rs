//! Conversation keys and message log types for Gumshoe.
//!
//! A conversation is an append-only log of [`ChatMessage`]s scoped by a
//! client-supplied [`ConversationKey`]. Entries are numbered by a gapless
//! per-conversation `sequence` starting at 1.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::error::ChatError;

/// Longest accepted conversation key, in bytes.
pub const MAX_KEY_LEN: usize = 256;

/// Opaque client-supplied identifier of one conversation.
///
/// Keys are compared byte-for-byte; the same key always resolves to the same
/// log. Uniqueness across clients is the caller's responsibility.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConversationKey(String);

impl ConversationKey {
    /// Validate and wrap a raw key.
    ///
    /// Rejects empty keys, keys longer than [`MAX_KEY_LEN`] bytes, and keys
    /// containing whitespace or control characters.
    pub fn parse(raw: &str) -> Result<Self, ChatError> {
        if raw.is_empty() {
            return Err(ChatError::InvalidInput(
                "conversation key must not be empty".to_string(),
            ));
        }
        if raw.len() > MAX_KEY_LEN {
            return Err(ChatError::InvalidInput(format!(
                "conversation key exceeds {MAX_KEY_LEN} bytes"
            )));
        }
        if raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ChatError::InvalidInput(
                "conversation key must not contain whitespace or control characters".to_string(),
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ConversationKey {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ConversationKey {
    type Error = ChatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ConversationKey> for String {
    fn from(key: ConversationKey) -> Self {
        key.0
    }
}

/// Author of a conversation log entry.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (role IN ('user', 'assistant', 'narration'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    /// Scene-setting text injected by the operator, never generated.
    Narration,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
            ChatRole::Narration => write!(f, "narration"),
        }
    }
}

impl FromStr for ChatRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(ChatRole::User),
            "assistant" => Ok(ChatRole::Assistant),
            "narration" => Ok(ChatRole::Narration),
            other => Err(format!("invalid chat role: '{other}'")),
        }
    }
}

/// A single immutable entry of a conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    /// Position in the conversation, 1-based and gapless.
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
}

/// Aggregate counts across every stored conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub conversations: u64,
    pub messages: u64,
}
