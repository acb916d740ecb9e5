//! Chat message domain types.
//!
//! These are the value objects that flow through the chat pipeline:
//! user submits a question → assistant answers → optional confirmation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The gardener
    User,
    /// The plant assistant (answers, fallbacks, and confirmations)
    #[serde(alias = "bot")]
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in the conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub text: String,

    /// When the message was created
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a message stamped with the current time.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self::at(role, text, Utc::now())
    }

    /// Create a message with an explicit timestamp.
    pub fn at(role: Role, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: format!("{}-{}", role.as_str(), Uuid::new_v4()),
            role,
            text: text.into(),
            timestamp,
        }
    }

    /// Create a new user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }
}

/// Retention policy for the chat history.
///
/// `0` (or any non-positive value) means "unbounded", which still resolves
/// to [`HistoryLimit::HARD_CAP`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryLimit(pub i64);

impl HistoryLimit {
    /// Limit applied when the user never chose one.
    pub const DEFAULT: usize = 5;

    /// Ceiling applied to every limit, including "unbounded".
    pub const HARD_CAP: usize = 200;

    /// Resolve an optional requested limit into a concrete message count.
    pub fn resolve(requested: Option<HistoryLimit>) -> usize {
        match requested {
            None => Self::DEFAULT,
            Some(HistoryLimit(n)) if n <= 0 => Self::HARD_CAP,
            Some(HistoryLimit(n)) => (n as u64).min(Self::HARD_CAP as u64) as usize,
        }
    }

    /// Whether this limit means "keep as much as the hard cap allows".
    pub fn is_unbounded(&self) -> bool {
        self.0 <= 0
    }
}

impl std::fmt::Display for HistoryLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_unbounded() {
            write!(f, "unbounded (cap {})", Self::HARD_CAP)
        } else {
            write!(f, "{}", self.0)
        }
    }
}
