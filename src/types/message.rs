use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::time;

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person typing.
    User,
    /// The model.
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One entry of the conversation history.
///
/// Messages are immutable once they are appended to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
    timestamp: String,
}

impl Message {
    /// Creates a message with an explicit wall-clock timestamp.
    pub fn new(role: Role, content: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: timestamp.into(),
        }
    }

    /// Creates a user message stamped with the current time.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content, time::clock_now())
    }

    /// Creates an assistant message stamped with the current time.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content, time::clock_now())
    }

    /// The author of the message.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The message text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// `HH:MM:SS` wall-clock time at which the message was created.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }
}
