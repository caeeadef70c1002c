//! Role-tagged chat messages shared by every backend's wire format.

use serde::{Deserialize, Serialize};

/// The role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    /// Only seen in responses; requests built by this crate carry system and
    /// user messages.
    Assistant,
}

/// A single message in a completion request or response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Builds the message sequence for one request: system messages first,
    /// user messages after, each in their given order.
    pub fn thread(system: &[String], user: &[String]) -> Vec<Message> {
        system
            .iter()
            .map(Message::system)
            .chain(user.iter().map(Message::user))
            .collect()
    }
}
