//! Conversation entities

use crate::core::error::DomainError;
use crate::core::ids::{AgentId, ConversationId, TenantId};
use crate::session::response::ContentBlock;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(DomainError::UnknownRole(other.to_string())),
        }
    }
}

/// A conversation between one tenant's user and one agent.
///
/// Messages are stored separately and are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub tenant_id: TenantId,
    pub agent_id: AgentId,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn start(tenant_id: TenantId, agent_id: AgentId) -> Self {
        Self {
            id: ConversationId::generate(),
            tenant_id,
            agent_id,
            created_at: Utc::now(),
        }
    }
}

/// A persisted conversation message (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
    /// Distinct tool names used while producing this message
    #[serde(default)]
    pub tools_used: Vec<String>,
    #[serde(default)]
    pub token_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::text(text)],
            tools_used: Vec::new(),
            token_count: 0,
            created_at: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>, tools_used: Vec<String>, token_count: u32) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentBlock::text(text)],
            tools_used,
            token_count,
            created_at: Utc::now(),
        }
    }

    /// Concatenated text of all text blocks.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentBlock::as_text)
            .collect::<Vec<_>>()
            .join("")
    }
}

/// A prior turn supplied by the caller instead of a stored conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

/// One entry of the message list sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMessage {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl ModelMessage {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::text(text)],
        }
    }

    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content,
        }
    }

    /// The batched tool results that answer one assistant turn.
    pub fn tool_results(results: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::User,
            content: results,
        }
    }
}

impl From<&ModelMessage> for Message {
    fn from(message: &ModelMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
            tools_used: Vec::new(),
            token_count: 0,
            created_at: Utc::now(),
        }
    }
}

impl From<&Message> for ModelMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

impl From<&HistoryEntry> for ModelMessage {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            role: entry.role,
            content: vec![ContentBlock::text(entry.content.clone())],
        }
    }
}

/// Build the model message list from prior history and the new user text.
///
/// Empty entries are dropped and adjacent entries with the same role are
/// merged, since model APIs require strictly alternating roles.
pub fn seed_messages(history: &[ModelMessage], user_text: &str) -> Vec<ModelMessage> {
    let mut messages: Vec<ModelMessage> = Vec::with_capacity(history.len() + 1);
    let entries = history
        .iter()
        .cloned()
        .chain(std::iter::once(ModelMessage::user_text(user_text)));

    for entry in entries {
        let has_content = entry.content.iter().any(|block| match block {
            ContentBlock::Text { text } => !text.trim().is_empty(),
            _ => true,
        });
        if !has_content {
            continue;
        }
        match messages.last_mut() {
            Some(last) if last.role == entry.role => last.content.extend(entry.content),
            _ => messages.push(entry),
        }
    }

    // leading assistant turns have nothing to answer
    while messages
        .first()
        .is_some_and(|m| m.role == Role::Assistant)
    {
        messages.remove(0);
    }
    messages
}
