//! Persistence ports
//!
//! Storage is opaque to the engine: one trait per concern, each backed by
//! whatever adapter the binary wires in (SQLite, in-memory, ...).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relay_domain::{
    AgentConfig, AgentId, Conversation, ConversationId, Message, Span, TenantId, ToolDefinition,
    TraceId,
};
use thiserror::Error;

/// Errors raised by storage adapters
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Read access to the tool catalog.
#[async_trait]
pub trait ToolCatalogStore: Send + Sync {
    /// Rows that are active and not code-only.
    async fn active_tools(&self) -> Result<Vec<ToolDefinition>, StoreError>;
}

/// Append/query access to spans.
#[async_trait]
pub trait TraceStore: Send + Sync {
    async fn append(&self, span: &Span) -> Result<(), StoreError>;

    /// Every span of one trace, in storage order.
    async fn by_trace(&self, trace_id: &TraceId) -> Result<Vec<Span>, StoreError>;

    /// Spans of `tenant` created in `[since, until]`.
    async fn in_window(
        &self,
        tenant: &TenantId,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Span>, StoreError>;
}

/// Conversations and their append-only messages.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn create(&self, conversation: &Conversation) -> Result<(), StoreError>;

    async fn get(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError>;

    async fn append_message(
        &self,
        conversation_id: &ConversationId,
        message: &Message,
    ) -> Result<(), StoreError>;

    /// Messages in append order.
    async fn messages(&self, conversation_id: &ConversationId) -> Result<Vec<Message>, StoreError>;
}

/// Agent configurations.
#[async_trait]
pub trait AgentStore: Send + Sync {
    async fn get(&self, id: &AgentId) -> Result<Option<AgentConfig>, StoreError>;
}
