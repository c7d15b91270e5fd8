//! Process-local stores.
//!
//! Backs `storage.backend = "memory"` and tests. Nothing survives a restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relay_application::ports::store::{ConversationStore, StoreError, ToolCatalogStore, TraceStore};
use relay_domain::{Conversation, ConversationId, Message, Span, TenantId, ToolDefinition, TraceId};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

#[derive(Default)]
pub struct MemoryStore {
    tools: RwLock<Vec<ToolDefinition>>,
    spans: RwLock<Vec<Span>>,
    conversations: RwLock<HashMap<ConversationId, Conversation>>,
    messages: RwLock<HashMap<ConversationId, Vec<Message>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tool catalog.
    pub fn with_tools(self, tools: Vec<ToolDefinition>) -> Self {
        *self.tools.write().unwrap_or_else(PoisonError::into_inner) = tools;
        self
    }
}

#[async_trait]
impl ToolCatalogStore for MemoryStore {
    async fn active_tools(&self) -> Result<Vec<ToolDefinition>, StoreError> {
        Ok(self
            .tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|t| t.is_offered())
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TraceStore for MemoryStore {
    async fn append(&self, span: &Span) -> Result<(), StoreError> {
        self.spans
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(span.clone());
        Ok(())
    }

    async fn by_trace(&self, trace_id: &TraceId) -> Result<Vec<Span>, StoreError> {
        Ok(self
            .spans
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| &s.trace_id == trace_id)
            .cloned()
            .collect())
    }

    async fn in_window(
        &self,
        tenant: &TenantId,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Span>, StoreError> {
        Ok(self
            .spans
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| &s.tenant_id == tenant && s.created_at >= since && s.created_at <= until)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn create(&self, conversation: &Conversation) -> Result<(), StoreError> {
        self.conversations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(conversation.id.clone())
            .or_insert_with(|| conversation.clone());
        Ok(())
    }

    async fn get(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError> {
        Ok(self
            .conversations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned())
    }

    async fn append_message(
        &self,
        conversation_id: &ConversationId,
        message: &Message,
    ) -> Result<(), StoreError> {
        self.messages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(conversation_id.clone())
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn messages(&self, conversation_id: &ConversationId) -> Result<Vec<Message>, StoreError> {
        Ok(self
            .messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(conversation_id)
            .cloned()
            .unwrap_or_default())
    }
}
