//! In-memory wiring for router tests.

use super::state::AppState;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relay_application::{
    AgentStore, AuthError, ConversationStore, CredentialResolver, GatewayError, LlmGateway,
    ModelRequest, RunChatUseCase, StoreError, StreamHandle, ToolCatalogStore, ToolDispatcher,
    ToolRegistry, TraceRecorder, TraceStore,
};
use relay_domain::{
    AgentConfig, AgentId, Conversation, ConversationId, Message, Principal, Span, StopReason,
    StreamEvent, TenantId, TokenUsage, ToolDefinition, TraceId,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Spans, conversations and an empty tool catalog.
#[derive(Default)]
pub struct TestBackend {
    spans: Mutex<Vec<Span>>,
    conversations: Mutex<HashMap<ConversationId, (Conversation, Vec<Message>)>>,
}

impl TestBackend {
    /// Accepted for tenant `s1` only.
    pub const TOKEN: &'static str = "good";

    pub fn push_span(&self, span: Span) {
        self.spans.lock().unwrap().push(span);
    }

    pub fn span_count(&self) -> usize {
        self.spans.lock().unwrap().len()
    }

    pub fn conversation_count(&self) -> usize {
        self.conversations.lock().unwrap().len()
    }

    pub fn seed_conversation(&self, conversation: Conversation, messages: Vec<Message>) {
        self.conversations
            .lock()
            .unwrap()
            .insert(conversation.id.clone(), (conversation, messages));
    }
}

#[async_trait]
impl TraceStore for TestBackend {
    async fn append(&self, span: &Span) -> Result<(), StoreError> {
        self.push_span(span.clone());
        Ok(())
    }

    async fn by_trace(&self, trace_id: &TraceId) -> Result<Vec<Span>, StoreError> {
        Ok(self
            .spans
            .lock()
            .unwrap()
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
            .lock()
            .unwrap()
            .iter()
            .filter(|s| &s.tenant_id == tenant && s.created_at >= since && s.created_at <= until)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ConversationStore for TestBackend {
    async fn create(&self, conversation: &Conversation) -> Result<(), StoreError> {
        self.seed_conversation(conversation.clone(), Vec::new());
        Ok(())
    }

    async fn get(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError> {
        Ok(self
            .conversations
            .lock()
            .unwrap()
            .get(id)
            .map(|(c, _)| c.clone()))
    }

    async fn append_message(
        &self,
        conversation_id: &ConversationId,
        message: &Message,
    ) -> Result<(), StoreError> {
        match self.conversations.lock().unwrap().get_mut(conversation_id) {
            Some((_, messages)) => {
                messages.push(message.clone());
                Ok(())
            }
            None => Err(StoreError::NotFound(conversation_id.to_string())),
        }
    }

    async fn messages(&self, conversation_id: &ConversationId) -> Result<Vec<Message>, StoreError> {
        Ok(self
            .conversations
            .lock()
            .unwrap()
            .get(conversation_id)
            .map(|(_, m)| m.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl ToolCatalogStore for TestBackend {
    async fn active_tools(&self) -> Result<Vec<ToolDefinition>, StoreError> {
        Ok(Vec::new())
    }
}

struct OneAgent;

#[async_trait]
impl AgentStore for OneAgent {
    async fn get(&self, id: &AgentId) -> Result<Option<AgentConfig>, StoreError> {
        Ok((id.as_str() == "helper").then(|| AgentConfig::new("helper")))
    }
}

struct OneToken;

#[async_trait]
impl CredentialResolver for OneToken {
    async fn resolve(&self, token: &str) -> Result<Principal, AuthError> {
        if token == TestBackend::TOKEN {
            Ok(Principal::new("u1", vec![TenantId::new("s1")]))
        } else {
            Err(AuthError::InvalidCredential)
        }
    }
}

/// Answers every call with a short text reply.
struct GreetingGateway;

#[async_trait]
impl LlmGateway for GreetingGateway {
    async fn stream(&self, _request: ModelRequest) -> Result<StreamHandle, GatewayError> {
        let (tx, rx) = mpsc::channel(4);
        for event in [
            StreamEvent::TextDelta("Hello there".to_string()),
            StreamEvent::Usage(TokenUsage::new(12, 3)),
            StreamEvent::Completed {
                stop_reason: Some(StopReason::EndTurn),
            },
        ] {
            let _ = tx.send(event).await;
        }
        Ok(StreamHandle::new(rx))
    }
}

pub fn app() -> (AppState, Arc<TestBackend>) {
    let backend = Arc::new(TestBackend::default());
    let recorder = Arc::new(TraceRecorder::new(backend.clone()));
    let registry = Arc::new(ToolRegistry::new(backend.clone(), Duration::from_secs(60)));
    let dispatcher = Arc::new(ToolDispatcher::new(recorder.clone()));
    let chat = RunChatUseCase::new(
        Arc::new(GreetingGateway),
        registry,
        dispatcher,
        recorder.clone(),
        backend.clone(),
        Arc::new(OneAgent),
        Arc::new(OneToken),
    );
    let state = AppState::new(
        Arc::new(chat),
        recorder,
        backend.clone(),
        CancellationToken::new(),
    );
    (state, backend)
}
