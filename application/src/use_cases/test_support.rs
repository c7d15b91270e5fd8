//! In-memory fakes shared by the use case tests.

use crate::ports::credentials::{AuthError, CredentialResolver};
use crate::ports::llm_gateway::{GatewayError, LlmGateway, ModelRequest, StreamHandle};
use crate::ports::store::{
    AgentStore, ConversationStore, StoreError, ToolCatalogStore, TraceStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relay_domain::{
    AgentConfig, AgentId, Conversation, ConversationId, Message, Principal, Span, StreamEvent,
    TenantId, ToolDefinition, ToolHandler, ToolResult, TraceId,
};
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

// ==================== Stores ====================

#[derive(Default)]
pub struct FakeTraceStore {
    spans: Mutex<Vec<Span>>,
    failing: bool,
}

impl FakeTraceStore {
    pub fn failing() -> Self {
        Self {
            spans: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn spans(&self) -> Vec<Span> {
        self.spans.lock().unwrap().clone()
    }
}

#[async_trait]
impl TraceStore for FakeTraceStore {
    async fn append(&self, span: &Span) -> Result<(), StoreError> {
        if self.failing {
            return Err(StoreError::Unavailable("disk on fire".to_string()));
        }
        self.spans.lock().unwrap().push(span.clone());
        Ok(())
    }

    async fn by_trace(&self, trace_id: &TraceId) -> Result<Vec<Span>, StoreError> {
        if self.failing {
            return Err(StoreError::Unavailable("disk on fire".to_string()));
        }
        Ok(self
            .spans()
            .into_iter()
            .filter(|s| &s.trace_id == trace_id)
            .collect())
    }

    async fn in_window(
        &self,
        tenant: &TenantId,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Span>, StoreError> {
        Ok(self
            .spans()
            .into_iter()
            .filter(|s| &s.tenant_id == tenant && s.created_at >= since && s.created_at <= until)
            .collect())
    }
}

pub struct FakeCatalog {
    tools: Vec<ToolDefinition>,
    fetches: AtomicUsize,
    failing: AtomicBool,
}

impl FakeCatalog {
    pub fn new(tools: Vec<ToolDefinition>) -> Self {
        Self {
            tools,
            fetches: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ToolCatalogStore for FakeCatalog {
    async fn active_tools(&self) -> Result<Vec<ToolDefinition>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("catalog offline".to_string()));
        }
        Ok(self.tools.clone())
    }
}

#[derive(Default)]
pub struct FakeConversations {
    conversations: Mutex<HashMap<ConversationId, Conversation>>,
    messages: Mutex<HashMap<ConversationId, Vec<Message>>>,
}

impl FakeConversations {
    pub fn messages_of(&self, id: &ConversationId) -> Vec<Message> {
        self.messages
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn seed(&self, conversation: Conversation, messages: Vec<Message>) {
        self.messages
            .lock()
            .unwrap()
            .insert(conversation.id.clone(), messages);
        self.conversations
            .lock()
            .unwrap()
            .insert(conversation.id.clone(), conversation);
    }
}

#[async_trait]
impl ConversationStore for FakeConversations {
    async fn create(&self, conversation: &Conversation) -> Result<(), StoreError> {
        self.conversations
            .lock()
            .unwrap()
            .insert(conversation.id.clone(), conversation.clone());
        Ok(())
    }

    async fn get(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError> {
        Ok(self.conversations.lock().unwrap().get(id).cloned())
    }

    async fn append_message(
        &self,
        conversation_id: &ConversationId,
        message: &Message,
    ) -> Result<(), StoreError> {
        self.messages
            .lock()
            .unwrap()
            .entry(conversation_id.clone())
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn messages(&self, conversation_id: &ConversationId) -> Result<Vec<Message>, StoreError> {
        Ok(self.messages_of(conversation_id))
    }
}

pub struct FakeAgents {
    agents: Vec<AgentConfig>,
}

impl FakeAgents {
    pub fn new(agents: Vec<AgentConfig>) -> Self {
        Self { agents }
    }
}

#[async_trait]
impl AgentStore for FakeAgents {
    async fn get(&self, id: &AgentId) -> Result<Option<AgentConfig>, StoreError> {
        Ok(self.agents.iter().find(|a| &a.id == id).cloned())
    }
}

/// `token` → principal map.
pub struct FakeCredentials {
    principals: HashMap<String, Principal>,
}

impl FakeCredentials {
    pub fn single(token: &str, principal: Principal) -> Self {
        let mut principals = HashMap::new();
        principals.insert(token.to_string(), principal);
        Self { principals }
    }
}

#[async_trait]
impl CredentialResolver for FakeCredentials {
    async fn resolve(&self, token: &str) -> Result<Principal, AuthError> {
        self.principals
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidCredential)
    }
}

// ==================== Gateway ====================

/// What the scripted gateway does on one call.
pub enum ScriptedTurn {
    Events(Vec<StreamEvent>),
    /// Refuse the call before streaming.
    Reject(String),
}

/// Plays back one scripted turn per `stream()` call and remembers requests.
pub struct ScriptedGateway {
    turns: Mutex<VecDeque<ScriptedTurn>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedGateway {
    pub fn new(turns: Vec<ScriptedTurn>) -> Self {
        Self {
            turns: Mutex::new(VecDeque::from(turns)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn stream(&self, request: ModelRequest) -> Result<StreamHandle, GatewayError> {
        self.requests.lock().unwrap().push(request);
        let turn = self
            .turns
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| GatewayError::RequestFailed("No more scripted turns".to_string()))?;
        match turn {
            ScriptedTurn::Reject(message) => Err(GatewayError::ConnectionError(message)),
            ScriptedTurn::Events(events) => {
                let (tx, rx) = mpsc::channel(events.len().max(1));
                for event in events {
                    let _ = tx.send(event).await;
                }
                Ok(StreamHandle::new(rx))
            }
        }
    }
}

// ==================== Tool handlers ====================

enum Behavior {
    Ok(Value),
    Fail(String),
    Panic,
}

type SeenCall = (TenantId, Option<String>, Map<String, Value>);

pub struct ScriptedHandler {
    name: String,
    behavior: Behavior,
    delay: Option<Duration>,
    calls: Mutex<Vec<SeenCall>>,
}

impl ScriptedHandler {
    fn with_behavior(name: &str, behavior: Behavior) -> Self {
        Self {
            name: name.to_string(),
            behavior,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn ok(name: &str, data: Value) -> Self {
        Self::with_behavior(name, Behavior::Ok(data))
    }

    pub fn failing(name: &str, error: &str) -> Self {
        Self::with_behavior(name, Behavior::Fail(error.to_string()))
    }

    pub fn panicking(name: &str) -> Self {
        Self::with_behavior(name, Behavior::Panic)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<SeenCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolHandler for ScriptedHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &self,
        tenant: &TenantId,
        action: Option<&str>,
        arguments: &Map<String, Value>,
    ) -> ToolResult {
        self.calls.lock().unwrap().push((
            tenant.clone(),
            action.map(str::to_string),
            arguments.clone(),
        ));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.behavior {
            Behavior::Ok(data) => ToolResult::success(data.clone()),
            Behavior::Fail(error) => ToolResult::failure(error.clone()),
            Behavior::Panic => panic!("handler exploded"),
        }
    }
}
