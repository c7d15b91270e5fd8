//! Run Chat use case
//!
//! Drives one user message through the agent: repeated streamed model
//! calls, tool dispatch between them, and the audit trail around it all.
//!
//! The work is split in two phases:
//!
//! - [`RunChatUseCase::prepare`] authenticates the caller, checks tenant
//!   access and resolves the agent and conversation. Every rejection
//!   happens here, before a stream exists and without writing spans.
//! - [`RunChatUseCase::run`] executes the turn loop and reports progress as
//!   [`ChatEvent`]s through a [`StreamEmitter`]. It never returns an error;
//!   a model failure becomes a terminal `error` event.
//!
//! ```text
//! Init ──▶ Turn ──▶ (no tool calls) ──────────────▶ Finalize ──▶ done
//!           ▲  │
//!           │  └─▶ dispatch tools ─▶ budget left? ─┐
//!           └──────────────── yes ─────────────────┘ no: truncated
//! ```

use crate::config::{ChatParams, DispatchMode};
use crate::ports::credentials::{AuthError, CredentialResolver};
use crate::ports::llm_gateway::{LlmGateway, ModelRequest};
use crate::ports::store::{AgentStore, ConversationStore, StoreError};
use crate::use_cases::dispatch_tool::ToolDispatcher;
use crate::use_cases::stream_emitter::{Disconnected, StreamEmitter};
use crate::use_cases::tool_registry::ToolRegistry;
use crate::use_cases::trace_recorder::TraceRecorder;
use futures::StreamExt;
use relay_domain::session::seed_messages;
use relay_domain::trace::{ASSISTANT_MESSAGE_ACTION, USER_MESSAGE_ACTION};
use relay_domain::{
    AgentConfig, AgentId, AssembledToolCall, BlockOutcome, ChatEvent, ChatPromptTemplate,
    ContentBlock, Conversation, ConversationId, HistoryEntry, Message, ModelMessage, Principal,
    Span, SpanId, StreamEvent, TenantId, TokenUsage, ToolCallParseError, ToolCallRequest,
    ToolDefinition, ToolResult, TraceId, TurnAccumulator, TurnOutput,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Rejections raised while preparing a chat run.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    #[error("Tenant {0} is not accessible with this credential")]
    Forbidden(TenantId),

    #[error("Agent not found: {0}")]
    AgentNotFound(AgentId),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(ConversationId),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// An inbound chat message.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub agent_id: AgentId,
    pub tenant_id: TenantId,
    pub message: String,
    /// Prior turns; ignored when `conversation_id` resumes a stored conversation.
    pub conversation_history: Vec<HistoryEntry>,
    pub conversation_id: Option<ConversationId>,
    pub source: Option<String>,
}

impl ChatRequest {
    pub fn new(
        agent_id: impl Into<AgentId>,
        tenant_id: impl Into<TenantId>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            tenant_id: tenant_id.into(),
            message: message.into(),
            conversation_history: Vec::new(),
            conversation_id: None,
            source: None,
        }
    }

    pub fn with_conversation(mut self, id: ConversationId) -> Self {
        self.conversation_id = Some(id);
        self
    }

    pub fn with_history(mut self, history: Vec<HistoryEntry>) -> Self {
        self.conversation_history = history;
        self
    }
}

/// A validated request, ready to run.
#[derive(Debug, Clone)]
pub struct PreparedChat {
    pub principal: Principal,
    pub tenant_id: TenantId,
    pub agent: AgentConfig,
    pub conversation: Conversation,
    /// Whether `conversation` still has to be created in storage.
    pub is_new_conversation: bool,
    pub history: Vec<ModelMessage>,
    pub message: String,
    pub source: String,
}

/// Totals of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSummary {
    pub conversation_id: ConversationId,
    pub trace_id: TraceId,
    pub text: String,
    pub turns: u32,
    pub tool_calls: usize,
    pub tools_used: Vec<String>,
    pub usage: TokenUsage,
    pub truncated: bool,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatOutcome {
    /// `done` was emitted.
    Completed(ChatSummary),
    /// The model call failed; `error` was emitted.
    Failed { trace_id: TraceId, message: String },
    /// The client went away or the run was cancelled; nothing more was emitted.
    Aborted { trace_id: TraceId },
}

/// Why a turn stopped short.
enum TurnError {
    Model(String),
    Aborted,
}

impl From<Disconnected> for TurnError {
    fn from(_: Disconnected) -> Self {
        TurnError::Aborted
    }
}

/// Per-run identifiers every span and tool call needs.
struct RunContext {
    trace_id: TraceId,
    root_span: SpanId,
    tenant_id: TenantId,
    source: String,
}

pub struct RunChatUseCase {
    gateway: Arc<dyn LlmGateway>,
    registry: Arc<ToolRegistry>,
    dispatcher: Arc<ToolDispatcher>,
    recorder: Arc<TraceRecorder>,
    conversations: Arc<dyn ConversationStore>,
    agents: Arc<dyn AgentStore>,
    credentials: Arc<dyn CredentialResolver>,
    params: ChatParams,
}

impl RunChatUseCase {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        registry: Arc<ToolRegistry>,
        dispatcher: Arc<ToolDispatcher>,
        recorder: Arc<TraceRecorder>,
        conversations: Arc<dyn ConversationStore>,
        agents: Arc<dyn AgentStore>,
        credentials: Arc<dyn CredentialResolver>,
    ) -> Self {
        Self {
            gateway,
            registry,
            dispatcher,
            recorder,
            conversations,
            agents,
            credentials,
            params: ChatParams::default(),
        }
    }

    pub fn with_params(mut self, params: ChatParams) -> Self {
        self.params = params;
        self
    }

    pub fn params(&self) -> &ChatParams {
        &self.params
    }

    /// Authenticate, authorize and resolve everything the run needs.
    pub async fn prepare(
        &self,
        credential: Option<&str>,
        request: ChatRequest,
    ) -> Result<PreparedChat, ChatError> {
        let principal = self.authorize(credential, &request.tenant_id).await?;

        let message = request.message.trim();
        if message.is_empty() {
            return Err(ChatError::InvalidRequest(
                "message must not be empty".to_string(),
            ));
        }

        let agent = self
            .agents
            .get(&request.agent_id)
            .await?
            .filter(|agent| agent.is_visible_to(&request.tenant_id))
            .ok_or_else(|| ChatError::AgentNotFound(request.agent_id.clone()))?;

        let (conversation, is_new_conversation, history) = match &request.conversation_id {
            Some(id) => {
                let conversation = self
                    .conversations
                    .get(id)
                    .await?
                    .filter(|c| c.tenant_id == request.tenant_id)
                    .ok_or_else(|| ChatError::ConversationNotFound(id.clone()))?;
                let history = self
                    .conversations
                    .messages(id)
                    .await?
                    .iter()
                    .map(ModelMessage::from)
                    .collect();
                (conversation, false, history)
            }
            None => {
                let conversation =
                    Conversation::start(request.tenant_id.clone(), agent.id.clone());
                let history = request
                    .conversation_history
                    .iter()
                    .map(ModelMessage::from)
                    .collect();
                (conversation, true, history)
            }
        };

        Ok(PreparedChat {
            principal,
            tenant_id: request.tenant_id,
            agent,
            conversation,
            is_new_conversation,
            history,
            message: message.to_string(),
            source: request
                .source
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| self.params.default_source.clone()),
        })
    }

    /// Resolve a bearer credential to its principal.
    pub async fn authenticate(&self, credential: Option<&str>) -> Result<Principal, ChatError> {
        let token = credential
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingCredential)?;
        Ok(self.credentials.resolve(token).await?)
    }

    /// Resolve the credential and check it may act for `tenant`.
    pub async fn authorize(
        &self,
        credential: Option<&str>,
        tenant: &TenantId,
    ) -> Result<Principal, ChatError> {
        let principal = self.authenticate(credential).await?;
        if !principal.can_access(tenant) {
            warn!(user = %principal.user_id, tenant = %tenant, "Tenant access denied");
            return Err(ChatError::Forbidden(tenant.clone()));
        }
        Ok(principal)
    }

    /// Run the turn loop, emitting events until `done` or `error`.
    pub async fn run(
        &self,
        prepared: PreparedChat,
        emitter: StreamEmitter,
        cancel: CancellationToken,
    ) -> ChatOutcome {
        let started = Instant::now();
        let PreparedChat {
            tenant_id,
            agent,
            conversation,
            is_new_conversation,
            history,
            message,
            source,
            ..
        } = prepared;

        // ==================== Init ====================
        let trace_id = TraceId::generate();
        let system_prompt = ChatPromptTemplate::system(&agent, &tenant_id);
        let mut messages = seed_messages(&history, &message);

        if is_new_conversation {
            if let Err(e) = self.conversations.create(&conversation).await {
                warn!(conversation = %conversation.id, error = %e, "Failed to create conversation");
            }
            // Caller-supplied turns are stored ahead of the new message so a
            // resume by id replays them.
            for prior in history.iter().filter(|m| !m.content.is_empty()) {
                self.persist_message(&conversation.id, &Message::from(prior))
                    .await;
            }
        }
        self.persist_message(&conversation.id, &Message::user(message.clone()))
            .await;

        let root = Span::new(trace_id.clone(), tenant_id.clone(), USER_MESSAGE_ACTION)
            .with_details(json!({
                "conversation_id": conversation.id,
                "agent_id": agent.id,
                "source": source,
                "message_chars": message.chars().count(),
            }));
        let ctx = RunContext {
            trace_id: trace_id.clone(),
            root_span: root.id.clone(),
            tenant_id,
            source,
        };
        self.recorder.record(root).await;

        let tools = self.registry.tools_for(&agent).await;
        let budget = agent.turn_budget();
        info!(
            trace_id = %trace_id,
            conversation = %conversation.id,
            agent = %agent.id,
            tools = tools.len(),
            budget,
            "Starting chat run"
        );

        // ==================== Turns ====================
        let mut turn: u32 = 0;
        let mut text = String::new();
        let mut usage = TokenUsage::default();
        let mut tools_used: Vec<String> = Vec::new();
        let mut tool_calls = 0usize;
        let mut truncated = false;

        while turn < budget {
            if cancel.is_cancelled() {
                return self.aborted(trace_id, "cancelled before model call");
            }
            turn += 1;

            let request = self.model_request(&agent, &system_prompt, &messages, &tools);
            let output = match self.stream_turn(request, &emitter, &cancel).await {
                Ok(output) => output,
                Err(TurnError::Aborted) => return self.aborted(trace_id, "client disconnected"),
                Err(TurnError::Model(message)) => {
                    warn!(trace_id = %trace_id, turn, error = %message, "Model call failed");
                    // the client may already be gone; nothing left to do either way
                    let _ = emitter.emit(ChatEvent::error(message.clone())).await;
                    return ChatOutcome::Failed { trace_id, message };
                }
            };

            usage.add(output.usage);
            if emitter.emit(ChatEvent::usage(output.usage)).await.is_err() {
                return self.aborted(trace_id, "client disconnected");
            }
            text.push_str(&output.text);

            debug!(
                trace_id = %trace_id,
                turn,
                budget,
                tool_calls = output.tool_calls.len(),
                parse_errors = output.parse_errors.len(),
                "Turn finished"
            );

            if !output.has_tool_calls() {
                break;
            }

            messages.push(ModelMessage::assistant(output.assistant_content()));
            for call in &output.tool_calls {
                if !tools_used.contains(&call.name) {
                    tools_used.push(call.name.clone());
                }
            }
            tool_calls += output.tool_calls.len();

            let results = match self
                .dispatch_turn(&output.tool_calls, &ctx, &emitter, &cancel)
                .await
            {
                Ok(results) => results,
                Err(()) => return self.aborted(trace_id, "client disconnected during tools"),
            };
            messages.push(ModelMessage::tool_results(results));

            if turn >= budget {
                warn!(
                    trace_id = %trace_id,
                    budget,
                    "Turn budget exhausted while tools were still requested"
                );
                truncated = true;
            }
        }

        // ==================== Finalize ====================
        let assistant = Message::assistant(text.clone(), tools_used.clone(), usage.total());
        self.persist_message(&conversation.id, &assistant).await;

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let summary_span = Span::new(
            ctx.trace_id.clone(),
            ctx.tenant_id.clone(),
            ASSISTANT_MESSAGE_ACTION,
        )
        .with_parent(Some(ctx.root_span.clone()))
        .with_duration_ms(duration_ms)
        .with_details(json!({
            "conversation_id": conversation.id,
            "turns": turn,
            "tool_calls": tool_calls,
            "tools_used": tools_used,
            "input_tokens": usage.input_tokens,
            "output_tokens": usage.output_tokens,
            "truncated": truncated,
        }));
        self.recorder.record(summary_span).await;

        let done = ChatEvent::Done {
            conversation_id: conversation.id.clone(),
            trace_id: trace_id.clone(),
            truncated,
        };
        if emitter.emit(done).await.is_err() {
            debug!(trace_id = %trace_id, "Client left before done event");
        }

        info!(
            trace_id = %trace_id,
            turns = turn,
            tool_calls,
            truncated,
            duration_ms,
            "Chat run complete"
        );

        ChatOutcome::Completed(ChatSummary {
            conversation_id: conversation.id,
            trace_id,
            text,
            turns: turn,
            tool_calls,
            tools_used,
            usage,
            truncated,
        })
    }

    fn model_request(
        &self,
        agent: &AgentConfig,
        system_prompt: &str,
        messages: &[ModelMessage],
        tools: &[ToolDefinition],
    ) -> ModelRequest {
        ModelRequest {
            model: agent.model.clone(),
            system_prompt: system_prompt.to_string(),
            messages: messages.to_vec(),
            tools: tools.to_vec(),
            max_tokens: agent.max_tokens,
            temperature: agent.temperature,
            api_key: agent.api_key.clone(),
        }
    }

    /// One model call: forward text as it arrives, assemble tool calls.
    async fn stream_turn(
        &self,
        request: ModelRequest,
        emitter: &StreamEmitter,
        cancel: &CancellationToken,
    ) -> Result<TurnOutput, TurnError> {
        let mut handle = self
            .gateway
            .stream(request)
            .await
            .map_err(|e| TurnError::Model(e.to_string()))?;
        let mut accumulator = TurnAccumulator::new();

        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TurnError::Aborted),
                _ = emitter.closed() => return Err(TurnError::Aborted),
                event = handle.next() => event,
            };
            let Some(event) = event else {
                return Err(TurnError::Model(
                    "model stream ended before completion".to_string(),
                ));
            };

            let outcome = accumulator.apply(&event);
            match event {
                StreamEvent::TextDelta(fragment) => {
                    emitter.emit(ChatEvent::text(fragment)).await?;
                }
                StreamEvent::Error(message) => return Err(TurnError::Model(message)),
                StreamEvent::Completed { .. } => break,
                _ => {
                    if let Some(BlockOutcome::ParseError(err)) = outcome {
                        self.report_parse_error(err, emitter).await?;
                    }
                }
            }
        }

        let (output, unclosed) = accumulator.finish();
        for err in unclosed {
            self.report_parse_error(err, emitter).await?;
        }
        Ok(output)
    }

    async fn report_parse_error(
        &self,
        err: ToolCallParseError,
        emitter: &StreamEmitter,
    ) -> Result<(), Disconnected> {
        warn!(
            tool = %err.name,
            tool_use_id = %err.tool_use_id,
            error = %err.error,
            "Dropping tool call with unparseable arguments"
        );
        emitter.emit(ChatEvent::from(err)).await
    }

    /// Execute one turn's tool calls and build the batched tool-result blocks.
    ///
    /// `Err(())` means the client went away or the run was cancelled.
    async fn dispatch_turn(
        &self,
        calls: &[AssembledToolCall],
        ctx: &RunContext,
        emitter: &StreamEmitter,
        cancel: &CancellationToken,
    ) -> Result<Vec<ContentBlock>, ()> {
        let requests: Vec<ToolCallRequest> = calls
            .iter()
            .map(|call| {
                ToolCallRequest::new(
                    call.name.clone(),
                    call.input.clone(),
                    ctx.tenant_id.clone(),
                    ctx.trace_id.clone(),
                )
                .with_tool_use_id(call.id.clone())
                .with_parent(ctx.root_span.clone())
                .with_source(ctx.source.clone())
            })
            .collect();

        let mut blocks = Vec::with_capacity(requests.len());
        match self.params.dispatch_mode {
            DispatchMode::Sequential => {
                for request in &requests {
                    if cancel.is_cancelled() {
                        return Err(());
                    }
                    emit_tool_start(emitter, request).await?;
                    let result = self.dispatcher.execute(request).await;
                    emit_tool_result(emitter, request, &result).await?;
                    blocks.push(tool_result_block(request, &result));
                }
            }
            mode @ DispatchMode::Concurrent { .. } => {
                for request in &requests {
                    emit_tool_start(emitter, request).await?;
                }
                // Calls already in flight must finish so each leaves its span;
                // after a disconnect the rest are drained without emitting.
                let mut results = std::pin::pin!(self.dispatcher.execute_all(&requests, mode));
                let mut disconnected = false;
                while let Some((request, result)) = results.next().await {
                    if !disconnected
                        && emit_tool_result(emitter, request, &result).await.is_err()
                    {
                        debug!(tool = %request.name, "Client gone; draining in-flight tools");
                        disconnected = true;
                    }
                    blocks.push(tool_result_block(request, &result));
                }
                if disconnected {
                    return Err(());
                }
            }
        }
        Ok(blocks)
    }

    async fn persist_message(&self, conversation_id: &ConversationId, message: &Message) {
        if let Err(e) = self.conversations.append_message(conversation_id, message).await {
            warn!(
                conversation = %conversation_id,
                role = message.role.as_str(),
                error = %e,
                "Failed to persist message"
            );
        }
    }

    fn aborted(&self, trace_id: TraceId, reason: &str) -> ChatOutcome {
        info!(trace_id = %trace_id, reason, "Chat run aborted");
        ChatOutcome::Aborted { trace_id }
    }
}

async fn emit_tool_start(emitter: &StreamEmitter, request: &ToolCallRequest) -> Result<(), ()> {
    emitter
        .emit(ChatEvent::ToolStart {
            name: request.name.clone(),
            tool_use_id: request.tool_use_id.clone(),
        })
        .await
        .map_err(|_| ())
}

async fn emit_tool_result(
    emitter: &StreamEmitter,
    request: &ToolCallRequest,
    result: &ToolResult,
) -> Result<(), ()> {
    emitter
        .emit(ChatEvent::tool_result(
            request.name.clone(),
            request.tool_use_id.clone(),
            result,
        ))
        .await
        .map_err(|_| ())
}

fn tool_result_block(request: &ToolCallRequest, result: &ToolResult) -> ContentBlock {
    ContentBlock::ToolResult {
        tool_use_id: request.tool_use_id.clone(),
        content: result.to_value(),
        is_error: !result.is_success(),
    }
}
