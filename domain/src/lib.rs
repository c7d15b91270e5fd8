//! Domain layer for agent-relay
//!
//! This crate contains the core entities and pure logic of the agent
//! conversation engine. It has no dependencies on infrastructure or
//! presentation concerns.
//!
//! # Core Concepts
//!
//! ## Tools
//!
//! A model may call named tools mid-conversation. Each call is a
//! [`ToolCallRequest`] routed to a [`ToolHandler`] and normalized into a
//! [`ToolResult`].
//!
//! ## Traces
//!
//! Every tool call, and the messages around it, is recorded as a [`Span`].
//! Spans of one request share a trace id and can be replayed as a tree
//! with [`order_trace`].
//!
//! ## Conversations
//!
//! Messages are append-only. A model call streams [`StreamEvent`]s which a
//! [`TurnAccumulator`] folds into text and complete tool calls; the client
//! sees [`ChatEvent`]s.

pub mod agent;
pub mod chat;
pub mod core;
pub mod prompt;
pub mod session;
pub mod tool;
pub mod trace;

// Re-export commonly used types
pub use agent::{AgentConfig, Capabilities, Verbosity};
pub use chat::ChatEvent;
pub use core::{
    error::DomainError,
    ids::{AgentId, ConversationId, Principal, SpanId, TenantId, TraceId, UserId},
};
pub use prompt::ChatPromptTemplate;
pub use session::{
    AssembledToolCall, BlockOutcome, ContentBlock, Conversation, HistoryEntry, Message,
    ModelMessage, Role, StopReason, StreamEvent, TokenUsage, ToolCallParseError, TurnAccumulator,
    TurnOutput,
};
pub use tool::{ToolCallRequest, ToolDefinition, ToolHandler, ToolMode, ToolResult};
pub use trace::{Severity, Span, SpanNode, TraceStats, order_trace};
