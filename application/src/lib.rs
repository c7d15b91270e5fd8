//! Application layer for agent-relay
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{ChatParams, DispatchMode};
pub use ports::{
    credentials::{AuthError, CredentialResolver},
    llm_gateway::{GatewayError, LlmGateway, ModelRequest, StreamHandle},
    store::{AgentStore, ConversationStore, StoreError, ToolCatalogStore, TraceStore},
};
pub use use_cases::dispatch_tool::ToolDispatcher;
pub use use_cases::run_chat::{
    ChatError, ChatOutcome, ChatRequest, ChatSummary, PreparedChat, RunChatUseCase,
};
pub use use_cases::stream_emitter::{Disconnected, StreamEmitter};
pub use use_cases::tool_registry::ToolRegistry;
pub use use_cases::trace_recorder::{TraceError, TraceRecorder};
