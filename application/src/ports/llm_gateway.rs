//! LLM Gateway port
//!
//! Defines the interface for streaming model calls.

use async_trait::async_trait;
use relay_domain::{ModelMessage, StreamEvent, ToolDefinition};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model returned HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Malformed stream: {0}")]
    MalformedStream(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout")]
    Timeout,

    #[error("Missing API key for model {0}")]
    MissingApiKey(String),
}

/// Everything one model call needs.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub model: String,
    pub system_prompt: String,
    pub messages: Vec<ModelMessage>,
    pub tools: Vec<ToolDefinition>,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    /// Per-agent credential override
    pub api_key: Option<String>,
}

/// Handle for receiving streaming events from one model call.
///
/// Wraps an `mpsc::Receiver<StreamEvent>`. The stream ends with a terminal
/// event ([`StreamEvent::Completed`] or [`StreamEvent::Error`]) or, if the
/// producer dies, with the channel closing.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    pub async fn next(&mut self) -> Option<StreamEvent> {
        self.receiver.recv().await
    }
}

/// Gateway for LLM communication
///
/// Implementations (adapters) live in the infrastructure layer. Errors
/// returned here happen before any event was produced (connection refused,
/// non-2xx status); failures after that arrive as [`StreamEvent::Error`].
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn stream(&self, request: ModelRequest) -> Result<StreamHandle, GatewayError>;
}

