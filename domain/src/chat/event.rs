//! Client-observable events of a chat run.
//!
//! Events are emitted strictly in the order their facts became known, and
//! every run ends with exactly one terminal event: [`ChatEvent::Done`] or
//! [`ChatEvent::Error`].

use crate::core::ids::{ConversationId, TraceId};
use crate::session::accumulator::ToolCallParseError;
use crate::session::response::TokenUsage;
use crate::tool::value_objects::ToolResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ChatEvent {
    /// Incremental assistant text.
    Text { text: String },
    ToolStart { name: String, tool_use_id: String },
    ToolResult {
        name: String,
        tool_use_id: String,
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// A tool-use block whose arguments could not be parsed; no tool ran.
    ToolCallParseError {
        tool_use_id: String,
        name: String,
        error: String,
    },
    /// Token counts of one model call.
    Usage {
        input_tokens: u32,
        output_tokens: u32,
    },
    Error { message: String },
    Done {
        conversation_id: ConversationId,
        trace_id: TraceId,
        /// The turn budget ran out while the model still wanted tools.
        truncated: bool,
    },
}

impl ChatEvent {
    pub fn text(text: impl Into<String>) -> Self {
        ChatEvent::Text { text: text.into() }
    }

    pub fn tool_result(
        name: impl Into<String>,
        tool_use_id: impl Into<String>,
        result: &ToolResult,
    ) -> Self {
        ChatEvent::ToolResult {
            name: name.into(),
            tool_use_id: tool_use_id.into(),
            success: result.is_success(),
            data: result.data().cloned(),
            error: result.error().map(str::to_string),
        }
    }

    pub fn usage(usage: TokenUsage) -> Self {
        ChatEvent::Usage {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ChatEvent::Error {
            message: message.into(),
        }
    }

    /// SSE event name, identical to the serialized `type` tag.
    pub fn event_name(&self) -> &'static str {
        match self {
            ChatEvent::Text { .. } => "text",
            ChatEvent::ToolStart { .. } => "tool_start",
            ChatEvent::ToolResult { .. } => "tool_result",
            ChatEvent::ToolCallParseError { .. } => "tool_call_parse_error",
            ChatEvent::Usage { .. } => "usage",
            ChatEvent::Error { .. } => "error",
            ChatEvent::Done { .. } => "done",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ChatEvent::Done { .. } | ChatEvent::Error { .. })
    }
}

impl From<ToolCallParseError> for ChatEvent {
    fn from(err: ToolCallParseError) -> Self {
        ChatEvent::ToolCallParseError {
            tool_use_id: err.tool_use_id,
            name: err.name,
            error: err.error,
        }
    }
}
