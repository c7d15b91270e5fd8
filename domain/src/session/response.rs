//! Content blocks and turn outcomes exchanged with the model.
//!
//! A message sent to or received from the model is a list of
//! [`ContentBlock`]s mixing text, tool-use requests and tool results, the
//! shape native tool-use APIs work with.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single block of message content.
///
/// # Examples
///
/// ```
/// use relay_domain::session::response::ContentBlock;
///
/// let text = ContentBlock::text("Checking stock now.");
/// assert_eq!(text.as_text(), Some("Checking stock now."));
///
/// let tool = ContentBlock::ToolUse {
///     id: "toolu_1".to_string(),
///     name: "inventory".to_string(),
///     input: serde_json::Map::new(),
/// };
/// assert!(tool.as_text().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    /// A tool invocation requested by the model.
    ToolUse {
        /// Provider-assigned id used to correlate the result.
        id: String,
        name: String,
        input: Map<String, Value>,
    },
    /// The outcome of a tool invocation, sent back to the model.
    ToolResult {
        tool_use_id: String,
        content: Value,
        #[serde(default)]
        is_error: bool,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    /// Returns the text content if this is a `Text` block.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(text),
            _ => None,
        }
    }

    /// Returns the tool name if this is a `ToolUse` block.
    pub fn tool_name(&self) -> Option<&str> {
        match self {
            ContentBlock::ToolUse { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of response.
    EndTurn,
    /// The model wants tool results before continuing.
    ToolUse,
    /// Hit the token limit; the response may be cut short.
    MaxTokens,
    StopSequence,
    /// Provider-specific stop reason.
    Other(String),
}

impl StopReason {
    pub fn parse(s: &str) -> Self {
        match s {
            "end_turn" => StopReason::EndTurn,
            "tool_use" => StopReason::ToolUse,
            "max_tokens" => StopReason::MaxTokens,
            "stop_sequence" => StopReason::StopSequence,
            other => StopReason::Other(other.to_string()),
        }
    }
}

/// Token counts reported for one model call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }

    pub fn add(&mut self, other: TokenUsage) {
        self.input_tokens = self.input_tokens.saturating_add(other.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
    }
}
