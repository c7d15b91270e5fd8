//! Streaming events of one model call.
//!
//! [`StreamEvent`] is the provider-neutral form of a streamed model
//! response. Gateways translate their wire protocol into these events; the
//! conversation loop folds them with a
//! [`TurnAccumulator`](super::accumulator::TurnAccumulator).
//!
//! Tool-use blocks arrive in pieces:
//!
//! ```text
//! ToolUseStart{index, id, name}
//! ToolInputDelta{index, partial_json}   (zero or more)
//! BlockStop{index}                      (arguments are complete here)
//! ```

use super::response::{StopReason, TokenUsage};

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A text chunk from the model.
    TextDelta(String),
    /// A tool-use content block opened.
    ToolUseStart {
        index: usize,
        id: String,
        name: String,
    },
    /// Incremental JSON fragment of a tool-use block's arguments.
    ToolInputDelta { index: usize, partial_json: String },
    /// The content block at `index` closed.
    BlockStop { index: usize },
    /// Token totals for this call.
    Usage(TokenUsage),
    /// The model finished (signals stream end).
    Completed { stop_reason: Option<StopReason> },
    /// The provider reported an error mid-stream (signals stream end).
    Error(String),
}

impl StreamEvent {
    /// Returns the text content if this is a TextDelta event.
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamEvent::TextDelta(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true if this event signals the end of the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamEvent::Completed { .. } | StreamEvent::Error(_)
        )
    }
}
