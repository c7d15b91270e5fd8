//! Conversation domain
//!
//! Persisted conversations and messages, the content blocks exchanged with
//! the model, the provider-neutral stream events of one model call, and the
//! accumulator that folds those events into a turn outcome.

pub mod accumulator;
pub mod entities;
pub mod response;
pub mod stream;

pub use accumulator::{
    AssembledToolCall, BlockOutcome, ToolCallParseError, TurnAccumulator, TurnOutput,
};
pub use entities::{Conversation, HistoryEntry, Message, ModelMessage, Role, seed_messages};
pub use response::{ContentBlock, StopReason, TokenUsage};
pub use stream::StreamEvent;
