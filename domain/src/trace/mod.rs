//! Execution traces
//!
//! Every significant event of a chat run (the user message, each tool call,
//! the final assistant summary) is recorded as a [`Span`]. Spans of one
//! request share a [`TraceId`](crate::core::ids::TraceId) and link to their
//! parent, so a trace can be replayed as a tree later.
//!
//! ```text
//! chat.user_message            depth 0
//! ├── tool.inventory.summary   depth 1
//! ├── tool.customers.find      depth 1
//! └── chat.assistant_message   depth 1
//! ```

pub mod span;
pub mod stats;
pub mod tree;

pub use span::{
    ASSISTANT_MESSAGE_ACTION, Severity, Span, SpanNode, TOOL_ACTION_PREFIX, USER_MESSAGE_ACTION,
};
pub use stats::TraceStats;
pub use tree::order_trace;
