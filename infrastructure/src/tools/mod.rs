//! Built-in tool handlers
//!
//! Business tools (inventory, orders, customers, ...) are supplied by the
//! embedding application as [`ToolHandler`](relay_domain::ToolHandler)
//! implementations. The handlers here only need the engine's own state.

mod trace_stats;

pub use trace_stats::TraceStatsTool;
