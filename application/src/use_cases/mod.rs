//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod dispatch_tool;
pub mod run_chat;
pub mod stream_emitter;
pub mod tool_registry;
pub mod trace_recorder;

#[cfg(test)]
pub(crate) mod test_support;
