//! Tool domain module
//!
//! Defines what a tool is to the conversation engine and how a call to one
//! is shaped on the way in and out.
//!
//! ```text
//! ┌────────────────┐    ┌─────────────────┐    ┌──────────────┐
//! │ ToolDefinition │───▶│ ToolCallRequest │───▶│ ToolResult   │
//! │ (catalog row)  │    │ (invocation)    │    │ (outcome)    │
//! └────────────────┘    └────────┬────────┘    └──────────────┘
//!                                │
//!                                ▼
//!                         ToolHandler (by exact name)
//! ```
//!
//! # Tenant isolation
//!
//! A request always carries the tenant the server resolved from the
//! caller's credential. [`ToolCallRequest::handler_arguments`] drops any
//! tenant-like keys the model may have produced, so a handler has only one
//! place to learn its tenant from.
//!
//! # Key Types
//!
//! - [`ToolDefinition`]: catalog entry (name, description, JSON schema, mode)
//! - [`ToolCallRequest`]: one invocation with its trace context
//! - [`ToolResult`]: `{success, data}` / `{success=false, error}`
//! - [`ToolHandler`]: pluggable business logic behind a tool name

pub mod entities;
pub mod handler;
pub mod value_objects;

pub use entities::{TENANT_ARGUMENT_KEYS, ToolCallRequest, ToolDefinition, ToolMode};
pub use handler::ToolHandler;
pub use value_objects::ToolResult;
