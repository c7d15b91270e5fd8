//! Presentation layer for agent-relay
//!
//! This crate contains the CLI definitions and the HTTP surface: the SSE
//! chat endpoint and read-only trace, stats and conversation views.

pub mod cli;
pub mod http;

// Re-export commonly used types
pub use cli::{Cli, Command};
pub use http::{ApiError, AppState, router, serve};
