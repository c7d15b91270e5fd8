//! Model gateways

pub mod anthropic;
mod sse;

pub use anthropic::{AnthropicConfig, AnthropicGateway};
