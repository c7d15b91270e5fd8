//! Infrastructure layer for agent-relay
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod auth;
pub mod config;
pub mod gateway;
pub mod storage;
pub mod tools;

// Re-export commonly used types
pub use auth::StaticTokenResolver;
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileLoggingConfig, FileModelConfig,
    StorageBackend,
};
pub use gateway::{AnthropicConfig, AnthropicGateway};
pub use storage::{ConfiguredAgents, MemoryStore, SqliteStore};
pub use tools::TraceStatsTool;
