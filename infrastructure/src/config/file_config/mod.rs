//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate:
//! `[[agents]]` entries are [`AgentConfig`]s and `[[tools]]` entries are
//! [`ToolDefinition`] catalog rows.

mod auth;
mod chat;
mod model;
mod server;
mod storage;

pub use auth::{FileAuthConfig, FileTokenConfig};
pub use chat::{FileDispatchConfig, FileDispatchMode, FileRegistryConfig};
pub use model::FileModelConfig;
pub use server::{FileLoggingConfig, FileServerConfig};
pub use storage::{FileStorageConfig, StorageBackend};

use relay_application::ChatParams;
use relay_domain::{AgentConfig, ToolDefinition};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("server.bind cannot be empty")]
    EmptyBindAddress,

    #[error("dispatch.max_in_flight cannot be 0")]
    ZeroMaxInFlight,

    #[error("duplicate agent id '{0}'")]
    DuplicateAgentId(String),

    #[error("duplicate tool name '{0}'")]
    DuplicateToolName(String),

    #[error("invalid tool: {0}")]
    InvalidTool(String),

    #[error("auth token for user '{0}' is empty")]
    EmptyToken(String),

    #[error("auth token is configured more than once (user '{0}')")]
    DuplicateToken(String),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// HTTP listener
    pub server: FileServerConfig,
    /// Where conversations, spans and the tool catalog live
    pub storage: FileStorageConfig,
    /// Model provider settings
    pub model: FileModelConfig,
    /// Tool catalog cache
    pub registry: FileRegistryConfig,
    /// Same-turn tool execution
    pub dispatch: FileDispatchConfig,
    /// Log file output
    pub logging: FileLoggingConfig,
    /// Accepted bearer tokens
    pub auth: FileAuthConfig,
    /// Agent definitions
    pub agents: Vec<AgentConfig>,
    /// Tool catalog rows seeded into storage at startup
    pub tools: Vec<ToolDefinition>,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();

        if self.server.bind.trim().is_empty() {
            issues.push(ConfigValidationError::EmptyBindAddress);
        }

        if self.dispatch.mode == FileDispatchMode::Concurrent && self.dispatch.max_in_flight == 0 {
            issues.push(ConfigValidationError::ZeroMaxInFlight);
        }

        let mut agent_ids = HashSet::new();
        for agent in &self.agents {
            if !agent_ids.insert(agent.id.as_str()) {
                issues.push(ConfigValidationError::DuplicateAgentId(
                    agent.id.to_string(),
                ));
            }
        }

        let mut tool_names = HashSet::new();
        for tool in &self.tools {
            if let Err(e) = tool.validate() {
                issues.push(ConfigValidationError::InvalidTool(e.to_string()));
            }
            if !tool_names.insert(tool.name.as_str()) {
                issues.push(ConfigValidationError::DuplicateToolName(tool.name.clone()));
            }
        }

        let mut tokens = HashSet::new();
        for entry in &self.auth.tokens {
            if entry.token.trim().is_empty() {
                issues.push(ConfigValidationError::EmptyToken(entry.user_id.clone()));
            } else if !tokens.insert(entry.token.as_str()) {
                issues.push(ConfigValidationError::DuplicateToken(entry.user_id.clone()));
            }
        }

        issues
    }

    /// Conversation loop parameters derived from `[registry]` and `[dispatch]`.
    pub fn chat_params(&self) -> ChatParams {
        ChatParams::default()
            .with_registry_ttl(Duration::from_secs(self.registry.ttl_secs))
            .with_dispatch_mode(self.dispatch.to_dispatch_mode())
    }
}
