//! Model provider configuration from TOML (`[model]` section)

use serde::{Deserialize, Serialize};

/// Anthropic Messages API configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelConfig {
    /// Environment variable name for the API key (default: "ANTHROPIC_API_KEY").
    pub api_key_env: String,
    /// Direct API key (prefer the env var).
    pub api_key: Option<String>,
    /// Base URL for the Anthropic API.
    pub base_url: String,
    /// Anthropic API version header.
    pub api_version: String,
    /// Whole-request timeout of one model call, in seconds.
    pub timeout_secs: u64,
}

impl Default for FileModelConfig {
    fn default() -> Self {
        Self {
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            api_key: None,
            base_url: "https://api.anthropic.com".to_string(),
            api_version: "2023-06-01".to_string(),
            timeout_secs: 120,
        }
    }
}

impl FileModelConfig {
    /// The configured key, falling back to the `api_key_env` variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }
}
