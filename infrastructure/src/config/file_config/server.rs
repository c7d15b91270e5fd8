//! Server and logging configuration from TOML (`[server]`, `[logging]`)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileServerConfig {
    /// Socket address the HTTP server listens on
    pub bind: String,
}

impl Default for FileServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Directory for daily-rolling log files (stderr only when unset)
    pub directory: Option<PathBuf>,
    /// File name prefix of the rolling log
    pub file_prefix: String,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            file_prefix: "agent-relay.log".to_string(),
        }
    }
}
