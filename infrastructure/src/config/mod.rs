//! Configuration file loading for agent-relay
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `AGENT_RELAY_*` environment variables (`__` separates sections)
//! 2. `--config <path>` specified file
//! 3. Project root: `./agent-relay.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/agent-relay/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileAuthConfig, FileConfig, FileDispatchConfig, FileDispatchMode,
    FileLoggingConfig, FileModelConfig, FileRegistryConfig, FileServerConfig, FileStorageConfig,
    FileTokenConfig, StorageBackend,
};
pub use loader::ConfigLoader;
